//! # eapi
//!
//! Async client library for Arista eAPI.
//!
//! eapi sends CLI commands to EOS devices as JSON-RPC `runCmds` requests
//! and hands the structured (or text) results back, similar to Python's
//! pyeapi.
//!
//! ## Features
//!
//! - Four transports: Unix socket, local HTTP, HTTP and HTTPS
//! - Automatic privileged mode (`enable`) on every request
//! - Batched requests that decode straight into your own types
//! - Cached running/startup config with section extraction
//! - Named connection profiles from `eapi.conf`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eapi::{Encoding, Node};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), eapi::Error> {
//!     let mut node = Node::builder("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .transport("https")
//!         .build()?;
//!
//!     let response = node.run_commands(&["show version"], Encoding::Json).await?;
//!     println!("{}", response.result[0]["version"]);
//!
//!     node.config(&["hostname leaf1"]).await?;
//!     println!("{}", node.get_section("^interface Ethernet1", Default::default()).await?);
//!     Ok(())
//! }
//! ```

extern crate self as eapi;

pub mod envelope;
pub mod error;
pub mod node;
pub mod profile;
pub mod response;
pub mod transport;

// Re-export main types for convenience
pub use eapi_macros::EapiResponse;
pub use envelope::{Command, Encoding, Response};
pub use error::{Error, ErrorKind, Result};
pub use node::{ConfigSource, EnableResponse, Handle, Node, NodeBuilder, find_section};
pub use profile::{EapiConfig, Profile, config_for, connect, connect_to, connections, load_config};
pub use response::{DecodeError, EapiResponse, JsonResult, TextResult, decode_into};
pub use serde_json::Value;
pub use transport::{TlsVerification, Transport, TransportConfig, TransportKind};
