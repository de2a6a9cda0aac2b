//! Transport layer carrying `runCmds` envelopes to the device.
//!
//! Every transport takes the flattened command list plus an encoding,
//! performs exactly one request/response round trip and hands back the
//! decoded envelope. Failures are also latched so the caller can inspect
//! the last one after the fact.

pub mod config;
mod http;
#[cfg(test)]
pub(crate) mod mock;
mod registry;
mod socket;

pub use config::{TlsVerification, TransportConfig, TransportKind};
pub use http::HttpTransport;
pub use registry::{TransportFactory, TransportRegistry};
pub use socket::SocketTransport;

use async_trait::async_trait;
use log::debug;

use crate::envelope::{Command, Encoding, Response};
use crate::error::Result;

/// A way of delivering `runCmds` requests to a device.
///
/// Custom transports plug into [`Node::new`](crate::Node::new) directly, or
/// into profiles through [`TransportRegistry::register`].
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use eapi::{Command, Encoding, Node, Response, Transport};
/// use serde_json::{Value, json};
///
/// /// Answers every command with an empty object.
/// struct Loopback;
///
/// #[async_trait]
/// impl Transport for Loopback {
///     async fn execute(&mut self, commands: &[Command], _encoding: Encoding) -> eapi::Result<Response> {
///         Ok(Response {
///             jsonrpc: "2.0".into(),
///             result: commands.iter().map(|_| json!({})).collect(),
///             error: None,
///             id: Value::Null,
///         })
///     }
///
///     fn endpoint(&self) -> String {
///         "loopback".into()
///     }
///
///     fn last_error(&self) -> Option<&str> {
///         None
///     }
///
///     fn clear_error(&mut self) {}
/// }
///
/// let mut node = Node::new(Loopback);
/// let response =
///     tokio_test::block_on(node.run_commands(&["show version"], Encoding::Json)).unwrap();
/// assert_eq!(response.result.len(), 1);
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `commands` in one request and return the decoded envelope.
    ///
    /// A JSON-RPC `error` object is returned as [`Error::Remote`](crate::Error::Remote).
    async fn execute(&mut self, commands: &[Command], encoding: Encoding) -> Result<Response>;

    /// Endpoint description for diagnostics (never contains credentials).
    fn endpoint(&self) -> String;

    /// Message of the most recent failed `execute`, if any.
    fn last_error(&self) -> Option<&str>;

    /// Forget the latched error.
    fn clear_error(&mut self);
}

/// Record a failed result in `slot` and pass the result through.
pub(crate) fn latch<T>(slot: &mut Option<String>, result: Result<T>) -> Result<T> {
    if let Err(ref e) = result {
        debug!("transport error latched: {}", e);
        *slot = Some(e.to_string());
    }
    result
}
