//! Error types for eapi.

use std::io;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Main error type for eapi operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (dial, HTTP status, body decode, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// JSON-RPC error object returned by the device
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Node-level errors (bad arguments, config lookups)
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    /// Request handle errors
    #[error("Handle error: {0}")]
    Handle(#[from] HandleError),

    /// Connection profile errors
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed something the library refuses to send.
    InvalidArgument,
    /// The receiver is not in a usable state (closed handle).
    InvalidState,
    /// The request did not complete at the transport level.
    Transport,
    /// The device answered with a JSON-RPC error.
    Remote,
    /// A named thing (profile, config section) was not found.
    Lookup,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Remote(_) => ErrorKind::Remote,
            Self::Node(e) => e.kind(),
            Self::Handle(e) => e.kind(),
            Self::Profile(e) => e.kind(),
        }
    }

    /// The device error code, if this is a remote error.
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            Self::Remote(e) => Some(e.code),
            _ => None,
        }
    }
}

/// Transport layer errors.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to the endpoint
    #[error("Connection failed to {target}: {source}")]
    ConnectionFailed {
        target: String,
        #[source]
        source: io::Error,
    },

    /// HTTP client error (reqwest)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP/1 protocol error on the Unix socket
    #[error("Socket HTTP error: {0}")]
    Hyper(#[from] hyper::Error),

    /// Failed to build the HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] hyper::http::Error),

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Endpoint answered with something other than 200
    #[error("Unexpected HTTP status {status} {reason}")]
    Status { status: u16, reason: String },

    /// Request or response body was not a valid envelope
    #[error("Envelope decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Operation timed out
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// JSON-RPC `error` object returned by the device.
#[derive(Error, Debug, Clone, PartialEq, Deserialize)]
#[error("CLI command failed (code {code}): {message}")]
pub struct RemoteError {
    /// Numeric error code.
    pub code: i64,

    /// Human readable message.
    pub message: String,

    /// Free-form payload, usually the per-command results up to the failure.
    #[serde(default)]
    pub data: Value,
}

/// Node layer errors.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Encoding name is neither "json" nor "text"
    #[error("Invalid encoding '{encoding}': expected 'json' or 'text'")]
    InvalidEncoding { encoding: String },

    /// Config source name is not recognised
    #[error("Invalid config source '{name}': expected 'running-config' or 'startup-config'")]
    InvalidConfigSource { name: String },

    /// `enable()` does not enter config mode
    #[error("Config mode commands not supported: '{command}'")]
    ConfigModeNotSupported { command: String },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The device returned a different number of results than commands sent
    #[error("Number of results ({got}) does not match commands sent ({expected})")]
    ResultCountMismatch { expected: usize, got: usize },

    /// A text-encoded result carried no `output` field
    #[error("Result for '{command}' has no text output")]
    MissingOutput { command: String },

    /// The config text to search was empty
    #[error("No {which} text to search")]
    EmptyConfig { which: String },

    /// The section start pattern did not match
    #[error("Section '{pattern}' not found")]
    SectionNotFound { pattern: String },

    /// The section was found but never terminated
    #[error("Section '{pattern}' has no terminating line")]
    SectionUnterminated { pattern: String },
}

impl NodeError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEncoding { .. }
            | Self::InvalidConfigSource { .. }
            | Self::ConfigModeNotSupported { .. }
            | Self::InvalidPattern(_) => ErrorKind::InvalidArgument,
            Self::ResultCountMismatch { .. } | Self::MissingOutput { .. } => ErrorKind::Transport,
            Self::EmptyConfig { .. }
            | Self::SectionNotFound { .. }
            | Self::SectionUnterminated { .. } => ErrorKind::Lookup,
        }
    }
}

/// Request handle errors.
///
/// Cloneable so a handle can keep the first failure sticky and still
/// report it from every later call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The handle was closed or never bound to a node
    #[error("Invalid handle: not bound to a node")]
    Closed,

    /// Command text was empty
    #[error("Command string is empty")]
    EmptyCommand,

    /// Too many commands queued
    #[error("Handle is full: at most {limit} commands per call")]
    CapacityExceeded { limit: usize },

    /// The device returned a different number of results than commands sent
    #[error("Number of results ({got}) does not match commands sent ({expected})")]
    ResultCountMismatch { expected: usize, got: usize },

    /// A result container rejected its result
    #[error("Failed to decode result for '{command}': {message}")]
    Decode { command: String, message: String },
}

impl HandleError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Closed => ErrorKind::InvalidState,
            Self::EmptyCommand | Self::CapacityExceeded { .. } => ErrorKind::InvalidArgument,
            Self::ResultCountMismatch { .. } | Self::Decode { .. } => ErrorKind::Transport,
        }
    }
}

/// Connection profile errors.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// No profile with this name
    #[error("Connection profile '{name}' not found")]
    NotFound { name: String },

    /// No transport factory registered under this name
    #[error("Unknown transport '{name}'")]
    UnknownTransport { name: String },

    /// A transport with this name is already registered
    #[error("Transport '{name}' already registered")]
    AlreadyRegistered { name: String },

    /// `port` is not a valid TCP port
    #[error("Invalid port '{value}' in profile '{profile}'")]
    InvalidPort { profile: String, value: String },

    /// Profile file could not be read or parsed
    #[error("Failed to load '{path}': {message}")]
    Load { path: String, message: String },

    /// Registry lock was poisoned
    #[error("Failed to acquire {0} registry lock")]
    Lock(&'static str),
}

impl ProfileError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::Lookup,
            Self::UnknownTransport { .. }
            | Self::AlreadyRegistered { .. }
            | Self::InvalidPort { .. }
            | Self::Load { .. } => ErrorKind::InvalidArgument,
            Self::Lock(_) => ErrorKind::InvalidState,
        }
    }
}

/// Result type alias using eapi's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err: Error = HandleError::Closed.into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err: Error = HandleError::CapacityExceeded { limit: 64 }.into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err: Error = NodeError::SectionNotFound {
            pattern: "^router bgp".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Lookup);

        let err: Error = ProfileError::NotFound { name: "spine1".into() }.into();
        assert_eq!(err.kind(), ErrorKind::Lookup);

        let err: Error = TransportError::Timeout(Duration::from_secs(60)).into();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_remote_error_display() {
        let err: Error = RemoteError {
            code: 1002,
            message: "CLI command 2 of 2 'show foo' failed: invalid command".into(),
            data: Value::Null,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.remote_code(), Some(1002));
        assert!(err.to_string().contains("code 1002"));
    }
}
