//! JSON-RPC 2.0 envelope codec for the `runCmds` method.
//!
//! Purely functional: nothing in here knows how the bytes travel.
//!
//! ```text
//! request:  {"jsonrpc":"2.0","method":"runCmds",
//!            "params":{"version":1,"cmds":["enable","show version"],"format":"json"},
//!            "id":"4242"}
//! response: {"jsonrpc":"2.0","id":"4242","result":[{},{"modelName":"vEOS"}]}
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NodeError, RemoteError, Result, TransportError};

/// JSON-RPC protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// The only method eAPI exposes.
pub const METHOD: &str = "runCmds";

/// `params.version` sent with every request.
pub const API_VERSION: u32 = 1;

/// A single element of the `cmds` array.
///
/// Most commands are bare strings. Commands that need to answer a prompt
/// (`enable` with a password) are sent as `{"cmd": .., "input": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Plain CLI command.
    Bare(String),

    /// Command plus the input to feed its prompt.
    Authenticated {
        /// CLI command.
        cmd: String,
        /// Prompt input (e.g. the enable password).
        input: String,
    },
}

impl Command {
    /// The CLI text of this command.
    pub fn text(&self) -> &str {
        match self {
            Self::Bare(cmd) | Self::Authenticated { cmd, .. } => cmd,
        }
    }
}

impl From<&str> for Command {
    fn from(cmd: &str) -> Self {
        Self::Bare(cmd.to_string())
    }
}

impl From<String> for Command {
    fn from(cmd: String) -> Self {
        Self::Bare(cmd)
    }
}

/// Response format requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Structured JSON objects.
    #[default]
    Json,
    /// Raw CLI text wrapped as `{"output": ".."}`.
    Text,
}

impl Encoding {
    /// Wire name of the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl FromStr for Encoding {
    type Err = NodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if s.eq_ignore_ascii_case("text") {
            Ok(Self::Text)
        } else {
            Err(NodeError::InvalidEncoding {
                encoding: s.to_string(),
            })
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: Params<'a>,
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct Params<'a> {
    version: u32,
    cmds: &'a [Command],
    format: Encoding,
}

/// Decoded `runCmds` response envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    /// Protocol version echoed by the device.
    #[serde(default)]
    pub jsonrpc: String,

    /// One object per command sent, in order.
    #[serde(default)]
    pub result: Vec<Value>,

    /// Present instead of `result` when a command failed.
    #[serde(default)]
    pub error: Option<RemoteError>,

    /// Request id echoed by the device.
    #[serde(default)]
    pub id: Value,
}

impl Response {
    /// Turn a populated `error` object into [`Error::Remote`](crate::Error::Remote).
    pub fn into_result(self) -> Result<Self> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self),
        }
    }

    /// Number of per-command results.
    pub fn len(&self) -> usize {
        self.result.len()
    }

    /// Whether the response carries no results.
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

/// Request id: the process id, rendered as a string.
///
/// Calls from one process share the id. Correlation is positional since
/// every call is its own HTTP round trip.
pub fn request_id() -> String {
    std::process::id().to_string()
}

/// Serialize a `runCmds` request.
pub fn encode(commands: &[Command], encoding: Encoding, id: &str) -> Result<Bytes> {
    let request = Request {
        jsonrpc: JSONRPC_VERSION,
        method: METHOD,
        params: Params {
            version: API_VERSION,
            cmds: commands,
            format: encoding,
        },
        id,
    };

    let body = serde_json::to_vec(&request).map_err(TransportError::Decode)?;
    Ok(Bytes::from(body))
}

/// Parse a response body. The whole body must be one JSON document.
pub fn decode(body: &[u8]) -> Result<Response> {
    let response = serde_json::from_slice(body).map_err(TransportError::Decode)?;
    Ok(response)
}
