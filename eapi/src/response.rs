//! Result containers for batched requests.
//!
//! A container knows the command it answers and how to absorb the decoded
//! result object for that command. Field-to-key mapping is plain serde:
//! each field receives the value under its (possibly renamed) key.
//!
//! ```rust
//! use eapi::EapiResponse;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, EapiResponse)]
//! #[eapi(command = "show version")]
//! #[serde(rename_all = "camelCase")]
//! struct ShowVersion {
//!     model_name: String,
//!     version: String,
//!     serial_number: String,
//! }
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Error produced when a result object does not fit its container.
pub type DecodeError = serde_json::Error;

/// A caller-supplied receiver for one command's result.
///
/// Containers must be `Send` so a future awaiting
/// [`Handle::call`](crate::Handle::call) can move between runtime threads.
pub trait EapiResponse: Send {
    /// Canonical command text this container answers.
    fn command(&self) -> &str;

    /// Absorb the decoded result object for the command.
    fn accept(&mut self, value: Value) -> Result<(), DecodeError>;
}

/// Replace `target` with `value` decoded as `T`.
///
/// Used by `#[derive(EapiResponse)]`.
pub fn decode_into<T: DeserializeOwned>(target: &mut T, value: Value) -> Result<(), DecodeError> {
    *target = serde_json::from_value(value)?;
    Ok(())
}

/// Container that keeps the raw JSON object for any command.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResult {
    command: String,
    /// Result object, `Null` until a call fills it.
    pub value: Value,
}

impl JsonResult {
    /// Create an empty container for `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            value: Value::Null,
        }
    }

    /// Whether a result has been received.
    pub fn is_filled(&self) -> bool {
        !self.value.is_null()
    }

    /// Look up a top-level key of the result object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }
}

impl EapiResponse for JsonResult {
    fn command(&self) -> &str {
        &self.command
    }

    fn accept(&mut self, value: Value) -> Result<(), DecodeError> {
        self.value = value;
        Ok(())
    }
}

/// Container for `text`-encoded results (`{"output": ".."}`).
#[derive(Debug, Clone, PartialEq)]
pub struct TextResult {
    command: String,
    /// CLI output, empty until a call fills it.
    pub output: String,
}

impl TextResult {
    /// Create an empty container for `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output: String::new(),
        }
    }

    /// Get the output lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }
}

impl EapiResponse for TextResult {
    fn command(&self) -> &str {
        &self.command
    }

    fn accept(&mut self, value: Value) -> Result<(), DecodeError> {
        #[derive(serde::Deserialize)]
        struct Text {
            output: String,
        }

        let text: Text = serde_json::from_value(value)?;
        self.output = text.output;
        Ok(())
    }
}

impl fmt::Display for TextResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.output)
    }
}
