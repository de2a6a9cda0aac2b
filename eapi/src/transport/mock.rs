//! In-memory transport for node and handle tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Transport, latch};
use crate::envelope::{Command, Encoding, Response};
use crate::error::{RemoteError, Result};

/// One recorded `execute` call.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub commands: Vec<Command>,
    pub encoding: Encoding,
}

impl Call {
    /// CLI text of every command sent.
    pub fn texts(&self) -> Vec<&str> {
        self.commands.iter().map(Command::text).collect()
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    replies: HashMap<String, Value>,
    result_override: Option<Vec<Value>>,
    remote_error: Option<RemoteError>,
}

/// Scripted transport. Clones share state so a test can keep one clone
/// for inspection after handing the other to a node.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<State>>,
    last_error: Option<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `command` with `value` instead of the default.
    pub fn reply(self, command: &str, value: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(command.to_string(), value);
        self
    }

    /// Reply to `command` with `{"output": text}`.
    pub fn reply_text(self, command: &str, text: &str) -> Self {
        self.reply(command, json!({ "output": text }))
    }

    /// Return exactly `result` for every call.
    pub fn result_override(&self, result: Vec<Value>) {
        self.state.lock().unwrap().result_override = Some(result);
    }

    /// Fail every call with a JSON-RPC error.
    pub fn fail_with(&self, code: i64, message: &str) {
        self.state.lock().unwrap().remote_error = Some(RemoteError {
            code,
            message: message.to_string(),
            data: Value::Null,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Number of calls whose commands included `command`.
    pub fn count_of(&self, command: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.texts().contains(&command))
            .count()
    }

    fn respond(&self, commands: &[Command], encoding: Encoding) -> Result<Response> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            commands: commands.to_vec(),
            encoding,
        });

        if let Some(err) = state.remote_error.clone() {
            return Err(err.into());
        }

        let result = match &state.result_override {
            Some(result) => result.clone(),
            None => commands
                .iter()
                .map(|cmd| match state.replies.get(cmd.text()) {
                    Some(value) => value.clone(),
                    None if encoding == Encoding::Text => json!({ "output": "" }),
                    None => json!({}),
                })
                .collect(),
        };

        Ok(Response {
            jsonrpc: "2.0".to_string(),
            result,
            error: None,
            id: Value::String(crate::envelope::request_id()),
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&mut self, commands: &[Command], encoding: Encoding) -> Result<Response> {
        let result = self.respond(commands, encoding);
        latch(&mut self.last_error, result)
    }

    fn endpoint(&self) -> String {
        "mock".to_string()
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_error(&mut self) {
        self.last_error = None;
    }
}
