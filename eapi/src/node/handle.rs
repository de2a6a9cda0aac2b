//! Batched requests.
//!
//! A [`Handle`] queues up to [`MAX_COMMANDS`] commands, each optionally
//! paired with a result container, and sends them all in one `runCmds`
//! call. The handle holds `&mut Node` for its whole life, so nothing else
//! can drive the node while a batch is being assembled.
//!
//! # Example
//!
//! ```rust,no_run
//! use eapi::{EapiResponse, Encoding, JsonResult, Node};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, EapiResponse)]
//! #[eapi(command = "show version")]
//! #[serde(rename_all = "camelCase")]
//! struct ShowVersion {
//!     model_name: String,
//!     version: String,
//! }
//!
//! # async fn example(node: &mut Node) -> Result<(), eapi::Error> {
//! let mut version = ShowVersion::default();
//! let mut vlans = JsonResult::new("show vlan");
//!
//! let mut handle = node.handle(Encoding::Json);
//! handle.add_command(&mut version)?;
//! handle.add_command(&mut vlans)?;
//! handle.call().await?;
//! handle.close();
//!
//! println!("{} running {}", version.model_name, version.version);
//! # Ok(())
//! # }
//! ```

use std::fmt;

use log::debug;

use super::Node;
use crate::envelope::{Command, Encoding};
use crate::error::{HandleError, Result};
use crate::response::EapiResponse;

/// Most commands a handle queues per call, not counting the injected `enable`.
pub const MAX_COMMANDS: usize = 64;

struct CommandBlock<'a> {
    command: String,
    container: Option<&'a mut dyn EapiResponse>,
}

/// Accumulator for one batched request against a [`Node`].
pub struct Handle<'a> {
    node: Option<&'a mut Node>,
    encoding: Encoding,
    blocks: Vec<CommandBlock<'a>>,
    error: Option<HandleError>,
}

impl<'a> Handle<'a> {
    pub(crate) fn new(node: &'a mut Node, encoding: Encoding) -> Self {
        Self {
            node: Some(node),
            encoding,
            blocks: Vec::with_capacity(MAX_COMMANDS),
            error: None,
        }
    }

    /// Response encoding requested for every command.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.node.is_none()
    }

    /// The sticky error, if any add or call failed validation.
    pub fn error(&self) -> Option<&HandleError> {
        self.error.as_ref()
    }

    /// Queue the command `container` answers.
    pub fn add_command(&mut self, container: &'a mut dyn EapiResponse) -> Result<()> {
        let command = container.command().to_string();
        self.push(command, Some(container))
    }

    /// Queue `command`. Without a container its result is discarded.
    pub fn add_command_str(
        &mut self,
        command: impl Into<String>,
        container: Option<&'a mut dyn EapiResponse>,
    ) -> Result<()> {
        self.push(command.into(), container)
    }

    fn push(&mut self, command: String, container: Option<&'a mut dyn EapiResponse>) -> Result<()> {
        let rejected = if self.node.is_none() {
            Some(HandleError::Closed)
        } else if self.blocks.len() >= MAX_COMMANDS {
            Some(HandleError::CapacityExceeded {
                limit: MAX_COMMANDS,
            })
        } else if command.is_empty() {
            Some(HandleError::EmptyCommand)
        } else {
            None
        };

        if let Some(err) = rejected {
            self.error = Some(err.clone());
            return Err(err.into());
        }

        self.blocks.push(CommandBlock { command, container });
        Ok(())
    }

    /// Send every queued command in one request and fill the containers.
    ///
    /// The queue is empty afterwards, whether the call succeeded or not.
    ///
    /// Containers are filled in queue order. If one rejects its result,
    /// the containers queued before it keep their new values and the ones
    /// after it are left untouched. A transport or remote error touches
    /// none of them.
    pub async fn call(&mut self) -> Result<()> {
        let outcome = self.dispatch().await;
        self.blocks.clear();
        outcome
    }

    /// Queue `container` and call immediately.
    pub async fn enable(&mut self, container: &'a mut dyn EapiResponse) -> Result<()> {
        self.add_command(container)?;
        self.call().await
    }

    /// Drop the queue and release the node. Every later operation fails.
    pub fn close(&mut self) {
        self.blocks.clear();
        self.node = None;
    }

    async fn dispatch(&mut self) -> Result<()> {
        let node = self.node.as_deref_mut().ok_or(HandleError::Closed)?;
        if let Some(err) = &self.error {
            return Err(err.clone().into());
        }

        // The enable block has no container; its result is skipped below.
        let mut commands = Vec::with_capacity(self.blocks.len() + 1);
        commands.push(node.enable_command());
        commands.extend(
            self.blocks
                .iter()
                .map(|block| Command::Bare(block.command.clone())),
        );

        debug!(
            "handle call: {} commands ({})",
            self.blocks.len(),
            self.encoding
        );

        let response = node.execute(&commands, self.encoding).await?;

        if response.result.len() != commands.len() {
            return Err(HandleError::ResultCountMismatch {
                expected: commands.len(),
                got: response.result.len(),
            }
            .into());
        }

        for (block, value) in self.blocks.iter_mut().zip(response.result.into_iter().skip(1)) {
            let Some(container) = block.container.as_deref_mut() else {
                continue;
            };
            container
                .accept(value)
                .map_err(|e| HandleError::Decode {
                    command: block.command.clone(),
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }
}

impl fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("bound", &self.node.is_some())
            .field("encoding", &self.encoding)
            .field(
                "commands",
                &self.blocks.iter().map(|b| b.command.as_str()).collect::<Vec<_>>(),
            )
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::response::{JsonResult, TextResult};
    use crate::transport::mock::MockTransport;

    #[derive(Debug, Default, Deserialize, crate::EapiResponse)]
    #[eapi(command = "show version")]
    #[serde(rename_all = "camelCase")]
    struct ShowVersion {
        model_name: String,
        version: String,
        #[serde(default)]
        serial_number: String,
    }

    fn version_mock() -> MockTransport {
        MockTransport::new()
            .reply(
                "show version",
                json!({"modelName": "DCS-7050SX3-48YC8", "version": "4.30.1F", "serialNumber": "SSJ123"}),
            )
            .reply("show hostname", json!({"hostname": "leaf1", "fqdn": "leaf1.lab"}))
    }

    #[tokio::test]
    async fn test_call_fills_containers() {
        let mock = version_mock();
        let mut node = Node::new(mock.clone());

        let mut version = ShowVersion::default();
        let mut hostname = JsonResult::new("show hostname");

        let mut handle = node.handle(Encoding::Json);
        handle.add_command(&mut version).unwrap();
        handle.add_command(&mut hostname).unwrap();
        handle.add_command_str("show clock", None).unwrap();
        assert_eq!(handle.len(), 3);

        handle.call().await.unwrap();
        assert!(handle.is_empty());
        drop(handle);

        assert_eq!(version.model_name, "DCS-7050SX3-48YC8");
        assert_eq!(version.version, "4.30.1F");
        assert_eq!(version.serial_number, "SSJ123");
        assert_eq!(hostname.get("hostname").unwrap(), "leaf1");

        let calls = mock.calls();
        assert_eq!(
            calls[0].texts(),
            vec!["enable", "show version", "show hostname", "show clock"]
        );
    }

    #[tokio::test]
    async fn test_call_sends_enable_with_password() {
        let mock = version_mock();
        let mut node = Node::new(mock.clone());
        node.enable_authentication("s3cret");

        let mut version = ShowVersion::default();
        let mut handle = node.handle(Encoding::Json);
        handle.enable(&mut version).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].commands.len(), 2);
        assert_eq!(
            calls[0].commands[0],
            Command::Authenticated {
                cmd: "enable".into(),
                input: "s3cret".into()
            }
        );
    }

    #[tokio::test]
    async fn test_text_encoding() {
        let mock = MockTransport::new().reply_text("show clock", "Mon Oct 13 10:00:00 2026\n");
        let mut node = Node::new(mock.clone());

        let mut clock = TextResult::new("show clock");
        let mut handle = node.get_handle("TEXT").unwrap();
        handle.enable(&mut clock).await.unwrap();
        drop(handle);

        assert_eq!(clock.output, "Mon Oct 13 10:00:00 2026\n");
        assert_eq!(mock.calls()[0].encoding, Encoding::Text);
    }

    #[tokio::test]
    async fn test_empty_call_sends_only_enable() {
        let mock = MockTransport::new();
        let mut node = Node::new(mock.clone());

        let mut handle = node.handle(Encoding::Json);
        handle.call().await.unwrap();

        assert_eq!(mock.calls()[0].texts(), vec!["enable"]);
    }

    #[tokio::test]
    async fn test_capacity_boundary() {
        let mock = MockTransport::new();
        let mut node = Node::new(mock.clone());

        let mut handle = node.handle(Encoding::Json);
        for i in 0..MAX_COMMANDS {
            handle
                .add_command_str(format!("show interfaces Ethernet{}", i + 1), None)
                .unwrap();
        }
        assert!(handle.error().is_none());

        let err = handle.add_command_str("show version", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            handle.error(),
            Some(&HandleError::CapacityExceeded { limit: 64 })
        );

        // capacity wins over the empty-command check
        let err = handle.add_command_str("", None).unwrap_err();
        assert!(matches!(
            err,
            Error::Handle(HandleError::CapacityExceeded { .. })
        ));

        // the sticky error blocks the call and still clears the queue
        let err = handle.call().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Handle(HandleError::CapacityExceeded { .. })
        ));
        assert!(handle.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_full_handle_puts_65_on_the_wire() {
        let mock = MockTransport::new();
        let mut node = Node::new(mock.clone());

        let mut handle = node.handle(Encoding::Json);
        for _ in 0..MAX_COMMANDS {
            handle.add_command_str("show version", None).unwrap();
        }
        handle.call().await.unwrap();

        assert_eq!(mock.calls()[0].commands.len(), MAX_COMMANDS + 1);
    }

    #[tokio::test]
    async fn test_empty_command_is_sticky() {
        let mock = MockTransport::new();
        let mut node = Node::new(mock.clone());

        let mut handle = node.handle(Encoding::Json);
        let err = handle.add_command_str("", None).unwrap_err();
        assert!(matches!(err, Error::Handle(HandleError::EmptyCommand)));

        handle.add_command_str("show version", None).unwrap();
        let err = handle.call().await.unwrap_err();
        assert!(matches!(err, Error::Handle(HandleError::EmptyCommand)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_error_leaves_containers_untouched() {
        let mock = version_mock();
        mock.fail_with(1002, "CLI command 2 of 3 'show bogus' failed: invalid command");
        let mut node = Node::new(mock.clone());

        let mut version = ShowVersion::default();
        let mut bogus = JsonResult::new("show bogus");

        let mut handle = node.handle(Encoding::Json);
        handle.add_command(&mut bogus).unwrap();
        handle.add_command(&mut version).unwrap();

        let err = handle.call().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert!(handle.is_empty());
        drop(handle);

        assert!(!bogus.is_filled());
        assert!(version.model_name.is_empty());
    }

    #[tokio::test]
    async fn test_result_count_mismatch() {
        let mock = MockTransport::new();
        mock.result_override(vec![json!({}), json!({})]);
        let mut node = Node::new(mock.clone());

        let mut vlans = JsonResult::new("show vlan");
        let mut handle = node.handle(Encoding::Json);
        handle.add_command(&mut vlans).unwrap();
        handle.add_command_str("show version", None).unwrap();

        let err = handle.call().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Handle(HandleError::ResultCountMismatch {
                expected: 3,
                got: 2
            })
        ));
        assert!(handle.is_empty());
        drop(handle);
        assert!(!vlans.is_filled());
    }

    #[tokio::test]
    async fn test_decode_failure_names_command() {
        let mock = MockTransport::new().reply("show version", json!({"modelName": 7}));
        let mut node = Node::new(mock.clone());

        let mut version = ShowVersion::default();
        let mut handle = node.handle(Encoding::Json);
        let err = handle.enable(&mut version).await.unwrap_err();

        match err {
            Error::Handle(HandleError::Decode { command, .. }) => {
                assert_eq!(command, "show version");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_failure_keeps_earlier_fills() {
        let mock = version_mock()
            .reply("show clock", json!({"output": "Mon Oct 13 10:00:00 2026\n"}));
        let mut node = Node::new(mock.clone());

        let mut hostname = JsonResult::new("show hostname");
        let mut clock = TextResult::new("show clock");
        let mut broken = TextResult::new("show version");
        let mut after = JsonResult::new("show hostname");

        let mut handle = node.handle(Encoding::Json);
        handle.add_command(&mut hostname).unwrap();
        handle.add_command(&mut clock).unwrap();
        handle.add_command(&mut broken).unwrap();
        handle.add_command(&mut after).unwrap();

        let err = handle.call().await.unwrap_err();
        assert!(matches!(err, Error::Handle(HandleError::Decode { .. })));
        drop(handle);

        assert_eq!(hostname.get("hostname").unwrap(), "leaf1");
        assert_eq!(clock.output, "Mon Oct 13 10:00:00 2026\n");
        assert!(broken.output.is_empty());
        assert!(!after.is_filled());
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_call_runs_on_spawned_task() {
        let mock = version_mock();
        let mut node = Node::new(mock.clone());

        let task = async move {
            let mut version = ShowVersion::default();
            let mut handle = node.handle(Encoding::Json);
            handle.add_command(&mut version)?;
            handle.call().await?;
            drop(handle);
            Ok::<_, Error>(version)
        };
        assert_send(&task);

        let version = tokio::spawn(task).await.unwrap().unwrap();
        assert_eq!(version.model_name, "DCS-7050SX3-48YC8");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_closed_handle() {
        let mock = MockTransport::new();
        let mut node = Node::new(mock.clone());

        let mut handle = node.handle(Encoding::Json);
        handle.add_command_str("show version", None).unwrap();
        handle.close();
        assert!(handle.is_closed());
        assert!(handle.is_empty());

        let err = handle.add_command_str("show version", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = handle.call().await.unwrap_err();
        assert!(matches!(err, Error::Handle(HandleError::Closed)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_is_reusable_after_call() {
        let mock = version_mock();
        let mut node = Node::new(mock.clone());

        let mut first = JsonResult::new("show version");
        let mut second = JsonResult::new("show hostname");

        let mut handle = node.handle(Encoding::Json);
        handle.enable(&mut first).await.unwrap();
        handle.enable(&mut second).await.unwrap();
        drop(handle);

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].texts(), vec!["enable", "show hostname"]);
        assert_eq!(first.get("version").unwrap(), "4.30.1F");
        assert_eq!(second.get("fqdn").unwrap(), "leaf1.lab");
    }
}
