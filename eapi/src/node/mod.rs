//! The device-facing node.
//!
//! A [`Node`] owns one transport and adds the eAPI conventions on top of
//! it: every request is prefixed with `enable` (answered with the enable
//! password when one is set), config-mode commands are wrapped in
//! `configure terminal`, and the running/startup configs are cached.

mod builder;
pub mod config;
pub mod handle;
mod response;

pub use builder::NodeBuilder;
pub use config::{ConfigSource, find_section};
pub use handle::{Handle, MAX_COMMANDS};
pub use response::EnableResponse;

use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::envelope::{Command, Encoding, Response};
use crate::error::{NodeError, Result};
use crate::transport::Transport;

use config::ConfigCache;

/// Commands that would leave privileged exec for config mode.
static CONFIG_MODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*configure(\s+terminal)?\s*$").expect("config mode pattern is valid")
});

/// Command used to enter privileged mode ahead of every request.
pub(crate) const ENABLE: &str = "enable";

/// Command that opens config mode for [`Node::config`].
const CONFIGURE_TERMINAL: &str = "configure terminal";

/// An eAPI-enabled device.
///
/// Nodes are driven by one caller at a time; batched requests go through
/// a [`Handle`], which borrows the node mutably for its lifetime.
///
/// # Example
///
/// ```rust,no_run
/// use eapi::{Encoding, Node};
///
/// # async fn example() -> Result<(), eapi::Error> {
/// let mut node = Node::builder("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .transport("https")
///     .build()?;
///
/// let response = node.run_commands(&["show version"], Encoding::Json).await?;
/// println!("{}", response.result[0]["version"]);
/// # Ok(())
/// # }
/// ```
pub struct Node {
    transport: Box<dyn Transport>,
    enable_password: Option<SecretString>,
    auto_refresh: bool,
    cache: ConfigCache,
}

impl Node {
    /// Create a node on top of `transport`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_boxed(Box::new(transport))
    }

    /// Create a node from an already boxed transport.
    pub fn from_boxed(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            enable_password: None,
            auto_refresh: true,
            cache: ConfigCache::default(),
        }
    }

    /// Start building a node for `host`.
    pub fn builder(host: impl Into<String>) -> NodeBuilder {
        NodeBuilder::new(host)
    }

    /// The bound transport (e.g. to inspect its last error).
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Mutable access to the bound transport.
    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        self.transport.as_mut()
    }

    /// Rebind the node to another transport. Cached configs are dropped.
    pub fn set_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = transport;
        self.cache.clear();
    }

    /// Set the password sent with `enable`. An empty password clears it.
    pub fn enable_authentication(&mut self, password: impl Into<String>) {
        let password = password.into();
        self.enable_password = if password.is_empty() {
            None
        } else {
            Some(SecretString::from(password))
        };
    }

    /// Whether an enable password is configured.
    pub fn has_enable_password(&self) -> bool {
        self.enable_password.is_some()
    }

    /// Turn automatic cache invalidation after [`config`](Self::config) on or off.
    pub fn set_auto_refresh(&mut self, auto_refresh: bool) {
        self.auto_refresh = auto_refresh;
    }

    /// Whether [`config`](Self::config) invalidates the cached configs.
    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    /// The `enable` element prepended to every request.
    pub(crate) fn enable_command(&self) -> Command {
        match &self.enable_password {
            Some(password) => Command::Authenticated {
                cmd: ENABLE.to_string(),
                input: password.expose_secret().to_string(),
            },
            None => Command::Bare(ENABLE.to_string()),
        }
    }

    /// Send a fully formed command list as-is.
    pub(crate) async fn execute(
        &mut self,
        commands: &[Command],
        encoding: Encoding,
    ) -> Result<Response> {
        self.transport.execute(commands, encoding).await
    }

    /// Run `commands` in privileged mode.
    ///
    /// The response to the injected `enable` is stripped, so
    /// `result[i]` answers `commands[i]`.
    pub async fn run_commands<S: AsRef<str>>(
        &mut self,
        commands: &[S],
        encoding: Encoding,
    ) -> Result<Response> {
        let mut full = Vec::with_capacity(commands.len() + 1);
        full.push(self.enable_command());
        full.extend(commands.iter().map(|cmd| Command::from(cmd.as_ref())));

        debug!(
            "run_commands: {} commands via {} ({})",
            commands.len(),
            self.transport.endpoint(),
            encoding
        );

        let mut response = self.execute(&full, encoding).await?;
        if response.result.len() != full.len() {
            return Err(NodeError::ResultCountMismatch {
                expected: full.len(),
                got: response.result.len(),
            }
            .into());
        }

        response.result.remove(0);
        Ok(response)
    }

    /// Run show-style commands and return their trimmed text output.
    ///
    /// Config-mode entry (`configure`, `configure terminal`) is refused
    /// before anything is sent; use [`config`](Self::config) instead.
    pub async fn enable<S: AsRef<str>>(&mut self, commands: &[S]) -> Result<Vec<EnableResponse>> {
        if let Some(cmd) = commands.iter().find(|cmd| CONFIG_MODE.is_match(cmd.as_ref())) {
            return Err(NodeError::ConfigModeNotSupported {
                command: cmd.as_ref().to_string(),
            }
            .into());
        }

        let response = self.run_commands(commands, Encoding::Text).await?;

        commands
            .iter()
            .zip(response.result)
            .map(|(cmd, result)| -> Result<EnableResponse> {
                let output = result
                    .get("output")
                    .and_then(Value::as_str)
                    .ok_or_else(|| NodeError::MissingOutput {
                        command: cmd.as_ref().to_string(),
                    })?;
                Ok(EnableResponse::new(cmd.as_ref(), output.trim()))
            })
            .collect()
    }

    /// Apply configuration commands inside `configure terminal`.
    ///
    /// With auto-refresh on, the cached configs are invalidated whether or
    /// not the device accepted every line.
    pub async fn config<S: AsRef<str>>(&mut self, commands: &[S]) -> Result<()> {
        let mut full = Vec::with_capacity(commands.len() + 1);
        full.push(CONFIGURE_TERMINAL);
        full.extend(commands.iter().map(|cmd| cmd.as_ref()));

        let result = self.run_commands(&full, Encoding::Json).await;

        if self.auto_refresh {
            self.refresh();
        }

        result.map(|_| ())
    }

    /// Open a batched request handle.
    pub fn handle(&mut self, encoding: Encoding) -> Handle<'_> {
        Handle::new(self, encoding)
    }

    /// Open a batched request handle, parsing `encoding` ("json" or "text",
    /// any case).
    pub fn get_handle(&mut self, encoding: &str) -> Result<Handle<'_>> {
        let encoding = encoding.parse::<Encoding>()?;
        Ok(self.handle(encoding))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("transport", &self.transport.endpoint())
            .field("enable_password", &self.enable_password.as_ref().map(|_| "<redacted>"))
            .field("auto_refresh", &self.auto_refresh)
            .field("cache", &self.cache)
            .finish()
    }
}
