//! Builder for creating nodes.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use secrecy::SecretString;

use super::Node;
use crate::error::Result;
use crate::transport::{TlsVerification, TransportConfig, TransportKind, TransportRegistry};

/// Builder for constructing nodes.
///
/// The transport is looked up by name in the global
/// [`TransportRegistry`], so custom transports registered there can be
/// selected the same way as the built-in ones.
///
/// # Example
///
/// ```rust,no_run
/// use eapi::NodeBuilder;
///
/// # fn example() -> Result<(), eapi::Error> {
/// let node = NodeBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .transport("https")
///     .enable_password("enablepw")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct NodeBuilder {
    host: String,
    port: Option<u16>,
    username: String,
    password: String,
    transport: String,
    timeout: Duration,
    tls_verification: TlsVerification,
    socket_path: Option<PathBuf>,
    enable_password: Option<String>,
    auto_refresh: bool,
}

impl NodeBuilder {
    /// Create a new node builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        let defaults = TransportConfig::default();
        Self {
            host: host.into(),
            port: None,
            username: defaults.username,
            password: String::new(),
            transport: TransportKind::Https.as_str().to_string(),
            timeout: defaults.timeout,
            tls_verification: defaults.tls_verification,
            socket_path: None,
            enable_password: None,
            auto_refresh: true,
        }
    }

    /// Set the port (default: the transport's own).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username for Basic authentication (default: "admin").
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the password for Basic authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Select a registered transport by name (default: "https").
    pub fn transport(mut self, name: impl Into<String>) -> Self {
        self.transport = name.into();
        self
    }

    /// Select a built-in transport.
    pub fn transport_kind(mut self, kind: TransportKind) -> Self {
        self.transport = kind.as_str().to_string();
        self
    }

    /// Set the request timeout.
    ///
    /// Zero or anything above 65535 seconds falls back to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = TransportConfig::timeout_from_secs(timeout.as_secs());
        self
    }

    /// Verify HTTPS certificates against the system trust store.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.tls_verification = if verify {
            TlsVerification::System
        } else {
            TlsVerification::Disabled
        };
        self
    }

    /// Override the Unix socket path for the socket transport.
    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Set the password answered to `enable`.
    pub fn enable_password(mut self, password: impl Into<String>) -> Self {
        self.enable_password = Some(password.into());
        self
    }

    /// Turn config cache invalidation after `config` on or off (default: on).
    pub fn auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    /// The connection parameters this builder would hand to the transport.
    pub fn transport_config(&self) -> TransportConfig {
        let mut config = TransportConfig::new(self.host.clone());
        config.port = self.port;
        config.username = self.username.clone();
        config.password = SecretString::from(self.password.clone());
        config.timeout = self.timeout;
        config.tls_verification = self.tls_verification;
        if let Some(path) = &self.socket_path {
            config.socket_path = path.clone();
        }
        config
    }

    /// Build the node.
    ///
    /// No connection is made here; the first request dials the endpoint.
    pub fn build(self) -> Result<Node> {
        let config = self.transport_config();

        debug!(
            "building node for {} via {} transport",
            self.host, self.transport
        );

        let transport = TransportRegistry::create(&self.transport, config)?;

        let mut node = Node::from_boxed(transport);
        if let Some(password) = self.enable_password {
            node.enable_authentication(password);
        }
        node.set_auto_refresh(self.auto_refresh);
        Ok(node)
    }
}
