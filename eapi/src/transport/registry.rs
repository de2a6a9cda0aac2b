//! Global transport registry mapping transport names to factories.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use super::config::{TransportConfig, TransportKind};
use super::http::HttpTransport;
use super::socket::SocketTransport;
use super::Transport;
use crate::error::{ProfileError, Result};

/// Builds a transport from connection parameters.
pub type TransportFactory = fn(TransportConfig) -> Result<Box<dyn Transport>>;

/// Global transport registry.
static REGISTRY: Lazy<RwLock<TransportRegistry>> = Lazy::new(|| {
    let mut registry = TransportRegistry::new();
    registry.register_builtin_transports();
    RwLock::new(registry)
});

/// Registry of transport factories keyed by the profile `transport` value.
#[derive(Debug, Default)]
pub struct TransportRegistry {
    factories: HashMap<String, TransportFactory>,
}

fn socket(config: TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(SocketTransport::new(config)))
}

fn http_local(config: TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(HttpTransport::http_local(config)?))
}

fn http(config: TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(HttpTransport::http(config)?))
}

fn https(config: TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(HttpTransport::https(config)?))
}

impl TransportRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<TransportRegistry> {
        &REGISTRY
    }

    /// Register the four built-in transports.
    fn register_builtin_transports(&mut self) {
        for kind in TransportKind::ALL {
            let factory: TransportFactory = match kind {
                TransportKind::Socket => socket,
                TransportKind::HttpLocal => http_local,
                TransportKind::Http => http,
                TransportKind::Https => https,
            };
            self.factories.insert(kind.as_str().to_string(), factory);
        }
    }

    /// Register a transport factory under `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: TransportFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(ProfileError::AlreadyRegistered { name }.into());
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Get a factory by name.
    pub fn get(&self, name: &str) -> Option<TransportFactory> {
        self.factories.get(name).copied()
    }

    /// Check if a transport is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// List all registered transport names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.factories.keys()
    }

    /// Build a transport through the global registry.
    pub fn create(name: &str, config: TransportConfig) -> Result<Box<dyn Transport>> {
        let factory = Self::global()
            .read()
            .map_err(|_| ProfileError::Lock("transport"))?
            .get(name)
            .ok_or_else(|| ProfileError::UnknownTransport {
                name: name.to_string(),
            })?;
        factory(config)
    }
}
