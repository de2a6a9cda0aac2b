//! Named connection profiles.
//!
//! Profiles come from an INI file (`eapi.conf`) with one
//! `[connection:<name>]` section per device:
//!
//! ```ini
//! [connection:spine1]
//! host = 192.168.0.10
//! username = admin
//! password = secret
//! transport = https
//! enablepwd = enablesecret
//! ```
//!
//! The module-level functions operate on a process-wide copy of the file,
//! loaded on first use and replaced by [`load_config`].

mod file;

pub use file::{
    DEFAULT_SEARCH_PATH, EAPI_CONF_ENV, EapiConfig, Profile, ProfileOptions, expand_home,
    resolve_path,
};

use std::path::Path;
use std::sync::RwLock;

use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::error::{ProfileError, Result};
use crate::node::{Node, NodeBuilder};

/// Process-wide profiles.
static PROFILES: Lazy<RwLock<EapiConfig>> = Lazy::new(|| {
    let config = EapiConfig::load(None).unwrap_or_else(|e| {
        warn!("profile file unreadable, using built-in localhost profile: {}", e);
        EapiConfig::empty()
    });
    RwLock::new(config)
});

/// Serialises tests that read or write `EAPI_CONF`.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn lock_error<T>(_: T) -> ProfileError {
    ProfileError::Lock("profile")
}

/// Reload the process-wide profiles, searching `path` after `EAPI_CONF`.
pub fn load_config(path: impl AsRef<Path>) -> Result<()> {
    let config = EapiConfig::load(Some(path.as_ref()))?;
    debug!(
        "reloaded profiles: {} connections",
        config.connections().len()
    );
    *PROFILES.write().map_err(lock_error)? = config;
    Ok(())
}

/// Names of all loaded profiles.
pub fn connections() -> Result<Vec<String>> {
    let profiles = PROFILES.read().map_err(lock_error)?;
    Ok(profiles
        .connections()
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// Raw options of a loaded profile.
pub fn config_for(name: &str) -> Result<ProfileOptions> {
    PROFILES
        .read()
        .map_err(lock_error)?
        .config_for(name)
        .cloned()
        .ok_or_else(|| {
            ProfileError::NotFound {
                name: name.to_string(),
            }
            .into()
        })
}

/// Build a node from a loaded profile.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() -> Result<(), eapi::Error> {
/// let mut node = eapi::connect_to("spine1")?;
/// let version = node.enable(&["show version"]).await?;
/// println!("{}", version[0].result);
/// # Ok(())
/// # }
/// ```
pub fn connect_to(name: &str) -> Result<Node> {
    let profile = PROFILES.read().map_err(lock_error)?.profile(name)?;
    profile.builder().build()
}

/// Build a node without a profile.
///
/// `port` of `None` selects the transport's default.
pub fn connect(
    transport: &str,
    host: &str,
    username: &str,
    password: &str,
    port: Option<u16>,
) -> Result<Node> {
    let mut builder = NodeBuilder::new(host)
        .transport(transport)
        .username(username)
        .password(password);
    if let Some(port) = port {
        builder = builder.port(port);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};

    // The only test touching the process-wide profiles.
    #[test]
    fn test_global_registry() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        assert!(connections().unwrap().iter().any(|name| name == "localhost"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eapi.conf");
        std::fs::write(
            &path,
            "[connection:veos1]\nhost = 172.16.0.5\ntransport = http\nenablepwd = en\n",
        )
        .unwrap();

        // EAPI_CONF overrides the explicit path
        if std::env::var_os(EAPI_CONF_ENV).is_some() {
            return;
        }

        load_config(&path).unwrap();
        assert_eq!(connections().unwrap(), vec!["veos1", "localhost"]);
        assert_eq!(config_for("veos1").unwrap()["host"], "172.16.0.5");

        let node = connect_to("veos1").unwrap();
        assert_eq!(node.transport().endpoint(), "http://172.16.0.5/command-api");
        assert!(node.has_enable_password());

        let err = connect_to("spine9").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(matches!(
            config_for("spine9").unwrap_err(),
            Error::Profile(ProfileError::NotFound { .. })
        ));
    }

    #[test]
    fn test_connect() {
        let node = connect("http", "10.0.0.1", "admin", "pw", Some(8080)).unwrap();
        assert_eq!(node.transport().endpoint(), "http://10.0.0.1:8080/command-api");

        let node = connect("https", "10.0.0.1", "admin", "pw", None).unwrap();
        assert_eq!(node.transport().endpoint(), "https://10.0.0.1/command-api");

        let err = connect("ssh", "10.0.0.1", "admin", "pw", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
