//! The `eapi.conf` profile file.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use ini::Ini;
use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ProfileError, Result};
use crate::node::{Node, NodeBuilder};
use crate::transport::TransportKind;

/// Environment variable naming the profile file. Overrides every other location.
pub const EAPI_CONF_ENV: &str = "EAPI_CONF";

/// Locations tried when neither `EAPI_CONF` nor an explicit file is given.
pub const DEFAULT_SEARCH_PATH: [&str; 2] = ["~/.eapi.conf", "/mnt/flash/eapi.conf"];

/// Section prefix marking a connection profile.
const SECTION_PREFIX: &str = "connection:";

/// Profile that is always present.
const LOCALHOST: &str = "localhost";

/// Raw key/value options of one profile, in file order.
pub type ProfileOptions = IndexMap<String, String>;

/// A connection profile with every default applied.
pub struct Profile {
    /// Profile name, without the `connection:` prefix.
    pub name: String,
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// Registered transport name.
    pub transport: String,
    /// `None` selects the transport's default port.
    pub port: Option<u16>,
    pub enable_password: SecretString,
}

impl Profile {
    /// A node builder carrying every profile setting.
    pub fn builder(&self) -> NodeBuilder {
        let mut builder = NodeBuilder::new(self.host.clone())
            .username(self.username.clone())
            .password(self.password.expose_secret())
            .transport(self.transport.clone())
            .enable_password(self.enable_password.expose_secret());
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        builder
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("transport", &self.transport)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

/// Parsed profile file.
///
/// # Example
///
/// ```rust
/// use eapi::profile::EapiConfig;
///
/// let config = EapiConfig::parse(
///     "[connection:spine1]\nhost = 10.0.0.1\ntransport = http\n",
/// )
/// .unwrap();
///
/// assert_eq!(config.connections(), vec!["spine1", "localhost"]);
/// assert_eq!(config.profile("spine1").unwrap().host, "10.0.0.1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct EapiConfig {
    path: Option<PathBuf>,
    sections: IndexMap<String, ProfileOptions>,
}

impl EapiConfig {
    /// A config holding only the `localhost` profile.
    pub fn empty() -> Self {
        let mut config = Self::default();
        config.normalize();
        config
    }

    /// Locate and load the profile file.
    ///
    /// `EAPI_CONF` wins over `explicit`, which wins over
    /// [`DEFAULT_SEARCH_PATH`]. The first candidate that exists is read;
    /// with none, the result is [`empty`](Self::empty).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = env::var_os(EAPI_CONF_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let defaults: Vec<PathBuf> = DEFAULT_SEARCH_PATH.into_iter().map(PathBuf::from).collect();

        match resolve_path(from_env.as_deref(), explicit, &defaults) {
            Some(path) => Self::from_file(path),
            None => {
                debug!("no eapi.conf found, using built-in localhost profile");
                Ok(Self::empty())
            }
        }
    }

    /// Read and parse the file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|e| ProfileError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!("loaded profiles from {}", path.display());

        let mut config = Self::from_ini(&ini);
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse profile file contents.
    pub fn parse(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| ProfileError::Load {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_ini(&ini))
    }

    fn from_ini(ini: &Ini) -> Self {
        let mut sections = IndexMap::new();

        for (section, properties) in ini.iter() {
            let Some(name) = section.and_then(|s| s.strip_prefix(SECTION_PREFIX)) else {
                continue;
            };
            let options: &mut ProfileOptions = sections.entry(name.to_string()).or_default();
            for (key, value) in properties.iter() {
                options.insert(key.to_string(), value.to_string());
            }
        }

        let mut config = Self {
            path: None,
            sections,
        };
        config.normalize();
        config
    }

    /// Fill in `host` and make sure `localhost` exists.
    fn normalize(&mut self) {
        for (name, options) in self.sections.iter_mut() {
            options
                .entry("host".to_string())
                .or_insert_with(|| name.clone());
        }

        if !self.sections.contains_key(LOCALHOST) {
            let mut options = ProfileOptions::new();
            options.insert("transport".to_string(), TransportKind::Socket.as_str().to_string());
            options.insert("host".to_string(), LOCALHOST.to_string());
            self.sections.insert(LOCALHOST.to_string(), options);
        }
    }

    /// File the config was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Profile names in file order, `localhost` last when it was injected.
    pub fn connections(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    /// Raw options of a profile. `name` may carry the `connection:` prefix.
    pub fn config_for(&self, name: &str) -> Option<&ProfileOptions> {
        let name = name.strip_prefix(SECTION_PREFIX).unwrap_or(name);
        self.sections.get(name)
    }

    /// Add or replace a profile.
    pub fn add_connection(&mut self, name: impl Into<String>, options: ProfileOptions) {
        self.sections.insert(name.into(), options);
        self.normalize();
    }

    /// Resolve a profile, applying defaults for every missing option.
    pub fn profile(&self, name: &str) -> Result<Profile> {
        let options = self
            .config_for(name)
            .ok_or_else(|| ProfileError::NotFound {
                name: name.to_string(),
            })?;
        let name = name.strip_prefix(SECTION_PREFIX).unwrap_or(name);

        let port = match options.get("port").map(|p| p.trim()) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<u16>().map_err(|_| ProfileError::InvalidPort {
                profile: name.to_string(),
                value: value.to_string(),
            })?),
        };

        let transport = match option(options, "transport") {
            "" => TransportKind::Https.as_str(),
            other => other,
        };
        let username = match option(options, "username") {
            "" => "admin",
            other => other,
        };

        Ok(Profile {
            name: name.to_string(),
            host: option(options, "host").to_string(),
            username: username.to_string(),
            password: SecretString::from(option(options, "password").to_string()),
            transport: transport.to_string(),
            port,
            enable_password: SecretString::from(option(options, "enablepwd").to_string()),
        })
    }

    /// Build a node from a profile. No connection is made.
    pub fn connect_to(&self, name: &str) -> Result<Node> {
        let profile = self.profile(name)?;
        debug!("connecting to profile {:?}", profile);
        profile.builder().build()
    }
}

fn option<'a>(options: &'a ProfileOptions, key: &str) -> &'a str {
    options.get(key).map(String::as_str).unwrap_or_default()
}

/// Pick the profile file: `from_env` if set, else `explicit`, else the
/// first of `defaults`. Only candidates that exist are returned.
pub fn resolve_path(
    from_env: Option<&Path>,
    explicit: Option<&Path>,
    defaults: &[PathBuf],
) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = match (from_env, explicit) {
        (Some(path), _) | (None, Some(path)) => vec![path.to_path_buf()],
        (None, None) => defaults.to_vec(),
    };

    candidates
        .iter()
        .map(|path| expand_home(path))
        .find(|path| {
            let exists = path.is_file();
            if !exists {
                debug!("profile file candidate {} not found", path.display());
            }
            exists
        })
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    expand_home_with(path, home_dir(dirs::home_dir(), env::var_os("HOME")))
}

/// The user database answer, else a non-empty `HOME`.
fn home_dir(from_user_db: Option<PathBuf>, home_env: Option<OsString>) -> Option<PathBuf> {
    from_user_db.or_else(|| home_env.filter(|home| !home.is_empty()).map(PathBuf::from))
}

fn expand_home_with(path: &Path, home: Option<PathBuf>) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match home {
        Some(home) => home.join(rest),
        None => {
            warn!("cannot expand {}: no home directory", path.display());
            path.to_path_buf()
        }
    }
}
