//! Running/startup config cache and section extraction.
//!
//! A config section is a top-level line plus every indented line under
//! it, up to the next line that starts in column zero:
//!
//! ```text
//! interface Management1      <- section start (caller pattern)
//!    description oob
//!    ip address 10.0.0.2/24
//! !                          <- first column-0 line, not included
//! ```

use std::fmt;
use std::str::FromStr;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::Node;
use crate::error::{NodeError, Result};

/// First line that starts with a non-whitespace character.
static BLOCK_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\S").expect("block terminator pattern is valid"));

/// Which configuration to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConfigSource {
    /// `show running-config all`
    #[default]
    Running,
    /// `show startup-config`
    Startup,
}

impl ConfigSource {
    /// CLI name of the config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running-config",
            Self::Startup => "startup-config",
        }
    }

    /// Command that prints this config.
    pub fn show_command(&self) -> &'static str {
        match self {
            Self::Running => "show running-config all",
            Self::Startup => "show startup-config",
        }
    }
}

impl FromStr for ConfigSource {
    type Err = NodeError;

    /// An empty string means the running config.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "" | "running-config" => Ok(Self::Running),
            "startup-config" => Ok(Self::Startup),
            other => Err(NodeError::InvalidConfigSource {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lazily filled config text. An empty string means "not fetched".
#[derive(Default)]
pub(crate) struct ConfigCache {
    running: String,
    startup: String,
}

impl ConfigCache {
    fn slot(&mut self, source: ConfigSource) -> &mut String {
        match source {
            ConfigSource::Running => &mut self.running,
            ConfigSource::Startup => &mut self.startup,
        }
    }

    pub(crate) fn text(&self, source: ConfigSource) -> &str {
        match source {
            ConfigSource::Running => &self.running,
            ConfigSource::Startup => &self.startup,
        }
    }

    pub(crate) fn is_fetched(&self, source: ConfigSource) -> bool {
        !self.text(source).is_empty()
    }

    pub(crate) fn store(&mut self, source: ConfigSource, text: String) {
        *self.slot(source) = text;
    }

    pub(crate) fn clear(&mut self) {
        self.running.clear();
        self.startup.clear();
    }
}

impl fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigCache")
            .field("running", &self.running.len())
            .field("startup", &self.startup.len())
            .finish()
    }
}

fn compile_section_pattern(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(&format!("(?m){pattern}")).map_err(NodeError::InvalidPattern)?;
    Ok(regex)
}

fn extract<'t>(regex: &Regex, pattern: &str, text: &'t str, which: &str) -> Result<&'t str> {
    if text.is_empty() {
        return Err(NodeError::EmptyConfig {
            which: which.to_string(),
        }
        .into());
    }

    let start = regex
        .find(text)
        .ok_or_else(|| NodeError::SectionNotFound {
            pattern: pattern.to_string(),
        })?;

    let end = BLOCK_END
        .find_at(text, start.end())
        .ok_or_else(|| NodeError::SectionUnterminated {
            pattern: pattern.to_string(),
        })?;

    Ok(&text[start.start()..end.start()])
}

/// Extract the section of `text` starting at the first match of `pattern`.
///
/// `pattern` is compiled in multiline mode and not anchored further;
/// include `^`/`$` to pin it to whole lines.
pub fn find_section<'t>(text: &'t str, pattern: &str) -> Result<&'t str> {
    let regex = compile_section_pattern(pattern)?;
    extract(&regex, pattern, text, "config")
}

impl Node {
    /// The running config, fetched once and cached.
    pub async fn running_config(&mut self) -> Result<&str> {
        self.cached_config(ConfigSource::Running).await
    }

    /// The startup config, fetched once and cached.
    pub async fn startup_config(&mut self) -> Result<&str> {
        self.cached_config(ConfigSource::Startup).await
    }

    async fn cached_config(&mut self, source: ConfigSource) -> Result<&str> {
        if !self.cache.is_fetched(source) {
            let text = self.get_config(source).await?;
            debug!("cached {} ({} bytes)", source, text.len());
            self.cache.store(source, text);
        }
        Ok(self.cache.text(source))
    }

    /// Read a config from the device, bypassing the cache.
    pub async fn get_config(&mut self, source: ConfigSource) -> Result<String> {
        let command = source.show_command();
        let response = self.enable(&[command]).await?;
        Ok(response
            .into_iter()
            .next()
            .map(|r| r.result)
            .unwrap_or_default())
    }

    /// Drop both cached configs; the next read fetches them again.
    pub fn refresh(&mut self) {
        debug!("config cache cleared");
        self.cache.clear();
    }

    /// Extract one top-level section from the running or startup config.
    ///
    /// See [`find_section`] for the matching rules.
    pub async fn get_section(&mut self, pattern: &str, source: ConfigSource) -> Result<String> {
        let regex = compile_section_pattern(pattern)?;
        let text = self.cached_config(source).await?;
        extract(&regex, pattern, text, source.as_str()).map(str::to_string)
    }
}
