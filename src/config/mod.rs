// Store configuration, loaded from a redis.conf-style file

mod parser;

pub use parser::{ConfigParser, ConfigValue};

use crate::storage::locks::{DEFAULT_STRIPES, MAX_STRIPES};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Number of key lock stripes; rounded up to a power of two by the store
    pub lock_stripes: usize,
    /// Default tracing filter when `SET_STORE_LOG` is unset
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_stripes: DEFAULT_STRIPES,
            log_level: "info".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file. Keys not present keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_str_content(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))
    }

    pub fn from_str_content(content: &str) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in ConfigParser::new(content).parse()? {
            config.apply(&key, &value)?;
        }
        Ok(config)
    }

    /// Apply one directive.
    pub fn apply(&mut self, key: &str, value: &ConfigValue) -> Result<()> {
        match key {
            "lock-stripes" => match value.as_int() {
                Some(n) if (1..=MAX_STRIPES as i64).contains(&n) => self.lock_stripes = n as usize,
                _ => bail!(
                    "'lock-stripes' must be an integer between 1 and {}, got '{}'",
                    MAX_STRIPES,
                    value
                ),
            },
            "loglevel" => self.log_level = normalize_level(&value.to_string())?.to_string(),
            _ => bail!("unknown configuration directive '{}'", key),
        }
        debug!(key, %value, "applied config directive");
        Ok(())
    }
}

/// Accepts tracing level names plus the redis.conf spellings.
fn normalize_level(level: &str) -> Result<&'static str> {
    Ok(match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" | "verbose" => "debug",
        "info" | "notice" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        "off" | "nothing" => "off",
        other => bail!("unknown log level '{}'", other),
    })
}
