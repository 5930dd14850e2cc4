//! Collector configuration via `logring.toml`
//!
//! The settings a host gives the capture collector. A default file with
//! comments can be written next to the region so operators have something
//! to edit; changes take effect when the collector is rebuilt.

use logring_core::{Error, Result, Severity};
use logring_storage::config::{validate_capacity, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "logring.toml";

fn default_enabled() -> bool {
    true
}

fn default_min_level() -> String {
    "debug5".to_string()
}

fn default_set_query_fields() -> bool {
    true
}

fn default_buffer_size() -> usize {
    DEFAULT_CAPACITY
}

/// Collector configuration loaded from `logring.toml`.
///
/// # Example
///
/// ```toml
/// enabled = true
/// min_level = "warning"
/// ignore_statements = true
/// set_query_fields = false
/// buffer_size = 1048576
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Capture events at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lowest severity captured, by name.
    #[serde(default = "default_min_level")]
    pub min_level: String,
    /// Drop statement and duration echo events.
    #[serde(default)]
    pub ignore_statements: bool,
    /// Keep the query text and query position of captured events.
    #[serde(default = "default_set_query_fields")]
    pub set_query_fields: bool,
    /// Region capacity in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            min_level: default_min_level(),
            ignore_statements: false,
            set_query_fields: default_set_query_fields(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl CollectorConfig {
    /// Parse `min_level` into a severity.
    ///
    /// # Errors
    ///
    /// `UnknownSeverity` for a name with no level, `InvalidConfiguration`
    /// for an empty one.
    pub fn severity_threshold(&self) -> Result<Severity> {
        self.min_level.parse()
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<()> {
        self.severity_threshold()?;
        validate_capacity(self.buffer_size)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# logring collector configuration
#
# Capture events at all (default: true)
enabled = true

# Lowest severity captured (default: "debug5")
#   debug5 .. debug1, log, info, notice, warning, error, fatal, panic
min_level = "debug5"

# Drop "statement: " and "duration: " echo events (default: false)
ignore_statements = false

# Keep query text and query position on captured events (default: true)
set_query_fields = true

# Region capacity in bytes (default: 1 MiB)
buffer_size = 1048576
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: CollectorConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
