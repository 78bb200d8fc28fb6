//! Configuration module for fieldsync
//!
//! Settings for the mapping set manager, the field path resolver, the
//! confirmation gate and logging, loaded from a TOML file. Every section has
//! defaults so a partial file is valid.

pub mod error;

pub use error::{ConfigError, ConfigResult};

use crate::permissions::Authorization;
use crate::schema::resolver::ReferenceTargetPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Log levels accepted in `[logging] level`
pub const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FieldSyncConfig {
    pub manager: ManagerConfig,
    pub resolver: ResolverConfig,
    pub gate: GateConfig,
    pub logging: LoggingConfig,
}

/// Mapping set manager settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ManagerConfig {
    /// Access level of the operator
    pub authorization: Authorization,
    /// Local object bound when no existing mapping names one
    pub default_local_object: Option<String>,
}

/// Field path resolver settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    pub reference_target_policy: ReferenceTargetPolicy,
}

/// Confirmation gate settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Optional bound on how long a gated operation waits; unset waits forever
    pub timeout_ms: Option<u64>,
}

impl GateConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (off, error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FieldSyncConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::validation(format!(
                "unknown log level '{}', expected one of {:?}",
                self.logging.level, LOG_LEVELS
            )));
        }

        if self.gate.timeout_ms == Some(0) {
            return Err(ConfigError::validation(
                "gate.timeout_ms must be greater than zero when set",
            ));
        }

        if let Some(object) = &self.manager.default_local_object {
            if object.trim().is_empty() {
                return Err(ConfigError::validation(
                    "manager.default_local_object must not be blank",
                ));
            }
        }

        Ok(())
    }
}
