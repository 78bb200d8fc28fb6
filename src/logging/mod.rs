//! Logging setup
//!
//! The library itself only emits through the `log` facade. Binaries and tests
//! install `env_logger` here; `RUST_LOG` overrides the configured level.

use crate::config::{ConfigError, ConfigResult, LoggingConfig};
use log::LevelFilter;
use std::str::FromStr;
use std::sync::Once;

static TEST_INIT: Once = Once::new();

/// Parse a configured level name into a filter
pub fn parse_level(level: &str) -> ConfigResult<LevelFilter> {
    LevelFilter::from_str(level)
        .map_err(|_| ConfigError::validation(format!("unknown log level '{}'", level)))
}

/// Install the global logger at the configured level.
///
/// Returns `Ok(false)` if a logger was already installed.
pub fn init_logging(config: &LoggingConfig) -> ConfigResult<bool> {
    let level = parse_level(&config.level)?;
    let installed = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init()
        .is_ok();
    if installed {
        log::debug!("Logging initialized at level {}", level);
    }
    Ok(installed)
}

/// Initialize debug logging for tests, once per process
pub fn init_test_logging() {
    TEST_INIT.call_once(|| {
        env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init()
            .unwrap_or(());
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("warn").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert!(parse_level("chatty").is_err());
    }

    #[test]
    fn test_init_rejects_unknown_level() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
        };
        assert!(init_logging(&config).is_err());
    }
}
