//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound for `emitter.max_listeners`.
pub const MAX_LISTENERS_UPPER_BOUND: usize = 1_000_000;

const VALID_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
const VALID_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_emitter(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_emitter(config: &Config) -> ConfigResult<()> {
    if config.emitter.max_listeners > MAX_LISTENERS_UPPER_BOUND {
        return Err(ConfigError::ValidationError {
            field: "emitter.max_listeners".to_owned(),
            message: format!(
                "max_listeners must be at most {MAX_LISTENERS_UPPER_BOUND} (0 disables the warning)"
            ),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let logging = &config.logging;

    if !VALID_LEVELS.contains(&logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                logging.level,
                VALID_LEVELS.join(", ")
            ),
        });
    }

    if !VALID_FORMATS.contains(&logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                logging.format,
                VALID_FORMATS.join(", ")
            ),
        });
    }

    if logging.directives.iter().any(|d| d.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "logging.directives".to_owned(),
            message: "directives must not be empty".to_owned(),
        });
    }

    Ok(())
}
