//! Bridge Controller configuration.
//!
//! Configuration is loaded from environment variables. Every value has a
//! default; only malformed values are rejected.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default controller mailbox capacity.
pub const DEFAULT_CONTROLLER_MAILBOX_CAPACITY: usize = 1000;

/// Default threshold after which a pending engine request is logged as slow.
pub const DEFAULT_SLOW_OPERATION_WARNING_MS: u64 = 2000;

/// Default controller instance ID prefix.
pub const DEFAULT_CONTROLLER_ID_PREFIX: &str = "bc";

/// Bridge Controller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this controller instance.
    pub controller_id: String,

    /// Controller mailbox capacity (default: 1000).
    pub controller_mailbox_capacity: usize,

    /// Engine requests pending longer than this log a warning (default: 2s).
    /// Requests are never cancelled.
    pub slow_operation_warning: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller_id: generate_controller_id(),
            controller_mailbox_capacity: DEFAULT_CONTROLLER_MAILBOX_CAPACITY,
            slow_operation_warning: Duration::from_millis(DEFAULT_SLOW_OPERATION_WARNING_MS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but malformed.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let controller_mailbox_capacity = parse_capacity(
            vars,
            "BC_CONTROLLER_MAILBOX_CAPACITY",
            DEFAULT_CONTROLLER_MAILBOX_CAPACITY,
        )?;

        let slow_operation_warning_ms = match vars.get("BC_SLOW_OPERATION_WARNING_MS") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "BC_SLOW_OPERATION_WARNING_MS must be milliseconds, got '{value}': {e}"
                ))
            })?,
            None => DEFAULT_SLOW_OPERATION_WARNING_MS,
        };

        let controller_id = vars
            .get("BC_CONTROLLER_ID")
            .cloned()
            .unwrap_or_else(generate_controller_id);

        Ok(Config {
            controller_id,
            controller_mailbox_capacity,
            slow_operation_warning: Duration::from_millis(slow_operation_warning_ms),
        })
    }
}

fn parse_capacity(
    vars: &HashMap<String, String>,
    name: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(value) = vars.get(name) else {
        return Ok(default);
    };

    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue(format!(
            "{name} must be greater than zero"
        ))),
        Ok(capacity) => Ok(capacity),
        Err(e) => Err(ConfigError::InvalidValue(format!(
            "{name} must be a positive integer, got '{value}': {e}"
        ))),
    }
}

fn generate_controller_id() -> String {
    let hostname = env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
    let uuid_suffix = uuid::Uuid::new_v4().to_string();
    let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
    format!("{DEFAULT_CONTROLLER_ID_PREFIX}-{hostname}-{short_suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load successfully");

        assert_eq!(
            config.controller_mailbox_capacity,
            DEFAULT_CONTROLLER_MAILBOX_CAPACITY
        );
        assert_eq!(
            config.slow_operation_warning,
            Duration::from_millis(DEFAULT_SLOW_OPERATION_WARNING_MS)
        );
        // Controller ID should be auto-generated
        assert!(config.controller_id.starts_with("bc-"));
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("BC_CONTROLLER_ID".to_string(), "bc-custom-001".to_string()),
            (
                "BC_CONTROLLER_MAILBOX_CAPACITY".to_string(),
                "64".to_string(),
            ),
            ("BC_SLOW_OPERATION_WARNING_MS".to_string(), "250".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.controller_id, "bc-custom-001");
        assert_eq!(config.controller_mailbox_capacity, 64);
        assert_eq!(config.slow_operation_warning, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let vars = HashMap::from([(
            "BC_CONTROLLER_MAILBOX_CAPACITY".to_string(),
            "0".to_string(),
        )]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("greater than zero"))
        );
    }

    #[test]
    fn test_unparsable_capacity_rejected() {
        let vars = HashMap::from([(
            "BC_CONTROLLER_MAILBOX_CAPACITY".to_string(),
            "lots".to_string(),
        )]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("BC_CONTROLLER_MAILBOX_CAPACITY"))
        );
    }

    #[test]
    fn test_unparsable_slow_warning_rejected() {
        let vars = HashMap::from([(
            "BC_SLOW_OPERATION_WARNING_MS".to_string(),
            "-5".to_string(),
        )]);

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_default_matches_empty_env() {
        let config = Config::default();
        assert_eq!(
            config.controller_mailbox_capacity,
            DEFAULT_CONTROLLER_MAILBOX_CAPACITY
        );
        assert!(config.controller_id.starts_with("bc-"));
    }
}
