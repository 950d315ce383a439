// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and coherent retry policy knobs.

use crate::diagnostic::ConfigError;
use crate::model::PaprikaConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PaprikaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` is not one of: {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.worker.claim_staleness_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "worker.claim_staleness_secs must be at least 1".to_string(),
        });
    }

    if config.worker.max_concurrent_generations == 0 {
        errors.push(ConfigError::Validation {
            message: "worker.max_concurrent_generations must be at least 1".to_string(),
        });
    }

    // The window must hold at least one full user/assistant exchange.
    if config.worker.window_messages < 2 {
        errors.push(ConfigError::Validation {
            message: format!(
                "worker.window_messages must be at least 2, got {}",
                config.worker.window_messages
            ),
        });
    }

    if config.outbox.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "outbox.max_attempts must be at least 1".to_string(),
        });
    }

    if config.outbox.base_backoff_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "outbox.base_backoff_ms must be at least 1".to_string(),
        });
    }

    if config.outbox.max_backoff_ms < config.outbox.base_backoff_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "outbox.max_backoff_ms ({}) must be >= outbox.base_backoff_ms ({})",
                config.outbox.max_backoff_ms, config.outbox.base_backoff_ms
            ),
        });
    }

    if config.outbox.batch_size == 0 {
        errors.push(ConfigError::Validation {
            message: "outbox.batch_size must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = PaprikaConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = PaprikaConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_max_attempts_fails_validation() {
        let mut config = PaprikaConfig::default();
        config.outbox.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_attempts"))));
    }

    #[test]
    fn backoff_cap_below_base_fails_validation() {
        let mut config = PaprikaConfig::default();
        config.outbox.base_backoff_ms = 5_000;
        config.outbox.max_backoff_ms = 1_000;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_backoff_ms"))));
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = PaprikaConfig::default();
        config.agent.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))));
    }

    #[test]
    fn tiny_window_fails_validation() {
        let mut config = PaprikaConfig::default();
        config.worker.window_messages = 1;
        assert!(validate_config(&config).is_err());
    }
}
