// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for config loading, env overrides, and diagnostics.

use paprika_config::{load_and_validate_str, ConfigError};
use serial_test::serial;

#[test]
fn empty_config_yields_defaults() {
    let config = load_and_validate_str("").expect("empty config should load");
    assert_eq!(config.agent.name, "paprika");
    assert_eq!(config.outbox.max_attempts, 5);
    assert_eq!(config.worker.claim_staleness_secs, 120);
    assert!(config.telegram.bot_token.is_none());
}

#[test]
fn toml_values_override_defaults() {
    let config = load_and_validate_str(
        r#"
[agent]
name = "paprika-staging"
log_level = "debug"

[outbox]
max_attempts = 3
base_backoff_ms = 250
"#,
    )
    .expect("config should load");

    assert_eq!(config.agent.name, "paprika-staging");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.outbox.max_attempts, 3);
    assert_eq!(config.outbox.base_backoff_ms, 250);
    // Untouched keys keep their defaults.
    assert_eq!(config.outbox.sweep_interval_ms, 15_000);
}

#[test]
fn unknown_key_produces_suggestion() {
    let result = load_and_validate_str(
        r#"
[outbox]
max_atempts = 3
"#,
    );

    let errors = result.expect_err("unknown key should fail");
    let found = errors.iter().any(|e| match e {
        ConfigError::UnknownKey { key, suggestion, .. } => {
            key == "max_atempts" && suggestion.as_deref() == Some("max_attempts")
        }
        _ => false,
    });
    assert!(found, "expected UnknownKey with suggestion, got {errors:?}");
}

#[test]
fn wrong_type_is_reported() {
    let result = load_and_validate_str(
        r#"
[outbox]
max_attempts = "five"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn invalid_policy_values_fail_validation() {
    let result = load_and_validate_str(
        r#"
[outbox]
max_attempts = 0
"#,
    );
    let errors = result.expect_err("zero attempts should fail validation");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_attempts"))));
}

#[test]
#[serial]
fn env_vars_override_file_values() {
    // SAFETY: test runs serially; no other thread reads the environment.
    unsafe {
        std::env::set_var("PAPRIKA_OUTBOX_MAX_ATTEMPTS", "7");
        std::env::set_var("PAPRIKA_TELEGRAM_BOT_TOKEN", "123:abc");
    }

    let config = paprika_config::load_config().expect("config should load");
    assert_eq!(config.outbox.max_attempts, 7);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));

    unsafe {
        std::env::remove_var("PAPRIKA_OUTBOX_MAX_ATTEMPTS");
        std::env::remove_var("PAPRIKA_TELEGRAM_BOT_TOKEN");
    }
}
