// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./paprika.toml` > `~/.config/paprika/paprika.toml` > `/etc/paprika/paprika.toml`
//! with environment variable overrides via `PAPRIKA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PaprikaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/paprika/paprika.toml` (system-wide)
/// 3. `~/.config/paprika/paprika.toml` (user XDG config)
/// 4. `./paprika.toml` (local directory)
/// 5. `PAPRIKA_*` environment variables
pub fn load_config() -> Result<PaprikaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PaprikaConfig::default()))
        .merge(Toml::file("/etc/paprika/paprika.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("paprika/paprika.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("paprika.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a specific TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PaprikaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PaprikaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PaprikaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PaprikaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `PAPRIKA_TELEGRAM_BOT_TOKEN`
/// must map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("PAPRIKA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PAPRIKA_TELEGRAM_BOT_TOKEN -> "telegram_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("worker_", "worker.", 1)
            .replacen("outbox_", "outbox.", 1);
        mapped.into()
    })
}
