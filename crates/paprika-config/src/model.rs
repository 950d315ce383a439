// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Paprika reliability core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Paprika configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaprikaConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram provider integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dispatch worker settings (idempotency, state machine, generation).
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Outbox delivery settings (retries, backoff, sweep cadence).
    #[serde(default)]
    pub outbox: OutboxConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "paprika".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram provider integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables the Telegram channel.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Long-poll timeout passed to getUpdates, in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

fn default_poll_timeout_secs() -> u32 {
    25
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("paprika").join("paprika.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "paprika.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Dispatch worker configuration.
///
/// Governs the idempotency guard's staleness window, the reply-generation
/// concurrency cap, and the bounded conversation context.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Stable worker identifier. Defaults to a random UUID per process.
    #[serde(default)]
    pub worker_id: Option<String>,

    /// Age after which an in-flight claim is presumed abandoned and becomes
    /// eligible for a single reclaim by another worker.
    #[serde(default = "default_claim_staleness_secs")]
    pub claim_staleness_secs: u64,

    /// Per-call timeout for the reply-generation collaborator.
    #[serde(default = "default_generator_timeout_secs")]
    pub generator_timeout_secs: u64,

    /// Process-wide cap on concurrent reply-generation calls.
    #[serde(default = "default_max_concurrent_generations")]
    pub max_concurrent_generations: usize,

    /// Capacity of the rolling window of recent message fragments.
    #[serde(default = "default_window_messages")]
    pub window_messages: usize,

    /// Serialized-size cap for the structured context summary.
    #[serde(default = "default_summary_max_bytes")]
    pub summary_max_bytes: usize,

    /// Per-fragment byte cap for stored assistant replies.
    #[serde(default = "default_fragment_max_bytes")]
    pub fragment_max_bytes: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: None,
            claim_staleness_secs: default_claim_staleness_secs(),
            generator_timeout_secs: default_generator_timeout_secs(),
            max_concurrent_generations: default_max_concurrent_generations(),
            window_messages: default_window_messages(),
            summary_max_bytes: default_summary_max_bytes(),
            fragment_max_bytes: default_fragment_max_bytes(),
        }
    }
}

fn default_claim_staleness_secs() -> u64 {
    120
}

fn default_generator_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent_generations() -> usize {
    2
}

fn default_window_messages() -> usize {
    10
}

fn default_summary_max_bytes() -> usize {
    4096
}

fn default_fragment_max_bytes() -> usize {
    500
}

/// Outbox delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutboxConfig {
    /// Maximum delivery attempts before a task is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for the exponential backoff schedule.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Cap on the exponential backoff delay.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Per-attempt delivery timeout; expiry counts as a transient failure.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Interval between delivery sweeps.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Maximum tasks fetched per sweep.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            sweep_interval_ms: default_sweep_interval_ms(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_attempt_timeout_secs() -> u64 {
    15
}

fn default_sweep_interval_ms() -> u64 {
    15_000
}

fn default_batch_size() -> usize {
    10
}
