// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Paprika reliability core.

use thiserror::Error;

/// The primary error type used across all Paprika crates.
#[derive(Debug, Error)]
pub enum PaprikaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    ///
    /// Storage failures on the ledger, state, or outbox tables are
    /// correctness-critical: the current operation must abort so the event
    /// stays reclaimable rather than being falsely marked completed.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reply generator errors (collaborator failure, malformed output).
    #[error("generator error: {message}")]
    Generator {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors, including ledger consistency violations.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classification of a delivery failure reported by a channel adapter.
///
/// Transient failures are retry-eligible (network blips, rate limits,
/// per-attempt timeouts); permanent failures are terminal (invalid recipient,
/// payload rejected). Unclassified provider errors default to transient so
/// the retry cap, not the classifier, bounds the damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendErrorKind {
    Transient,
    Permanent,
}

impl std::fmt::Display for SendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendErrorKind::Transient => write!(f, "transient"),
            SendErrorKind::Permanent => write!(f, "permanent"),
        }
    }
}

/// A failed delivery attempt, classified for the outbox retry policy.
#[derive(Debug, Error)]
#[error("{kind} delivery failure: {message}")]
pub struct SendError {
    pub kind: SendErrorKind,
    pub message: String,
}

impl SendError {
    /// A retry-eligible failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: SendErrorKind::Transient,
            message: message.into(),
        }
    }

    /// A terminal failure; the task moves straight to `failed`.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: SendErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == SendErrorKind::Transient
    }
}
