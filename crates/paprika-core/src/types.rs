// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Paprika workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An inbound chat event extracted from a provider update.
///
/// `event_id` is the provider's globally unique, monotonically assigned
/// update identifier and is the key claimed by the idempotency guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub event_id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub text: Option<String>,
    /// Full raw provider payload, kept for the audit trail.
    pub raw_payload: serde_json::Value,
}

/// A reply to deliver: text plus optional structured markup (e.g. an
/// inline keyboard), serialized into the outbox `payload` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<serde_json::Value>,
}

impl ReplyPayload {
    /// A plain-text reply with no markup.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }
}

/// Conversation mode: the coarse state of a user's dialogue.
///
/// `idle` is the initial mode for first contact. Transitions between modes
/// are validated against the FSM's transition table; an invalid proposal
/// holds the current mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    Idle,
    Onboarding,
    AwaitingClarification,
    RecipeSearch,
    FreeQa,
}

/// One entry in the bounded rolling window of recent message fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageFragment {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
    /// RFC 3339 timestamp of the exchange.
    pub ts: String,
}

/// FSM state for a user's active conversation. Exactly one live row per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_id: i64,
    pub chat_id: i64,
    pub mode: ConversationMode,
    pub step: Option<String>,
    /// Bounded structured context summary (serialized-size capped).
    pub context_summary: serde_json::Value,
    /// Bounded FIFO window of recent message fragments.
    pub recent_messages: Vec<MessageFragment>,
    /// Optimistic-concurrency counter; bumped on every persisted transition.
    pub version: i64,
    pub updated_at: String,
}

impl ConversationState {
    /// Fresh state for a user's first contact.
    pub fn new(user_id: i64, chat_id: i64) -> Self {
        Self {
            user_id,
            chat_id,
            mode: ConversationMode::Idle,
            step: None,
            context_summary: serde_json::Value::Object(Default::default()),
            recent_messages: Vec::new(),
            version: 0,
            updated_at: String::new(),
        }
    }
}

/// Outcome of attempting to claim an event identifier for processing.
///
/// `Duplicate` is a normal dedup outcome, not an error: the identifier is
/// already completed, failed, or actively held by another worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The identifier was admitted; this worker owns processing.
    Admitted,
    /// Already processed or actively in flight elsewhere; do not reprocess.
    Duplicate,
    /// A stale claim was taken over from a presumed-dead worker.
    Reclaimed,
}

/// Terminal resolution recorded against a claimed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResolution {
    Completed,
    Failed,
}

impl ClaimResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimResolution::Completed => "completed",
            ClaimResolution::Failed => "failed",
        }
    }
}

/// One row of the idempotency ledger.
#[derive(Debug, Clone)]
pub struct ProcessedEvent {
    pub event_id: i64,
    pub status: String,
    pub worker_id: String,
    pub created_at: String,
    pub claimed_at: String,
    pub completed_at: Option<String>,
}

/// One append-only audit row per received event (not deduplicated).
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: i64,
    pub event_id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub text: Option<String>,
    pub payload: serde_json::Value,
    pub received_at: String,
}

/// One outbox row per reply to deliver.
#[derive(Debug, Clone)]
pub struct OutboundTask {
    pub id: i64,
    pub chat_id: i64,
    pub payload: ReplyPayload,
    pub status: String,
    pub attempts: i64,
    /// Earliest time the next delivery attempt may run (backoff gate).
    pub next_attempt_at: String,
    pub last_attempt_at: Option<String>,
    pub last_error: Option<String>,
    /// Inbound event that triggered this reply, if any.
    pub cause_event_id: Option<i64>,
    pub created_at: String,
}

/// The reply-generation collaborator's output: a reply plus a proposed
/// next-mode/step and a context-summary delta. The FSM validates the
/// proposal; the generator does not mutate state itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedReply {
    pub reply_text: String,
    #[serde(default)]
    pub proposed_mode: Option<ConversationMode>,
    #[serde(default)]
    pub proposed_step: Option<String>,
    /// Keys merged into the bounded context summary.
    #[serde(default)]
    pub context_delta: serde_json::Value,
}

impl GeneratedReply {
    /// A reply that proposes no state change.
    pub fn text(reply_text: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
            proposed_mode: None,
            proposed_step: None,
            context_delta: serde_json::Value::Null,
        }
    }
}

/// Static reference row consumed read-only by the reply generator.
#[derive(Debug, Clone)]
pub struct IngredientTerm {
    pub id: i64,
    pub term: String,
    pub category: Option<String>,
    pub aliases: Vec<String>,
}

/// Static content tag consumed read-only by the reply generator.
#[derive(Debug, Clone)]
pub struct ContentTag {
    pub id: i64,
    pub tag: String,
    pub description: Option<String>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}
