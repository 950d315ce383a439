// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery channel trait for messaging provider integrations.

use async_trait::async_trait;

use crate::error::{PaprikaError, SendError};
use crate::types::{HealthStatus, ReplyPayload};

/// Adapter for delivering replies to an external messaging provider.
///
/// Implementations classify every failure into the transient/permanent
/// buckets of [`SendError`]; the outbox relies on that classification to
/// decide between retry-with-backoff and terminal failure. Errors the
/// adapter cannot classify must be reported as transient.
#[async_trait]
pub trait DeliveryChannel: Send + Sync + 'static {
    /// Returns the human-readable name of this channel.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Performs a health check and returns the channel's current status.
    async fn health_check(&self) -> Result<HealthStatus, PaprikaError>;

    /// Attempts to deliver a single reply to the given chat.
    async fn send(&self, chat_id: i64, payload: &ReplyPayload) -> Result<(), SendError>;
}
