// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox delivery manager.
//!
//! Periodically sweeps the outbox for due tasks and attempts delivery
//! through the channel adapter. Transient failures push the task's backoff
//! gate out and leave it pending; permanent failures and exhausted retry
//! budgets mark it failed. Every task ends `sent` or `failed` -- nothing is
//! silently dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use paprika_config::model::OutboxConfig;
use paprika_core::types::{OutboundTask, ReplyPayload};
use paprika_core::{DeliveryChannel, PaprikaError};
use paprika_storage::database::{format_timestamp, now_timestamp};
use paprika_storage::queries::outbox;
use paprika_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff;

/// Drains pending outbox tasks through a delivery channel.
pub struct DeliveryManager<C: DeliveryChannel> {
    db: Database,
    channel: Arc<C>,
    config: OutboxConfig,
}

impl<C: DeliveryChannel> DeliveryManager<C> {
    pub fn new(db: Database, channel: Arc<C>, config: OutboxConfig) -> Self {
        Self { db, channel, config }
    }

    /// Create a pending delivery task. Returns the task id.
    pub async fn enqueue(
        &self,
        chat_id: i64,
        payload: &ReplyPayload,
        cause_event_id: Option<i64>,
    ) -> Result<i64, PaprikaError> {
        outbox::enqueue(&self.db, chat_id, payload, cause_event_id).await
    }

    /// One delivery sweep over the due tasks. Returns how many were sent.
    ///
    /// The due scan already restricts each chat to its oldest pending task,
    /// so attempting the batch in order preserves per-chat reply ordering.
    pub async fn sweep(&self) -> Result<usize, PaprikaError> {
        let tasks = outbox::due(&self.db, &now_timestamp(), self.config.batch_size).await?;
        if tasks.is_empty() {
            return Ok(0);
        }

        let mut sent = 0;
        for task in tasks {
            if self.attempt(&task).await? {
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// One delivery attempt for one task, under the per-attempt timeout.
    async fn attempt(&self, task: &OutboundTask) -> Result<bool, PaprikaError> {
        let timeout = Duration::from_secs(self.config.attempt_timeout_secs);
        let attempt_number = task.attempts + 1;

        let result = tokio::time::timeout(timeout, self.channel.send(task.chat_id, &task.payload)).await;

        match result {
            Ok(Ok(())) => {
                outbox::mark_sent(&self.db, task.id).await?;
                info!(
                    task_id = task.id,
                    chat_id = task.chat_id,
                    attempt = attempt_number,
                    "outbound task sent"
                );
                Ok(true)
            }
            Ok(Err(send_err)) if !send_err.is_transient() => {
                outbox::mark_failed(&self.db, task.id, &send_err.message).await?;
                warn!(
                    task_id = task.id,
                    chat_id = task.chat_id,
                    error = %send_err.message,
                    "permanent delivery failure, task marked failed"
                );
                Ok(false)
            }
            Ok(Err(send_err)) => {
                self.record_transient(task, &send_err.message).await?;
                Ok(false)
            }
            Err(_elapsed) => {
                let message = format!("delivery attempt timed out after {timeout:?}");
                self.record_transient(task, &message).await?;
                Ok(false)
            }
        }
    }

    /// Bookkeeping for a retry-eligible failure: either schedule the next
    /// attempt behind the backoff gate, or exhaust the budget.
    async fn record_transient(&self, task: &OutboundTask, message: &str) -> Result<(), PaprikaError> {
        let attempts_now = task.attempts + 1;

        if attempts_now >= i64::from(self.config.max_attempts) {
            outbox::mark_failed(&self.db, task.id, message).await?;
            warn!(
                task_id = task.id,
                chat_id = task.chat_id,
                attempts = attempts_now,
                error = %message,
                "retry budget exhausted, task marked failed"
            );
            return Ok(());
        }

        let delay = backoff::jittered_delay_ms(
            attempts_now as u32,
            self.config.base_backoff_ms,
            self.config.max_backoff_ms,
        );
        let next_attempt_at =
            format_timestamp(Utc::now() + chrono::Duration::milliseconds(delay as i64));
        outbox::record_retry(&self.db, task.id, message, &next_attempt_at).await?;
        debug!(
            task_id = task.id,
            attempts = attempts_now,
            delay_ms = delay,
            error = %message,
            "transient delivery failure, retry scheduled"
        );
        Ok(())
    }

    /// Sweep on an interval until shutdown fires.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let interval = Duration::from_millis(self.config.sweep_interval_ms);
        info!(interval_ms = self.config.sweep_interval_ms, "outbox delivery loop started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {
                    match self.sweep().await {
                        Ok(sent) if sent > 0 => debug!(sent, "delivery sweep complete"),
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "delivery sweep failed"),
                    }
                }
            }
        }
        info!("outbox delivery loop stopped");
    }
}
