// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Paprika reliability core.
//!
//! Two thin surfaces around the Telegram Bot API via teloxide:
//! - ingestion: a long-polling loop that maps raw updates into
//!   [`InboundEvent`]s for the dispatch worker (the raw `update_id` is the
//!   identifier the idempotency guard claims, so polling drives `getUpdates`
//!   directly rather than going through teloxide's dispatcher);
//! - delivery: [`DeliveryChannel`] with transient/permanent classification
//!   of provider errors for the outbox retry policy.

pub mod classify;
pub mod inbound;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use paprika_config::model::TelegramConfig;
use paprika_core::types::{HealthStatus, InboundEvent, ReplyPayload};
use paprika_core::{DeliveryChannel, PaprikaError, SendError};
use teloxide::prelude::*;
use teloxide::requests::Request;
use teloxide::types::{InlineKeyboardMarkup, Recipient};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Telegram channel: long-polling ingestion plus classified delivery.
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, PaprikaError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            PaprikaError::Config("telegram.bot_token is required for the Telegram channel".into())
        })?;

        if token.is_empty() {
            return Err(PaprikaError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        Ok(Self { bot, config })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Start the long-polling ingestion loop.
    ///
    /// Extractable updates are forwarded to `events`; the loop stops when the
    /// shutdown token fires or the receiving side is dropped. Poll failures
    /// are logged and retried after a short pause -- the idempotency guard
    /// downstream makes redelivery harmless.
    pub fn spawn_polling(
        self: Arc<Self>,
        events: mpsc::Sender<InboundEvent>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let channel = self;
        tokio::spawn(async move {
            let mut offset: i32 = 0;
            info!("telegram long polling started");
            loop {
                let request = channel
                    .bot
                    .get_updates()
                    .offset(offset)
                    .timeout(channel.config.poll_timeout_secs)
                    .send();

                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    result = request => match result {
                        Ok(updates) => {
                            for update in updates {
                                offset = offset.max(update.id.0 as i32 + 1);
                                match inbound::to_inbound_event(&update) {
                                    Some(event) => {
                                        if events.send(event).await.is_err() {
                                            warn!("inbound channel closed, stopping polling");
                                            return;
                                        }
                                    }
                                    None => debug!(
                                        update_id = update.id.0,
                                        "ignoring update with no extractable content"
                                    ),
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "getUpdates failed, retrying shortly");
                            tokio::time::sleep(Duration::from_secs(2)).await;
                        }
                    },
                }
            }
            info!("telegram long polling stopped");
        })
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, PaprikaError> {
        // Check that the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn send(&self, chat_id: i64, payload: &ReplyPayload) -> Result<(), SendError> {
        let recipient = Recipient::Id(ChatId(chat_id));
        let request = self.bot.send_message(recipient, &payload.text);

        let result = if let Some(markup) = &payload.markup {
            // A markup blob the provider would reject is a payload problem,
            // not a network problem: fail it permanently before the wire.
            let keyboard: InlineKeyboardMarkup = serde_json::from_value(markup.clone())
                .map_err(|e| SendError::permanent(format!("markup rejected: {e}")))?;
            request.reply_markup(keyboard).await
        } else {
            request.await
        };

        result.map(|_| ()).map_err(classify::classify_send_error)
    }
}
