// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transient/permanent classification of Telegram delivery errors.
//!
//! The outbox retries transient failures with backoff and terminates on
//! permanent ones. Anything unclassified defaults to transient: retrying is
//! the safer mistake, and the attempt cap bounds it.

use paprika_core::{SendError, SendErrorKind};
use teloxide::{ApiError, RequestError};

/// Classify a teloxide request error into the outbox's two buckets.
pub fn classify_send_error(err: RequestError) -> SendError {
    let kind = match &err {
        RequestError::Api(api) => classify_api_error(api),
        // The chat moved to a new id; this payload's recipient is gone.
        RequestError::MigrateToChatId(_) => SendErrorKind::Permanent,
        RequestError::RetryAfter(_)
        | RequestError::Network(_)
        | RequestError::Io(_)
        | RequestError::InvalidJson { .. } => SendErrorKind::Transient,
        _ => SendErrorKind::Transient,
    };

    SendError {
        kind,
        message: err.to_string(),
    }
}

/// Bot API errors that no amount of retrying will fix: the recipient is
/// unreachable or the payload itself is rejected.
fn classify_api_error(api: &ApiError) -> SendErrorKind {
    match api {
        ApiError::BotBlocked
        | ApiError::ChatNotFound
        | ApiError::UserDeactivated
        | ApiError::CantInitiateConversation
        | ApiError::CantTalkWithBots
        | ApiError::GroupDeactivated
        | ApiError::MessageTextIsEmpty => SendErrorKind::Permanent,
        ApiError::CantParseEntities(_) => SendErrorKind::Permanent,
        _ => SendErrorKind::Transient,
    }
}
