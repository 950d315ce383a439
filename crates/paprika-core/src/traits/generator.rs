// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply generation trait.
//!
//! The generator is a black box from the core's perspective: conversation
//! state plus inbound text in, reply plus proposed transition out. Failures
//! and timeouts are caught at the dispatch boundary and downgraded to a
//! fallback reply with the state held unchanged.

use async_trait::async_trait;

use crate::error::PaprikaError;
use crate::types::{ConversationState, GeneratedReply};

/// Adapter producing a reply and a proposed state transition for one
/// inbound message.
#[async_trait]
pub trait ReplyGenerator: Send + Sync + 'static {
    async fn generate(
        &self,
        state: &ConversationState,
        inbound_text: &str,
    ) -> Result<GeneratedReply, PaprikaError>;
}
