// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Paprika reliability core.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Paprika workspace: the inbound event and
//! reply shapes, the conversation state model, the idempotency ledger rows,
//! and the adapter traits for delivery channels and reply generation.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{PaprikaError, SendError, SendErrorKind};
pub use types::{
    ClaimOutcome, ClaimResolution, ConversationMode, ConversationState, GeneratedReply,
    HealthStatus, InboundEvent, MessageFragment, ReplyPayload,
};

// Re-export adapter traits at crate root.
pub use traits::{DeliveryChannel, ReplyGenerator};
