// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `paprika-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use paprika_core::types::{
    AuditRecord, ContentTag, ConversationState, IngredientTerm, OutboundTask, ProcessedEvent,
};
