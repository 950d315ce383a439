// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reliability engine for the Paprika messaging backend.
//!
//! Ties the storage layer to the external collaborators: the idempotency
//! guard admits each provider event exactly once, the dispatch worker drives
//! the per-user conversation state machine under a keyed lock and a global
//! generation cap, and the outbox delivery manager drains pending replies
//! with bounded, backed-off retries.

pub mod backoff;
pub mod context;
pub mod delivery;
pub mod dispatch;
pub mod fsm;
pub mod generate;
pub mod guard;
pub mod shutdown;

pub use delivery::DeliveryManager;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use generate::TemplateGenerator;
pub use guard::IdempotencyGuard;
