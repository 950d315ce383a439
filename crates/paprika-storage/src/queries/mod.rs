// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query operations, one module per table group.

pub mod audit;
pub mod conversation;
pub mod ledger;
pub mod outbox;
pub mod reference;
