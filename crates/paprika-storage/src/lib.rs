// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Paprika reliability core.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed query operations for the
//! idempotency ledger, the inbound audit log, conversation state, and the
//! outbound delivery outbox. All cross-worker coordination is expressed as
//! conditional writes executed on the single writer thread, never as
//! read-then-write at the call site.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
