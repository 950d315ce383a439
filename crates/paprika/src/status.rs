// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `paprika status` command implementation.
//!
//! Operator surface over the durable state: ledger and outbox counts by
//! status, plus the most recent failed deliveries. Failed tasks are never
//! retried automatically; this is where they become visible for remediation.

use paprika_config::PaprikaConfig;
use paprika_core::PaprikaError;
use paprika_storage::queries::{ledger, outbox};
use paprika_storage::Database;

/// Runs the `paprika status` command.
pub async fn run_status(config: PaprikaConfig) -> Result<(), PaprikaError> {
    let db = Database::open(&config.storage.database_path).await?;

    let event_counts = ledger::counts_by_status(&db).await?;
    let task_counts = outbox::counts_by_status(&db).await?;
    let failed = outbox::list_failed(&db, 10).await?;

    println!("processed events:");
    if event_counts.is_empty() {
        println!("  (none)");
    }
    for (status, count) in &event_counts {
        println!("  {status:<12} {count}");
    }

    println!("outbound tasks:");
    if task_counts.is_empty() {
        println!("  (none)");
    }
    for (status, count) in &task_counts {
        println!("  {status:<12} {count}");
    }

    if !failed.is_empty() {
        println!("recent failed deliveries (not retried automatically):");
        for task in &failed {
            println!(
                "  task {} chat {} attempts {} last error: {}",
                task.id,
                task.chat_id,
                task.attempts,
                task.last_error.as_deref().unwrap_or("-")
            );
        }
    }

    db.close().await?;
    Ok(())
}
