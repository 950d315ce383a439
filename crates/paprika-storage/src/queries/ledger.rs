// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotency ledger operations over `processed_events`.
//!
//! The PRIMARY KEY on `event_id` is the load-bearing invariant: a claim is a
//! single conditional insert, and a reclaim is a single conditional update
//! whose `claimed_at` refresh bounds takeover to exactly one successor.

use std::time::Duration;

use chrono::Utc;
use paprika_core::types::{ClaimOutcome, ClaimResolution};
use paprika_core::PaprikaError;
use rusqlite::params;

use crate::database::{format_timestamp, Database};
use crate::models::ProcessedEvent;

/// Attempt to claim `event_id` for exclusive processing by `worker_id`.
///
/// Outcomes:
/// - fresh identifier -> row inserted as `processing`, [`ClaimOutcome::Admitted`];
/// - identifier pre-registered as `received` -> promoted to `processing` by
///   the first worker to ask, [`ClaimOutcome::Admitted`];
/// - identifier already terminal (`completed`/`failed`) -> [`ClaimOutcome::Duplicate`];
/// - identifier `processing` with a claim older than `staleness` ->
///   ownership reassigned, [`ClaimOutcome::Reclaimed`]; the refreshed
///   `claimed_at` makes any concurrent reclaimer lose the conditional update;
/// - identifier `processing` with a fresh claim -> [`ClaimOutcome::Duplicate`].
pub async fn claim(
    db: &Database,
    event_id: i64,
    worker_id: &str,
    staleness: Duration,
) -> Result<ClaimOutcome, PaprikaError> {
    let worker_id = worker_id.to_string();
    let stale_cutoff = format_timestamp(
        Utc::now()
            - chrono::Duration::from_std(staleness)
                .map_err(|e| PaprikaError::Internal(format!("staleness out of range: {e}")))?,
    );

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO processed_events (event_id, status, worker_id)
                 VALUES (?1, 'processing', ?2)
                 ON CONFLICT (event_id) DO NOTHING",
                params![event_id, worker_id],
            )?;

            let outcome = if inserted == 1 {
                ClaimOutcome::Admitted
            } else {
                let status: String = tx.query_row(
                    "SELECT status FROM processed_events WHERE event_id = ?1",
                    params![event_id],
                    |row| row.get(0),
                )?;

                match status.as_str() {
                    "completed" | "failed" => ClaimOutcome::Duplicate,
                    "received" => {
                        // Pre-registered by the ingestion boundary; first
                        // worker to ask promotes it.
                        let promoted = tx.execute(
                            "UPDATE processed_events
                             SET status = 'processing', worker_id = ?2,
                                 claimed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                             WHERE event_id = ?1 AND status = 'received'",
                            params![event_id, worker_id],
                        )?;
                        if promoted == 1 {
                            ClaimOutcome::Admitted
                        } else {
                            ClaimOutcome::Duplicate
                        }
                    }
                    _ => {
                        let reclaimed = tx.execute(
                            "UPDATE processed_events
                             SET worker_id = ?2,
                                 claimed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                             WHERE event_id = ?1 AND status = 'processing'
                               AND claimed_at < ?3",
                            params![event_id, worker_id, stale_cutoff],
                        )?;
                        if reclaimed == 1 {
                            ClaimOutcome::Reclaimed
                        } else {
                            ClaimOutcome::Duplicate
                        }
                    }
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Register an identifier as `received` without claiming it.
///
/// Used by the ingestion boundary ahead of dispatch; a no-op if the
/// identifier is already present.
pub async fn record_received(
    db: &Database,
    event_id: i64,
    worker_id: &str,
) -> Result<(), PaprikaError> {
    let worker_id = worker_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO processed_events (event_id, status, worker_id)
                 VALUES (?1, 'received', ?2)
                 ON CONFLICT (event_id) DO NOTHING",
                params![event_id, worker_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record the terminal resolution of a claimed event.
///
/// The update is owner-checked: it only applies while the row is still
/// `processing` under `worker_id`. Zero rows affected means ownership was
/// lost to a reclaim (or the row is already terminal) -- a consistency error
/// the caller must not paper over by treating its side effects as committed.
pub async fn complete(
    db: &Database,
    event_id: i64,
    worker_id: &str,
    resolution: ClaimResolution,
) -> Result<(), PaprikaError> {
    let worker_id = worker_id.to_string();
    let status = resolution.as_str();

    let updated = db
        .connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE processed_events
                 SET status = ?3,
                     completed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE event_id = ?1 AND worker_id = ?2 AND status = 'processing'",
                params![event_id, worker_id, status],
            )?;
            Ok(updated)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if updated == 0 {
        return Err(PaprikaError::Internal(format!(
            "ledger consistency error: event {event_id} is no longer owned by this worker"
        )));
    }
    Ok(())
}

/// Fetch a ledger row by event identifier.
pub async fn get(db: &Database, event_id: i64) -> Result<Option<ProcessedEvent>, PaprikaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT event_id, status, worker_id, created_at, claimed_at, completed_at
                 FROM processed_events WHERE event_id = ?1",
            )?;
            let result = stmt.query_row(params![event_id], |row| {
                Ok(ProcessedEvent {
                    event_id: row.get(0)?,
                    status: row.get(1)?,
                    worker_id: row.get(2)?,
                    created_at: row.get(3)?,
                    claimed_at: row.get(4)?,
                    completed_at: row.get(5)?,
                })
            });
            match result {
                Ok(event) => Ok(Some(event)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count ledger rows grouped by status, for the operator surface.
pub async fn counts_by_status(db: &Database) -> Result<Vec<(String, i64)>, PaprikaError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM processed_events GROUP BY status ORDER BY status",
            )?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
