// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotency guard over the processed-events ledger.
//!
//! Thin, worker-scoped wrapper around the ledger queries: it carries the
//! worker identity and the staleness policy so call sites deal only in event
//! identifiers and outcomes.

use std::time::Duration;

use paprika_core::types::{ClaimOutcome, ClaimResolution};
use paprika_core::PaprikaError;
use paprika_storage::queries::ledger;
use paprika_storage::Database;
use tracing::info;

/// Admits each provider event identifier for processing exactly once.
///
/// The only way a second worker ever runs the same identifier is the
/// explicit staleness-reclaim path, bounded to a single successor.
#[derive(Clone)]
pub struct IdempotencyGuard {
    db: Database,
    worker_id: String,
    staleness: Duration,
}

impl IdempotencyGuard {
    pub fn new(db: Database, worker_id: impl Into<String>, staleness: Duration) -> Self {
        Self {
            db,
            worker_id: worker_id.into(),
            staleness,
        }
    }

    /// This worker's identity as recorded in the ledger.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Attempt to claim an event identifier for exclusive processing.
    pub async fn claim(&self, event_id: i64) -> Result<ClaimOutcome, PaprikaError> {
        let outcome = ledger::claim(&self.db, event_id, &self.worker_id, self.staleness).await?;
        if outcome == ClaimOutcome::Reclaimed {
            info!(event_id, "reclaimed stale claim from presumed-dead worker");
        }
        Ok(outcome)
    }

    /// Record the terminal resolution of an event this worker claimed.
    ///
    /// Errors if ownership was lost to a reclaim in the meantime; the caller
    /// must not treat its side effects as exactly-once in that case.
    pub async fn complete(
        &self,
        event_id: i64,
        resolution: ClaimResolution,
    ) -> Result<(), PaprikaError> {
        ledger::complete(&self.db, event_id, &self.worker_id, resolution).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn claim_and_complete_happy_path() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("g.db").to_str().unwrap())
            .await
            .unwrap();
        let guard = IdempotencyGuard::new(db.clone(), "w1", Duration::from_secs(120));

        assert_eq!(guard.claim(42).await.unwrap(), ClaimOutcome::Admitted);
        assert_eq!(guard.claim(42).await.unwrap(), ClaimOutcome::Duplicate);
        guard.complete(42, ClaimResolution::Completed).await.unwrap();
        assert_eq!(guard.claim(42).await.unwrap(), ClaimOutcome::Duplicate);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn distinct_workers_share_one_ledger() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("g.db").to_str().unwrap())
            .await
            .unwrap();
        let a = IdempotencyGuard::new(db.clone(), "worker-a", Duration::from_secs(120));
        let b = IdempotencyGuard::new(db.clone(), "worker-b", Duration::from_secs(120));

        assert_eq!(a.claim(7).await.unwrap(), ClaimOutcome::Admitted);
        assert_eq!(b.claim(7).await.unwrap(), ClaimOutcome::Duplicate);

        // The non-owner cannot complete the claim.
        assert!(b.complete(7, ClaimResolution::Completed).await.is_err());
        a.complete(7, ClaimResolution::Completed).await.unwrap();
        db.close().await.unwrap();
    }
}
