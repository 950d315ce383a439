// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes: the
//! idempotency claim and the version-checked state update rely on executing
//! as single atomic statements on this one writer.

use chrono::{DateTime, Utc};
use paprika_core::PaprikaError;
use tracing::debug;

/// PRAGMAs applied once at open, before migrations.
const OPEN_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
";

/// Handle to the single-writer SQLite database.
///
/// Cloning is cheap: all clones funnel through the same background writer
/// thread. Query modules accept `&Database` and call through
/// [`Database::connection`].
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path`, apply PRAGMAs,
    /// and run all pending migrations.
    pub async fn open(path: &str) -> Result<Self, PaprikaError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PaprikaError::Storage {
                source: Box::new(e),
            })?;
        }

        // Migrations need a plain blocking connection; run them to completion
        // before the async writer opens.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), PaprikaError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| PaprikaError::Storage {
                    source: Box::new(e),
                })?;
            conn.execute_batch(OPEN_PRAGMAS)
                .map_err(|e| PaprikaError::Storage {
                    source: Box::new(e),
                })?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| PaprikaError::Internal(format!("migration task panicked: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PaprikaError::Storage {
                source: Box::new(e),
            })?;

        // journal_mode persists in the database file; the per-connection
        // PRAGMAs must be reapplied on the writer connection.
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying single-writer connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and release the writer.
    pub async fn close(&self) -> Result<(), PaprikaError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the crate error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> PaprikaError {
    PaprikaError::Storage {
        source: Box::new(e),
    }
}

/// Format a timestamp in the same shape SQLite's
/// `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` produces, so Rust-computed
/// cutoffs compare lexicographically against column values.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Current time in the canonical column format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
