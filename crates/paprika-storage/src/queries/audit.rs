// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit log operations over `inbound_audit`.
//!
//! Every inbound event is recorded here before the idempotency check and
//! regardless of its dedup outcome. Rows are never mutated or deleted.

use paprika_core::types::InboundEvent;
use paprika_core::PaprikaError;
use rusqlite::params;

use crate::database::Database;
use crate::models::AuditRecord;

/// Append one audit row for a received event. Returns the row id.
pub async fn insert(db: &Database, event: &InboundEvent) -> Result<i64, PaprikaError> {
    let event = event.clone();
    let payload = event.raw_payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO inbound_audit (event_id, chat_id, user_id, text, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![event.event_id, event.chat_id, event.user_id, event.text, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the audit rows recorded for an event identifier, oldest first.
///
/// Repeated provider deliveries of the same identifier produce one row each;
/// this is the replay/forensics view of those deliveries.
pub async fn list_for_event(
    db: &Database,
    event_id: i64,
) -> Result<Vec<AuditRecord>, PaprikaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, event_id, chat_id, user_id, text, payload, received_at
                 FROM inbound_audit WHERE event_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![event_id], |row| {
                let payload_raw: String = row.get(5)?;
                let payload = serde_json::from_str(&payload_raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(AuditRecord {
                    id: row.get(0)?,
                    event_id: row.get(1)?,
                    chat_id: row.get(2)?,
                    user_id: row.get(3)?,
                    text: row.get(4)?,
                    payload,
                    received_at: row.get(6)?,
                })
            })?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
