// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox operations over `outbound_tasks`.
//!
//! The due-task scan enforces per-chat ordering at the query level: for each
//! chat only the oldest pending task is ever eligible, so a later reply can
//! never be attempted (let alone sent) while an earlier one for the same chat
//! is still pending.

use paprika_core::types::ReplyPayload;
use paprika_core::PaprikaError;
use rusqlite::params;

use crate::database::Database;
use crate::models::OutboundTask;

fn row_to_task(row: &rusqlite::Row<'_>) -> Result<OutboundTask, rusqlite::Error> {
    let payload_raw: String = row.get(2)?;
    let payload: ReplyPayload = serde_json::from_str(&payload_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(OutboundTask {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        payload,
        status: row.get(3)?,
        attempts: row.get(4)?,
        next_attempt_at: row.get(5)?,
        last_attempt_at: row.get(6)?,
        last_error: row.get(7)?,
        cause_event_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const TASK_COLUMNS: &str = "id, chat_id, payload, status, attempts, next_attempt_at, \
                            last_attempt_at, last_error, cause_event_id, created_at";

/// Create a pending delivery task. Returns the task id.
pub async fn enqueue(
    db: &Database,
    chat_id: i64,
    payload: &ReplyPayload,
    cause_event_id: Option<i64>,
) -> Result<i64, PaprikaError> {
    let payload_json = serde_json::to_string(payload)
        .map_err(|e| PaprikaError::Internal(format!("payload serialization: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO outbound_tasks (chat_id, payload, cause_event_id)
                 VALUES (?1, ?2, ?3)",
                params![chat_id, payload_json, cause_event_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch tasks due for a delivery attempt, oldest chats first.
///
/// A task is due when it is `pending`, its backoff gate has passed, and it is
/// the head (lowest id) of its chat's pending queue.
pub async fn due(
    db: &Database,
    now: &str,
    limit: usize,
) -> Result<Vec<OutboundTask>, PaprikaError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM outbound_tasks t
                 WHERE t.status = 'pending'
                   AND t.next_attempt_at <= ?1
                   AND t.id = (SELECT MIN(o.id) FROM outbound_tasks o
                               WHERE o.chat_id = t.chat_id AND o.status = 'pending')
                 ORDER BY t.created_at ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![now, limit as i64], row_to_task)?;
            let mut tasks = Vec::new();
            for row in rows {
                tasks.push(row?);
            }
            Ok(tasks)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a delivered task as sent. Terminal.
pub async fn mark_sent(db: &Database, id: i64) -> Result<(), PaprikaError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE outbound_tasks
                 SET status = 'sent', attempts = attempts + 1,
                     last_attempt_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'pending'",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a failed attempt that stays retryable: the task remains `pending`
/// with its backoff gate pushed to `next_attempt_at`.
pub async fn record_retry(
    db: &Database,
    id: i64,
    error: &str,
    next_attempt_at: &str,
) -> Result<(), PaprikaError> {
    let error = error.to_string();
    let next_attempt_at = next_attempt_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE outbound_tasks
                 SET attempts = attempts + 1, last_error = ?2,
                     last_attempt_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     next_attempt_at = ?3
                 WHERE id = ?1 AND status = 'pending'",
                params![id, error, next_attempt_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a task as failed. Terminal; visible for operator remediation,
/// never retried automatically.
pub async fn mark_failed(db: &Database, id: i64, error: &str) -> Result<(), PaprikaError> {
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE outbound_tasks
                 SET status = 'failed', attempts = attempts + 1, last_error = ?2,
                     last_attempt_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'pending'",
                params![id, error],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a task by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<OutboundTask>, PaprikaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM outbound_tasks WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_task);
            match result {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count outbox rows grouped by status, for the operator surface.
pub async fn counts_by_status(db: &Database) -> Result<Vec<(String, i64)>, PaprikaError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM outbound_tasks GROUP BY status ORDER BY status",
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

/// List the most recent failed tasks for operator remediation.
pub async fn list_failed(db: &Database, limit: usize) -> Result<Vec<OutboundTask>, PaprikaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM outbound_tasks
                 WHERE status = 'failed'
                 ORDER BY last_attempt_at DESC
                 LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit as i64], row_to_task)?;
            let mut tasks = Vec::new();
            for row in rows {
                tasks.push(row?);
            }
            Ok(tasks)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::now_timestamp;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn enqueue_and_due_lifecycle() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, 100, &ReplyPayload::text("hello"), Some(42))
            .await
            .unwrap();
        assert!(id > 0);

        let tasks = due(&db, &now_timestamp(), 10).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, id);
        assert_eq!(tasks[0].status, "pending");
        assert_eq!(tasks[0].attempts, 0);
        assert_eq!(tasks[0].payload.text, "hello");
        assert_eq!(tasks[0].cause_event_id, Some(42));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn per_chat_ordering_only_head_is_due() {
        let (db, _dir) = setup_db().await;

        let first = enqueue(&db, 100, &ReplyPayload::text("one"), None).await.unwrap();
        let second = enqueue(&db, 100, &ReplyPayload::text("two"), None).await.unwrap();
        let other_chat = enqueue(&db, 999, &ReplyPayload::text("three"), None).await.unwrap();

        // Only the head of chat 100 plus the other chat's head are eligible.
        let tasks = due(&db, &now_timestamp(), 10).await.unwrap();
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert!(ids.contains(&first));
        assert!(ids.contains(&other_chat));
        assert!(!ids.contains(&second), "later task must wait for the head");

        // Once the head reaches a terminal state, the second becomes due.
        mark_sent(&db, first).await.unwrap();
        let tasks = due(&db, &now_timestamp(), 10).await.unwrap();
        assert!(tasks.iter().any(|t| t.id == second));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn backoff_gate_defers_retry() {
        let (db, _dir) = setup_db().await;
        let id = enqueue(&db, 100, &ReplyPayload::text("hi"), None).await.unwrap();

        record_retry(&db, id, "connection reset", "2999-01-01T00:00:00.000Z")
            .await
            .unwrap();

        let tasks = due(&db, &now_timestamp(), 10).await.unwrap();
        assert!(tasks.is_empty(), "task is gated until next_attempt_at");

        let task = get(&db, id).await.unwrap().unwrap();
        assert_eq!(task.status, "pending");
        assert_eq!(task.attempts, 1);
        assert_eq!(task.last_error.as_deref(), Some("connection reset"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_failed_is_terminal() {
        let (db, _dir) = setup_db().await;
        let id = enqueue(&db, 100, &ReplyPayload::text("hi"), None).await.unwrap();

        mark_failed(&db, id, "chat not found").await.unwrap();

        let task = get(&db, id).await.unwrap().unwrap();
        assert_eq!(task.status, "failed");
        assert_eq!(task.attempts, 1);

        // Terminal rows are not due and further updates are no-ops.
        assert!(due(&db, &now_timestamp(), 10).await.unwrap().is_empty());
        mark_sent(&db, id).await.unwrap();
        let task = get(&db, id).await.unwrap().unwrap();
        assert_eq!(task.status, "failed");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_head_unblocks_the_chat() {
        let (db, _dir) = setup_db().await;
        let first = enqueue(&db, 100, &ReplyPayload::text("one"), None).await.unwrap();
        let second = enqueue(&db, 100, &ReplyPayload::text("two"), None).await.unwrap();

        mark_failed(&db, first, "rejected").await.unwrap();

        let tasks = due(&db, &now_timestamp(), 10).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, second);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn counts_and_failed_listing() {
        let (db, _dir) = setup_db().await;
        let a = enqueue(&db, 1, &ReplyPayload::text("a"), None).await.unwrap();
        let b = enqueue(&db, 2, &ReplyPayload::text("b"), None).await.unwrap();
        let _c = enqueue(&db, 3, &ReplyPayload::text("c"), None).await.unwrap();

        mark_sent(&db, a).await.unwrap();
        mark_failed(&db, b, "boom").await.unwrap();

        let counts = counts_by_status(&db).await.unwrap();
        assert!(counts.contains(&("pending".to_string(), 1)));
        assert!(counts.contains(&("sent".to_string(), 1)));
        assert!(counts.contains(&("failed".to_string(), 1)));

        let failed = list_failed(&db, 10).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, b);
        assert_eq!(failed[0].last_error.as_deref(), Some("boom"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn markup_payload_roundtrips() {
        let (db, _dir) = setup_db().await;
        let payload = ReplyPayload {
            text: "pick one".to_string(),
            markup: Some(serde_json::json!({
                "inline_keyboard": [[{"text": "Breakfast", "callback_data": "breakfast"}]]
            })),
        };
        let id = enqueue(&db, 100, &payload, None).await.unwrap();

        let task = get(&db, id).await.unwrap().unwrap();
        assert_eq!(task.payload.text, "pick one");
        assert!(task.payload.markup.is_some());
        db.close().await.unwrap();
    }
}
