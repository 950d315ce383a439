// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state operations over `conversation_state`.
//!
//! One row per user. Transitions are persisted with an optimistic version
//! check rather than a long-held lock: a conditional update that misses the
//! expected version affects zero rows, and the caller re-reads and
//! recomputes. The staleness-reclaim path in the ledger, not a lock timeout,
//! is the recovery mechanism for crashed writers.

use std::str::FromStr;

use paprika_core::types::{ConversationMode, MessageFragment};
use paprika_core::PaprikaError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ConversationState;

fn row_to_state(row: &rusqlite::Row<'_>) -> Result<ConversationState, rusqlite::Error> {
    let mode_raw: String = row.get(2)?;
    let mode = ConversationMode::from_str(&mode_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let summary_raw: String = row.get(4)?;
    let context_summary = serde_json::from_str(&summary_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let messages_raw: String = row.get(5)?;
    let recent_messages: Vec<MessageFragment> =
        serde_json::from_str(&messages_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ConversationState {
        user_id: row.get(0)?,
        chat_id: row.get(1)?,
        mode,
        step: row.get(3)?,
        context_summary,
        recent_messages,
        version: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const STATE_COLUMNS: &str =
    "user_id, chat_id, mode, step, context_summary, recent_messages, version, updated_at";

/// Load a user's conversation state.
pub async fn get(db: &Database, user_id: i64) -> Result<Option<ConversationState>, PaprikaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STATE_COLUMNS} FROM conversation_state WHERE user_id = ?1"
            ))?;
            let result = stmt.query_row(params![user_id], row_to_state);
            match result {
                Ok(state) => Ok(Some(state)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load a user's state, creating the initial `idle` row on first contact.
///
/// The insert is `ON CONFLICT DO NOTHING`, so two workers racing on a user's
/// first message both end up reading the same single row.
pub async fn get_or_create(
    db: &Database,
    user_id: i64,
    chat_id: i64,
) -> Result<ConversationState, PaprikaError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_state (user_id, chat_id)
                 VALUES (?1, ?2)
                 ON CONFLICT (user_id) DO NOTHING",
                params![user_id, chat_id],
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {STATE_COLUMNS} FROM conversation_state WHERE user_id = ?1"
            ))?;
            stmt.query_row(params![user_id], row_to_state)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist a transition with an optimistic version check.
///
/// Writes all mutable fields and bumps `version`, but only where the row
/// still carries `state.version`. Returns `false` on a version conflict
/// (another writer got there first); the caller re-reads and recomputes.
pub async fn update(db: &Database, state: &ConversationState) -> Result<bool, PaprikaError> {
    let summary = state.context_summary.to_string();
    let messages = serde_json::to_string(&state.recent_messages)
        .map_err(|e| PaprikaError::Internal(format!("recent_messages serialization: {e}")))?;
    let state = state.clone();

    let updated = db
        .connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE conversation_state
                 SET chat_id = ?2, mode = ?3, step = ?4,
                     context_summary = ?5, recent_messages = ?6,
                     version = version + 1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?1 AND version = ?7",
                params![
                    state.user_id,
                    state.chat_id,
                    state.mode.to_string(),
                    state.step,
                    summary,
                    messages,
                    state.version,
                ],
            )?;
            Ok(updated)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    Ok(updated == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn get_or_create_initializes_idle_state() {
        let (db, _dir) = setup_db().await;
        let state = get_or_create(&db, 200, 100).await.unwrap();
        assert_eq!(state.user_id, 200);
        assert_eq!(state.chat_id, 100);
        assert_eq!(state.mode, ConversationMode::Idle);
        assert_eq!(state.step, None);
        assert_eq!(state.version, 0);
        assert!(state.recent_messages.is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let (db, _dir) = setup_db().await;
        let first = get_or_create(&db, 200, 100).await.unwrap();
        let second = get_or_create(&db, 200, 100).await.unwrap();
        assert_eq!(first.version, second.version);

        // Exactly one live row per user.
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM conversation_state", [], |row| {
                    row.get(0)
                })
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_persists_transition_and_bumps_version() {
        let (db, _dir) = setup_db().await;
        let mut state = get_or_create(&db, 200, 100).await.unwrap();

        state.mode = ConversationMode::RecipeSearch;
        state.step = Some("showing_results".to_string());
        state.recent_messages.push(MessageFragment {
            role: "user".to_string(),
            content: "dinner ideas?".to_string(),
            ts: "2026-01-01T00:00:00.000Z".to_string(),
        });

        assert!(update(&db, &state).await.unwrap());

        let reloaded = get(&db, 200).await.unwrap().unwrap();
        assert_eq!(reloaded.mode, ConversationMode::RecipeSearch);
        assert_eq!(reloaded.step.as_deref(), Some("showing_results"));
        assert_eq!(reloaded.version, 1);
        assert_eq!(reloaded.recent_messages.len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_with_stale_version_is_rejected() {
        let (db, _dir) = setup_db().await;
        let state = get_or_create(&db, 200, 100).await.unwrap();

        // Two writers load the same version; only the first CAS lands.
        let mut first = state.clone();
        first.mode = ConversationMode::RecipeSearch;
        let mut second = state;
        second.mode = ConversationMode::FreeQa;

        assert!(update(&db, &first).await.unwrap());
        assert!(!update(&db, &second).await.unwrap());

        // The losing write left no trace.
        let reloaded = get(&db, 200).await.unwrap().unwrap();
        assert_eq!(reloaded.mode, ConversationMode::RecipeSearch);
        assert_eq!(reloaded.version, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cross_user_states_are_independent() {
        let (db, _dir) = setup_db().await;
        let mut a = get_or_create(&db, 1, 10).await.unwrap();
        let _b = get_or_create(&db, 2, 20).await.unwrap();

        a.mode = ConversationMode::Onboarding;
        assert!(update(&db, &a).await.unwrap());

        let b = get(&db, 2).await.unwrap().unwrap();
        assert_eq!(b.mode, ConversationMode::Idle);
        assert_eq!(b.version, 0);
        db.close().await.unwrap();
    }
}
