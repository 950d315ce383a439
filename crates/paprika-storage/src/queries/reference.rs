// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference-data operations over `ingredient_terms` and `content_tags`.
//!
//! Static/slowly-changing knowledge consumed read-only by the
//! reply-generation collaborator. Upserts exist for the external loader;
//! the core itself only reads.

use paprika_core::PaprikaError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{ContentTag, IngredientTerm};

/// Insert or refresh an ingredient term. Returns the row id.
pub async fn upsert_ingredient_term(
    db: &Database,
    term: &str,
    category: Option<&str>,
    aliases: &[String],
) -> Result<i64, PaprikaError> {
    let term = term.to_string();
    let category = category.map(String::from);
    let aliases_json = serde_json::to_string(aliases)
        .map_err(|e| PaprikaError::Internal(format!("aliases serialization: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO ingredient_terms (term, category, aliases)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (term) DO UPDATE SET
                     category = excluded.category,
                     aliases = excluded.aliases",
                params![term, category, aliases_json],
            )?;
            conn.query_row(
                "SELECT id FROM ingredient_terms WHERE term = ?1",
                params![term],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all ingredient terms, alphabetically.
pub async fn list_ingredient_terms(db: &Database) -> Result<Vec<IngredientTerm>, PaprikaError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, term, category, aliases FROM ingredient_terms ORDER BY term ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let aliases_raw: String = row.get(3)?;
                let aliases = serde_json::from_str(&aliases_raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(IngredientTerm {
                    id: row.get(0)?,
                    term: row.get(1)?,
                    category: row.get(2)?,
                    aliases,
                })
            })?;
            let mut terms = Vec::new();
            for row in rows {
                terms.push(row?);
            }
            Ok(terms)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or refresh a content tag. Returns the row id.
pub async fn upsert_content_tag(
    db: &Database,
    tag: &str,
    description: Option<&str>,
) -> Result<i64, PaprikaError> {
    let tag = tag.to_string();
    let description = description.map(String::from);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO content_tags (tag, description)
                 VALUES (?1, ?2)
                 ON CONFLICT (tag) DO UPDATE SET description = excluded.description",
                params![tag, description],
            )?;
            conn.query_row(
                "SELECT id FROM content_tags WHERE tag = ?1",
                params![tag],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all content tags, alphabetically.
pub async fn list_content_tags(db: &Database) -> Result<Vec<ContentTag>, PaprikaError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, tag, description FROM content_tags ORDER BY tag ASC")?;
            let rows = stmt.query_map([], |row| {
                Ok(ContentTag {
                    id: row.get(0)?,
                    tag: row.get(1)?,
                    description: row.get(2)?,
                })
            })?;
            let mut tags = Vec::new();
            for row in rows {
                tags.push(row?);
            }
            Ok(tags)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
