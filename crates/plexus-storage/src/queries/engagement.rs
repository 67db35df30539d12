// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Comments, likes, mentions, and direct messages.

use plexus_core::PlexusError;
use plexus_core::types::{Comment, DirectMessage, Mention};
use rusqlite::params;

use crate::database::{Database, insert_unique, require_inserted};

// --- Comments ---

/// Insert a comment.
pub async fn insert_comment(db: &Database, comment: &Comment) -> Result<(), PlexusError> {
    let c = comment.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO comments (id, content_id, author_id, parent_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![c.id, c.content_id, c.author_id, c.parent_id, c.body, c.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a comment by ID.
pub async fn get_comment(db: &Database, id: &str) -> Result<Option<Comment>, PlexusError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content_id, author_id, parent_id, body, created_at
                 FROM comments WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    content_id: row.get(1)?,
                    author_id: row.get(2)?,
                    parent_id: row.get(3)?,
                    body: row.get(4)?,
                    created_at: row.get(5)?,
                })
            });
            match result {
                Ok(comment) => Ok(Some(comment)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

// --- Likes ---

/// Record a like. A second like by the same user yields `AlreadyExists`.
pub async fn insert_like(
    db: &Database,
    content_id: &str,
    user_id: &str,
    created_at: &str,
) -> Result<(), PlexusError> {
    let content_id = content_id.to_string();
    let user_id = user_id.to_string();
    let created_at = created_at.to_string();
    let inserted = db
        .connection()
        .call(move |conn| {
            insert_unique(conn.execute(
                "INSERT INTO likes (content_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![content_id, user_id, created_at],
            ))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    require_inserted(inserted, "like")
}

/// Remove a like. Returns false if there was none.
pub async fn delete_like(db: &Database, content_id: &str, user_id: &str) -> Result<bool, PlexusError> {
    let content_id = content_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM likes WHERE content_id = ?1 AND user_id = ?2",
                params![content_id, user_id],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of likes on a content item.
pub async fn count_likes(db: &Database, content_id: &str) -> Result<i64, PlexusError> {
    let content_id = content_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE content_id = ?1",
                params![content_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

// --- Mentions ---

/// Record a mention. The same user mentioned twice yields `AlreadyExists`.
pub async fn insert_mention(
    db: &Database,
    mention: &Mention,
    created_at: &str,
) -> Result<(), PlexusError> {
    let m = mention.clone();
    let created_at = created_at.to_string();
    let inserted = db
        .connection()
        .call(move |conn| {
            insert_unique(conn.execute(
                "INSERT INTO mentions (content_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![m.content_id, m.user_id, created_at],
            ))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    require_inserted(inserted, "mention")
}

/// Delete every mention of `content_id`.
pub async fn delete_mentions(db: &Database, content_id: &str) -> Result<usize, PlexusError> {
    let content_id = content_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM mentions WHERE content_id = ?1",
                params![content_id],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mentions recorded for `content_id`, in insertion order.
pub async fn list_mentions(db: &Database, content_id: &str) -> Result<Vec<Mention>, PlexusError> {
    let content_id = content_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT content_id, user_id FROM mentions
                 WHERE content_id = ?1 ORDER BY created_at ASC, user_id ASC",
            )?;
            let rows = stmt.query_map(params![content_id], |row| {
                Ok(Mention {
                    content_id: row.get(0)?,
                    user_id: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

// --- Direct messages ---

/// Store a direct message.
pub async fn insert_direct_message(db: &Database, message: &DirectMessage) -> Result<(), PlexusError> {
    let m = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO direct_messages (id, sender_id, recipient_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![m.id, m.sender_id, m.recipient_id, m.body, m.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
