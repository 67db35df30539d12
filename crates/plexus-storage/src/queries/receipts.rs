// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read receipts for announcements and events.

use plexus_core::PlexusError;
use plexus_core::types::{ContentKind, ReadReceipt, SubjectType};
use rusqlite::params;

use crate::database::{Database, insert_unique, require_inserted};

/// Insert a receipt. A second receipt for the same triple yields `AlreadyExists`.
pub async fn insert_read_receipt(db: &Database, receipt: &ReadReceipt) -> Result<(), PlexusError> {
    let r = receipt.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            insert_unique(conn.execute(
                "INSERT INTO read_receipts (subject_id, subject_type, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![r.subject_id, r.subject_type.to_string(), r.user_id, r.created_at],
            ))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    require_inserted(inserted, "read receipt")
}

/// Whether `user_id` has read the subject.
pub async fn read_receipt_exists(
    db: &Database,
    subject_id: &str,
    subject_type: SubjectType,
    user_id: &str,
) -> Result<bool, PlexusError> {
    let subject_id = subject_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM read_receipts
                    WHERE subject_id = ?1 AND subject_type = ?2 AND user_id = ?3
                 )",
                params![subject_id, subject_type.to_string(), user_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of users who have read the subject.
pub async fn count_read_receipts(
    db: &Database,
    subject_id: &str,
    subject_type: SubjectType,
) -> Result<i64, PlexusError> {
    let subject_id = subject_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM read_receipts WHERE subject_id = ?1 AND subject_type = ?2",
                params![subject_id, subject_type.to_string()],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Published broadcasts of `kind` created at or after `since` that
/// `user_id` has no receipt for.
pub async fn count_unread_broadcasts(
    db: &Database,
    user_id: &str,
    kind: ContentKind,
    since: &str,
) -> Result<i64, PlexusError> {
    let user_id = user_id.to_string();
    let since = since.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM content_items c
                 WHERE c.kind = ?1 AND c.published = 1 AND c.created_at >= ?2
                   AND NOT EXISTS (
                       SELECT 1 FROM read_receipts r
                       WHERE r.subject_id = c.id AND r.subject_type = ?1 AND r.user_id = ?3
                   )",
                params![kind.to_string(), since, user_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
