// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification inbox persistence.

use plexus_core::PlexusError;
use plexus_core::types::{Notification, NotificationType, Page};
use rusqlite::params;

use crate::database::{Database, insert_unique, opt_text_enum, require_inserted, text_enum};

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, triggered_by, type, message, related_id, related_type, read, created_at";

const INSERT_NOTIFICATION: &str = "INSERT INTO notifications
    (id, recipient_id, triggered_by, type, message, related_id, related_type, read, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        recipient_id: row.get(1)?,
        triggered_by: row.get(2)?,
        kind: text_enum(row, 3)?,
        message: row.get(4)?,
        related_id: row.get(5)?,
        related_type: opt_text_enum(row, 6)?,
        read: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn execute_insert(conn: &rusqlite::Connection, n: &Notification) -> rusqlite::Result<usize> {
    conn.execute(
        INSERT_NOTIFICATION,
        params![
            n.id,
            n.recipient_id,
            n.triggered_by,
            n.kind.to_string(),
            n.message,
            n.related_id,
            n.related_type.map(|t| t.to_string()),
            n.read,
            n.created_at,
        ],
    )
}

/// Insert one notification.
///
/// A second LIKE for the same recipient, actor and item is `AlreadyExists`.
pub async fn insert_notification(db: &Database, notification: &Notification) -> Result<(), PlexusError> {
    let n = notification.clone();
    let inserted = db
        .connection()
        .call(move |conn| insert_unique(execute_insert(conn, &n)))
        .await
        .map_err(crate::database::map_tr_err)?;
    require_inserted(inserted, "notification")
}

/// Insert a batch in a single transaction; either every row lands or none.
pub async fn insert_notifications(db: &Database, batch: &[Notification]) -> Result<(), PlexusError> {
    if batch.is_empty() {
        return Ok(());
    }
    let batch = batch.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for n in &batch {
                execute_insert(&tx, n)?;
            }
            tx.commit()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether a notification with the same trigger tuple already exists.
///
/// Null `triggered_by` and `related_id` compare equal to null.
pub async fn notification_exists(
    db: &Database,
    recipient_id: &str,
    triggered_by: Option<&str>,
    kind: NotificationType,
    related_id: Option<&str>,
) -> Result<bool, PlexusError> {
    let recipient_id = recipient_id.to_string();
    let triggered_by = triggered_by.map(str::to_string);
    let related_id = related_id.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM notifications
                    WHERE recipient_id = ?1 AND triggered_by IS ?2 AND type = ?3 AND related_id IS ?4
                 )",
                params![recipient_id, triggered_by, kind.to_string(), related_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a notification by ID.
pub async fn get_notification(db: &Database, id: &str) -> Result<Option<Notification>, PlexusError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_notification) {
                Ok(n) => Ok(Some(n)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// A page of the recipient's inbox, newest first.
pub async fn list_notifications(
    db: &Database,
    recipient_id: &str,
    unread_only: bool,
    page: Page,
) -> Result<Vec<Notification>, PlexusError> {
    let recipient_id = recipient_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE recipient_id = ?1 AND (?2 = 0 OR read = 0)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?3 OFFSET ?4"
            ))?;
            let rows = stmt.query_map(
                params![recipient_id, unread_only, page.limit, page.offset],
                row_to_notification,
            )?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set `read` on one notification. Returns false if the id is unknown.
pub async fn mark_notification_read(db: &Database, id: &str) -> Result<bool, PlexusError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notifications SET read = 1 WHERE id = ?1",
                params![id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set `read` on every unread notification of the recipient.
pub async fn mark_all_notifications_read(db: &Database, recipient_id: &str) -> Result<usize, PlexusError> {
    let recipient_id = recipient_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
                params![recipient_id],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of unread notifications for the recipient.
pub async fn count_unread_notifications(db: &Database, recipient_id: &str) -> Result<i64, PlexusError> {
    let recipient_id = recipient_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read = 0",
                params![recipient_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{seed_users, setup_db};
    use plexus_core::types::{NotificationDraft, RelatedType};

    fn like_from(actor: &str, post: &str) -> NotificationDraft {
        NotificationDraft::new(NotificationType::Like, format!("{actor} liked your post"))
            .triggered_by(actor)
            .related(post, RelatedType::Post)
    }

    #[tokio::test]
    async fn insert_and_list_newest_first() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["r", "a"]).await;

        let older = like_from("a", "p1").addressed_to("r", "2026-01-01T00:00:00.000Z");
        let newer = like_from("a", "p2").addressed_to("r", "2026-01-01T00:00:05.000Z");
        insert_notification(&db, &older).await.unwrap();
        insert_notification(&db, &newer).await.unwrap();

        let page = list_notifications(&db, "r", false, Page::first(10)).await.unwrap();
        assert_eq!(page, vec![newer.clone(), older.clone()]);

        let second = list_notifications(&db, "r", false, Page::new(1, 1)).await.unwrap();
        assert_eq!(second[0].id, older.id);
    }

    #[tokio::test]
    async fn exists_treats_nulls_as_equal() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["r", "a"]).await;

        let system = NotificationDraft::new(NotificationType::Announcement, "notice")
            .addressed_to("r", "2026-01-01T00:00:00.000Z");
        insert_notification(&db, &system).await.unwrap();
        assert!(notification_exists(&db, "r", None, NotificationType::Announcement, None)
            .await
            .unwrap());

        let like = like_from("a", "p1").addressed_to("r", "2026-01-01T00:00:00.000Z");
        insert_notification(&db, &like).await.unwrap();
        assert!(notification_exists(&db, "r", Some("a"), NotificationType::Like, Some("p1"))
            .await
            .unwrap());
        assert!(!notification_exists(&db, "r", Some("a"), NotificationType::Like, Some("p2"))
            .await
            .unwrap());
        assert!(!notification_exists(&db, "r", None, NotificationType::Like, Some("p1"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn second_like_notification_is_rejected() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["r", "a", "b"]).await;

        let first = like_from("a", "p1").addressed_to("r", "2026-01-01T00:00:00.000Z");
        let again = like_from("a", "p1").addressed_to("r", "2026-01-01T00:00:01.000Z");
        insert_notification(&db, &first).await.unwrap();
        let err = insert_notification(&db, &again).await.unwrap_err();
        assert!(matches!(err, PlexusError::AlreadyExists { entity: "notification" }));

        // Other actors, other items and other kinds are unaffected.
        insert_notification(&db, &like_from("b", "p1").addressed_to("r", "2026-01-01T00:00:02.000Z"))
            .await
            .unwrap();
        insert_notification(&db, &like_from("a", "p2").addressed_to("r", "2026-01-01T00:00:03.000Z"))
            .await
            .unwrap();
        let comment = NotificationDraft::new(NotificationType::Comment, "a commented")
            .triggered_by("a")
            .related("p1", RelatedType::Post);
        insert_notification(&db, &comment.addressed_to("r", "2026-01-01T00:00:04.000Z"))
            .await
            .unwrap();
        insert_notification(&db, &comment.addressed_to("r", "2026-01-01T00:00:05.000Z"))
            .await
            .unwrap();
        assert_eq!(count_unread_notifications(&db, "r").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn batch_insert_is_atomic() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["r1", "r2"]).await;

        let draft = NotificationDraft::new(NotificationType::Event, "New event");
        let good = draft.addressed_to("r1", "2026-01-01T00:00:00.000Z");
        let dangling = draft.addressed_to("nobody", "2026-01-01T00:00:00.000Z");
        assert!(insert_notifications(&db, &[good.clone(), dangling]).await.is_err());
        assert_eq!(count_unread_notifications(&db, "r1").await.unwrap(), 0);

        let batch = vec![good, draft.addressed_to("r2", "2026-01-01T00:00:00.000Z")];
        insert_notifications(&db, &batch).await.unwrap();
        assert_eq!(count_unread_notifications(&db, "r1").await.unwrap(), 1);
        assert_eq!(count_unread_notifications(&db, "r2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mark_read_and_unread_filter() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["r", "a"]).await;
        let first = like_from("a", "p1").addressed_to("r", "2026-01-01T00:00:00.000Z");
        let second = like_from("a", "p2").addressed_to("r", "2026-01-01T00:00:01.000Z");
        insert_notifications(&db, &[first.clone(), second.clone()]).await.unwrap();

        assert!(mark_notification_read(&db, &first.id).await.unwrap());
        assert!(!mark_notification_read(&db, "unknown").await.unwrap());
        let unread = list_notifications(&db, "r", true, Page::first(10)).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, second.id);

        assert_eq!(mark_all_notifications_read(&db, "r").await.unwrap(), 1);
        assert_eq!(count_unread_notifications(&db, "r").await.unwrap(), 0);
        assert!(get_notification(&db, &second.id).await.unwrap().unwrap().read);
    }
}
