// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Posts, announcements, and events, plus the visibility-filtered feed.

use plexus_core::PlexusError;
use plexus_core::types::{ContentItem, FeedQuery};
use rusqlite::params;
use rusqlite::types::Value;

use crate::database::{Database, insert_unique, require_inserted, text_enum};

const CONTENT_COLUMNS: &str =
    "id, owner_id, kind, visibility, body, published, created_at, updated_at";

fn row_to_content(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContentItem> {
    Ok(ContentItem {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        kind: text_enum(row, 2)?,
        visibility: text_enum(row, 3)?,
        body: row.get(4)?,
        published: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert a content item.
pub async fn insert_content(db: &Database, item: &ContentItem) -> Result<(), PlexusError> {
    let item = item.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            insert_unique(conn.execute(
                "INSERT INTO content_items (id, owner_id, kind, visibility, body, published, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    item.id,
                    item.owner_id,
                    item.kind.to_string(),
                    item.visibility.to_string(),
                    item.body,
                    item.published,
                    item.created_at,
                    item.updated_at,
                ],
            ))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    require_inserted(inserted, "content item")
}

/// Get a content item by ID.
pub async fn get_content(db: &Database, id: &str) -> Result<Option<ContentItem>, PlexusError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONTENT_COLUMNS} FROM content_items WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_content) {
                Ok(item) => Ok(Some(item)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace the body of a content item.
pub async fn update_content_body(
    db: &Database,
    id: &str,
    body: &str,
    updated_at: &str,
) -> Result<(), PlexusError> {
    let owned_id = id.to_string();
    let body = body.to_string();
    let updated_at = updated_at.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE content_items SET body = ?1, updated_at = ?2 WHERE id = ?3",
                params![body, updated_at, owned_id],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if changed == 0 {
        return Err(PlexusError::not_found("content item", id));
    }
    Ok(())
}

/// Flip `published` on. Returns false if the item was already published.
pub async fn publish_content(
    db: &Database,
    id: &str,
    published_at: &str,
) -> Result<bool, PlexusError> {
    let id = id.to_string();
    let published_at = published_at.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE content_items SET published = 1, updated_at = ?1
                 WHERE id = ?2 AND published = 0",
                params![published_at, id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Published posts admitted for the viewer, newest first.
///
/// A post is admitted when it is PUBLIC, owned by the viewer, or
/// CONNECTIONS-scoped and owned by one of `peer_ids`. Anonymous viewers see
/// PUBLIC posts only.
pub async fn list_feed(db: &Database, query: &FeedQuery) -> Result<Vec<ContentItem>, PlexusError> {
    let (sql, values) = build_feed_query(query);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(values), row_to_content)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn build_feed_query(query: &FeedQuery) -> (String, Vec<Value>) {
    let mut values: Vec<Value> = Vec::new();
    let mut admitted = vec!["visibility = 'PUBLIC'".to_string()];

    if let Some(viewer) = &query.viewer_id {
        values.push(Value::Text(viewer.clone()));
        admitted.push(format!("owner_id = ?{}", values.len()));
    }

    // Peers travel as one JSON array so the bind count stays fixed.
    if !query.peer_ids.is_empty() {
        values.push(Value::Text(serde_json::json!(query.peer_ids).to_string()));
        admitted.push(format!(
            "(visibility = 'CONNECTIONS' AND owner_id IN (SELECT value FROM json_each(?{})))",
            values.len()
        ));
    }

    values.push(Value::Integer(i64::from(query.page.limit)));
    let limit_idx = values.len();
    values.push(Value::Integer(i64::from(query.page.offset)));
    let offset_idx = values.len();

    let sql = format!(
        "SELECT {CONTENT_COLUMNS} FROM content_items
         WHERE kind = 'POST' AND published = 1 AND ({})
         ORDER BY created_at DESC, id DESC
         LIMIT ?{limit_idx} OFFSET ?{offset_idx}",
        admitted.join(" OR ")
    );
    (sql, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{seed_users, setup_db};
    use plexus_core::types::{ContentKind, Page, Visibility};

    fn post(id: &str, owner: &str, visibility: Visibility, created_at: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            owner_id: owner.to_string(),
            kind: ContentKind::Post,
            visibility,
            body: format!("body of {id}"),
            published: true,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }

    fn feed_for(viewer: Option<&str>, peers: &[&str], limit: u32, offset: u32) -> FeedQuery {
        FeedQuery {
            viewer_id: viewer.map(str::to_string),
            peer_ids: peers.iter().map(|p| p.to_string()).collect(),
            page: Page::new(limit, offset),
        }
    }

    async fn seed_feed(db: &Database) {
        seed_users(db, &["viewer", "friend", "stranger"]).await;
        let rows = [
            post("p1", "stranger", Visibility::Public, "2026-01-01T00:00:01.000Z"),
            post("p2", "stranger", Visibility::Connections, "2026-01-01T00:00:02.000Z"),
            post("p3", "friend", Visibility::Connections, "2026-01-01T00:00:03.000Z"),
            post("p4", "viewer", Visibility::Connections, "2026-01-01T00:00:04.000Z"),
            post("p5", "friend", Visibility::Public, "2026-01-01T00:00:05.000Z"),
        ];
        for row in &rows {
            insert_content(db, row).await.unwrap();
        }
    }

    fn ids(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn feed_applies_visibility_predicate() {
        let (db, _dir) = setup_db().await;
        seed_feed(&db).await;

        let items = list_feed(&db, &feed_for(Some("viewer"), &["friend"], 20, 0))
            .await
            .unwrap();
        assert_eq!(ids(&items), vec!["p5", "p4", "p3", "p1"]);

        let lonely = list_feed(&db, &feed_for(Some("viewer"), &[], 20, 0))
            .await
            .unwrap();
        assert_eq!(ids(&lonely), vec!["p5", "p4", "p1"]);

        let anonymous = list_feed(&db, &feed_for(None, &[], 20, 0)).await.unwrap();
        assert_eq!(ids(&anonymous), vec!["p5", "p1"]);
    }

    #[tokio::test]
    async fn feed_handles_more_peers_than_sqlite_variables() {
        let (db, _dir) = setup_db().await;
        seed_feed(&db).await;

        let mut peers: Vec<String> = (0..40_000).map(|i| format!("peer-{i}")).collect();
        peers.push("friend".to_string());
        let query = FeedQuery {
            viewer_id: Some("viewer".to_string()),
            peer_ids: peers,
            page: Page::new(20, 0),
        };

        let items = list_feed(&db, &query).await.unwrap();
        assert_eq!(ids(&items), vec!["p5", "p4", "p3", "p1"]);
    }

    #[tokio::test]
    async fn feed_paginates_and_skips_broadcasts_and_drafts() {
        let (db, _dir) = setup_db().await;
        seed_feed(&db).await;
        let mut draft = post("p6", "viewer", Visibility::Public, "2026-01-01T00:00:06.000Z");
        draft.published = false;
        insert_content(&db, &draft).await.unwrap();
        let mut notice = post("a1", "viewer", Visibility::Public, "2026-01-01T00:00:07.000Z");
        notice.kind = ContentKind::Announcement;
        insert_content(&db, &notice).await.unwrap();

        let first = list_feed(&db, &feed_for(Some("viewer"), &["friend"], 2, 0))
            .await
            .unwrap();
        assert_eq!(ids(&first), vec!["p5", "p4"]);
        let second = list_feed(&db, &feed_for(Some("viewer"), &["friend"], 2, 2))
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["p3", "p1"]);
    }

    #[tokio::test]
    async fn publish_is_one_shot() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["admin"]).await;
        let mut event = post("e1", "admin", Visibility::Public, "2026-01-01T00:00:00.000Z");
        event.kind = ContentKind::Event;
        event.published = false;
        insert_content(&db, &event).await.unwrap();

        assert!(publish_content(&db, "e1", "2026-01-02T00:00:00.000Z").await.unwrap());
        assert!(!publish_content(&db, "e1", "2026-01-03T00:00:00.000Z").await.unwrap());
        assert!(get_content(&db, "e1").await.unwrap().unwrap().published);
    }

    #[tokio::test]
    async fn update_body_of_missing_item_is_not_found() {
        let (db, _dir) = setup_db().await;
        let err = update_content_body(&db, "ghost", "x", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap_err();
        assert!(matches!(err, PlexusError::NotFound { .. }));
    }

    #[tokio::test]
    async fn connections_scope_is_rejected_for_broadcasts() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["admin"]).await;
        let mut bad = post("a1", "admin", Visibility::Connections, "2026-01-01T00:00:00.000Z");
        bad.kind = ContentKind::Announcement;
        assert!(insert_content(&db, &bad).await.is_err());
    }
}
