// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection records between user pairs.
//!
//! The unordered pair index rejects a second record for `{a, b}` regardless
//! of who asked first, so concurrent requests in both directions cannot both
//! land.

use plexus_core::PlexusError;
use plexus_core::types::{Connection, ConnectionStatus};
use rusqlite::params;

use crate::database::{Database, insert_unique, require_inserted, text_enum};

const CONNECTION_COLUMNS: &str =
    "id, requester_id, target_id, status, message, created_at, updated_at";

fn row_to_connection(row: &rusqlite::Row<'_>) -> rusqlite::Result<Connection> {
    Ok(Connection {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        target_id: row.get(2)?,
        status: text_enum(row, 3)?,
        message: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Insert a connection. A record for the same pair yields `AlreadyExists`.
pub async fn insert_connection(db: &Database, connection: &Connection) -> Result<(), PlexusError> {
    let c = connection.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            insert_unique(conn.execute(
                "INSERT INTO connections (id, requester_id, target_id, status, message, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    c.id,
                    c.requester_id,
                    c.target_id,
                    c.status.to_string(),
                    c.message,
                    c.created_at,
                    c.updated_at,
                ],
            ))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    require_inserted(inserted, "connection")
}

/// Get a connection by ID.
pub async fn get_connection(db: &Database, id: &str) -> Result<Option<Connection>, PlexusError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_connection) {
                Ok(c) => Ok(Some(c)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The record for the unordered pair `{a, b}`, in either direction.
pub async fn find_connection_between(
    db: &Database,
    a: &str,
    b: &str,
) -> Result<Option<Connection>, PlexusError> {
    let (a, b) = (a.to_string(), b.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONNECTION_COLUMNS} FROM connections
                 WHERE (requester_id = ?1 AND target_id = ?2)
                    OR (requester_id = ?2 AND target_id = ?1)
                 ORDER BY created_at ASC LIMIT 1"
            ))?;
            match stmt.query_row(params![a, b], row_to_connection) {
                Ok(c) => Ok(Some(c)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of records for the unordered pair `{a, b}`.
pub async fn count_connections_between(
    db: &Database,
    a: &str,
    b: &str,
) -> Result<i64, PlexusError> {
    let (a, b) = (a.to_string(), b.to_string());
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM connections
                 WHERE (requester_id = ?1 AND target_id = ?2)
                    OR (requester_id = ?2 AND target_id = ?1)",
                params![a, b],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Conditionally move a record from `from` to `to`.
///
/// Returns false when the record was not in `from`. Two concurrent accepts
/// both issue the update but only one sees a changed row.
pub async fn transition_connection(
    db: &Database,
    id: &str,
    from: ConnectionStatus,
    to: ConnectionStatus,
    updated_at: &str,
) -> Result<bool, PlexusError> {
    let id = id.to_string();
    let updated_at = updated_at.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE connections SET status = ?1, updated_at = ?2
                 WHERE id = ?3 AND status = ?4",
                params![to.to_string(), updated_at, id, from.to_string()],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The other party of every ACCEPTED record involving `user_id`.
pub async fn accepted_peer_ids(db: &Database, user_id: &str) -> Result<Vec<String>, PlexusError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT CASE WHEN requester_id = ?1 THEN target_id ELSE requester_id END
                 FROM connections
                 WHERE status = 'ACCEPTED' AND (requester_id = ?1 OR target_id = ?1)
                 ORDER BY updated_at DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// PENDING records where `user_id` is the target, newest first.
pub async fn pending_incoming(db: &Database, user_id: &str) -> Result<Vec<Connection>, PlexusError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONNECTION_COLUMNS} FROM connections
                 WHERE target_id = ?1 AND status = 'PENDING'
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![user_id], row_to_connection)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{seed_users, setup_db};

    fn make_connection(id: &str, requester: &str, target: &str, created_at: &str) -> Connection {
        Connection {
            id: id.to_string(),
            requester_id: requester.to_string(),
            target_id: target.to_string(),
            status: ConnectionStatus::Pending,
            message: Some("hi".to_string()),
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn reverse_direction_insert_is_rejected() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["a", "b"]).await;

        insert_connection(&db, &make_connection("c1", "a", "b", "2026-01-01T00:00:00.000Z"))
            .await
            .unwrap();
        let err = insert_connection(&db, &make_connection("c2", "b", "a", "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlexusError::AlreadyExists { .. }));
        assert_eq!(count_connections_between(&db, "b", "a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_between_is_direction_agnostic() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["a", "b", "c"]).await;
        insert_connection(&db, &make_connection("c1", "a", "b", "2026-01-01T00:00:00.000Z"))
            .await
            .unwrap();

        let found = find_connection_between(&db, "b", "a").await.unwrap().unwrap();
        assert_eq!(found.id, "c1");
        assert!(find_connection_between(&db, "a", "c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transition_only_applies_once() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["a", "b"]).await;
        insert_connection(&db, &make_connection("c1", "a", "b", "2026-01-01T00:00:00.000Z"))
            .await
            .unwrap();

        let now = "2026-01-02T00:00:00.000Z";
        assert!(
            transition_connection(&db, "c1", ConnectionStatus::Pending, ConnectionStatus::Accepted, now)
                .await
                .unwrap()
        );
        assert!(
            !transition_connection(&db, "c1", ConnectionStatus::Pending, ConnectionStatus::Rejected, now)
                .await
                .unwrap()
        );
        let c = get_connection(&db, "c1").await.unwrap().unwrap();
        assert_eq!(c.status, ConnectionStatus::Accepted);
        assert_eq!(c.updated_at, now);
    }

    #[tokio::test]
    async fn peers_and_pending_lists() {
        let (db, _dir) = setup_db().await;
        seed_users(&db, &["a", "b", "c", "d"]).await;
        insert_connection(&db, &make_connection("c1", "a", "b", "2026-01-01T00:00:00.000Z"))
            .await
            .unwrap();
        insert_connection(&db, &make_connection("c2", "c", "a", "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap();
        insert_connection(&db, &make_connection("c3", "d", "a", "2026-01-01T00:00:02.000Z"))
            .await
            .unwrap();
        let now = "2026-01-03T00:00:00.000Z";
        for id in ["c1", "c2"] {
            transition_connection(&db, id, ConnectionStatus::Pending, ConnectionStatus::Accepted, now)
                .await
                .unwrap();
        }

        let mut peers = accepted_peer_ids(&db, "a").await.unwrap();
        peers.sort();
        assert_eq!(peers, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(accepted_peer_ids(&db, "c").await.unwrap(), vec!["a".to_string()]);

        let pending = pending_incoming(&db, "a").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "c3");
        assert!(pending_incoming(&db, "d").await.unwrap().is_empty());
    }
}
