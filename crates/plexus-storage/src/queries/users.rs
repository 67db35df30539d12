// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User lookups for mention matching and broadcast fan-out.

use plexus_core::PlexusError;
use plexus_core::types::User;
use rusqlite::params;

use crate::database::{Database, insert_unique, require_inserted, text_enum};

const USER_COLUMNS: &str = "id, display_name, email, institution_id, role, verified, created_at";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        display_name: row.get(1)?,
        email: row.get(2)?,
        institution_id: row.get(3)?,
        role: text_enum(row, 4)?,
        verified: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Insert a user. Duplicate id or email yields `AlreadyExists`.
pub async fn insert_user(db: &Database, user: &User) -> Result<(), PlexusError> {
    let user = user.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            insert_unique(conn.execute(
                "INSERT INTO users (id, display_name, email, institution_id, role, verified, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.id,
                    user.display_name,
                    user.email,
                    user.institution_id,
                    user.role.to_string(),
                    user.verified,
                    user.created_at,
                ],
            ))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    require_inserted(inserted, "user")
}

/// Get a user by ID.
pub async fn get_user(db: &Database, id: &str) -> Result<Option<User>, PlexusError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_user) {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Verified users whose display name, email, or institution id contains `token`.
///
/// Matching is a case-insensitive substring test under Unicode case folding,
/// so it is done here rather than with SQLite's ASCII-only `lower()`. A null
/// institution id never matches.
pub async fn find_verified_users_matching(
    db: &Database,
    token: &str,
) -> Result<Vec<User>, PlexusError> {
    let needle = token.to_lowercase();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE verified = 1
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let mut matched = Vec::new();
            for user in stmt.query_map([], row_to_user)? {
                let user = user?;
                if user_matches(&user, &needle) {
                    matched.push(user);
                }
            }
            Ok(matched)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn user_matches(user: &User, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);
    contains(&user.display_name)
        || contains(&user.email)
        || user.institution_id.as_deref().is_some_and(contains)
}

/// Ids of all verified users except `exclude_id`.
pub async fn list_verified_user_ids_except(
    db: &Database,
    exclude_id: &str,
) -> Result<Vec<String>, PlexusError> {
    let exclude_id = exclude_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn
                .prepare("SELECT id FROM users WHERE verified = 1 AND id <> ?1 ORDER BY id")?;
            let rows = stmt.query_map(params![exclude_id], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{make_user, setup_db};
    use plexus_core::types::Role;

    #[tokio::test]
    async fn insert_and_get_user() {
        let (db, _dir) = setup_db().await;
        let mut user = make_user("u1", "Ada Lovelace");
        user.role = Role::Admin;
        user.institution_id = Some("CS-2026-001".into());
        insert_user(&db, &user).await.unwrap();

        let fetched = get_user(&db, "u1").await.unwrap().unwrap();
        assert_eq!(fetched, user);
        assert!(get_user(&db, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_already_exists() {
        let (db, _dir) = setup_db().await;
        insert_user(&db, &make_user("u1", "One")).await.unwrap();
        let mut clash = make_user("u2", "Two");
        clash.email = "u1@campus.example".into();
        let err = insert_user(&db, &clash).await.unwrap_err();
        assert!(matches!(err, PlexusError::AlreadyExists { entity: "user" }));
    }

    #[tokio::test]
    async fn matching_is_case_insensitive_and_skips_unverified() {
        let (db, _dir) = setup_db().await;
        let mut ada = make_user("u1", "Ada Lovelace");
        ada.institution_id = Some("MATH-42".into());
        insert_user(&db, &ada).await.unwrap();
        let mut ghost = make_user("u2", "Adam Ghost");
        ghost.verified = false;
        insert_user(&db, &ghost).await.unwrap();
        insert_user(&db, &make_user("u3", "Grace Hopper")).await.unwrap();

        let hits = find_verified_users_matching(&db, "ADA").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "u1");

        let by_institution = find_verified_users_matching(&db, "math").await.unwrap();
        assert_eq!(by_institution.len(), 1);

        let by_email = find_verified_users_matching(&db, "u3@campus").await.unwrap();
        assert_eq!(by_email[0].id, "u3");
    }

    #[tokio::test]
    async fn matching_folds_non_ascii_case() {
        let (db, _dir) = setup_db().await;
        insert_user(&db, &make_user("adam", "Ádám Kovács")).await.unwrap();
        let mut student = make_user("jo", "Jo");
        student.institution_id = Some("ÉLTE-7".into());
        insert_user(&db, &student).await.unwrap();

        for token in ["Ádám", "ádám", "ÁDÁM", "kovács"] {
            let hits = find_verified_users_matching(&db, token).await.unwrap();
            assert_eq!(hits.len(), 1, "token {token}");
            assert_eq!(hits[0].id, "adam");
        }
        let by_institution = find_verified_users_matching(&db, "élte").await.unwrap();
        assert_eq!(by_institution[0].id, "jo");
        assert!(find_verified_users_matching(&db, "adam").await.unwrap().iter().all(|u| u.id == "adam"));
    }

    #[tokio::test]
    async fn verified_ids_exclude_author() {
        let (db, _dir) = setup_db().await;
        for id in ["a", "b", "c"] {
            insert_user(&db, &make_user(id, id)).await.unwrap();
        }
        let mut pending = make_user("d", "d");
        pending.verified = false;
        insert_user(&db, &pending).await.unwrap();

        let ids = list_verified_user_ids_except(&db, "b").await.unwrap();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }
}
