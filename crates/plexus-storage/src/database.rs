// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! `Database` wraps that one connection; query modules accept `&Database` and
//! go through `connection().call()`. Do NOT open additional connections for writes.

use std::path::Path;
use std::str::FromStr;

use plexus_core::PlexusError;
use tracing::debug;

/// Handle to the single-writer SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, PlexusError> {
        Self::open_with_options(path, true).await
    }

    /// Open the database, choosing the journal mode.
    ///
    /// The journal mode and migrations are applied on a short-lived blocking
    /// connection before the long-lived writer is opened.
    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, PlexusError> {
        let setup_path = path.to_string();
        tokio::task::spawn_blocking(move || prepare_database_file(&setup_path, wal_mode))
            .await
            .map_err(|e| PlexusError::Internal(format!("database setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PlexusError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn close(&self) -> Result<(), PlexusError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

fn prepare_database_file(path: &str, wal_mode: bool) -> Result<(), PlexusError> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| PlexusError::Storage {
            source: Box::new(e),
        })?;
    }

    let mut conn = rusqlite::Connection::open(path).map_err(storage_err)?;
    let mode = if wal_mode { "WAL" } else { "DELETE" };
    let applied: String = conn
        .query_row(&format!("PRAGMA journal_mode = {mode}"), [], |row| row.get(0))
        .map_err(storage_err)?;
    debug!(journal_mode = %applied, "journal mode set");

    crate::migrations::run_migrations(&mut conn)
}

fn storage_err(e: rusqlite::Error) -> PlexusError {
    PlexusError::Storage {
        source: Box::new(e),
    }
}

/// Convert a tokio-rusqlite error into PlexusError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PlexusError {
    PlexusError::Storage {
        source: Box::new(e),
    }
}

/// Whether `e` is a UNIQUE or PRIMARY KEY constraint violation.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Run an insert, reporting a uniqueness violation as `Ok(false)`.
pub(crate) fn insert_unique(result: rusqlite::Result<usize>) -> rusqlite::Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Map an `insert_unique` outcome onto the engine error taxonomy.
pub(crate) fn require_inserted(inserted: bool, entity: &'static str) -> Result<(), PlexusError> {
    if inserted {
        Ok(())
    } else {
        Err(PlexusError::AlreadyExists { entity })
    }
}

/// Read a TEXT column holding a `FromStr` enum.
pub(crate) fn text_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Read a nullable TEXT column holding a `FromStr` enum.
pub(crate) fn opt_text_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    })
    .transpose()
}
