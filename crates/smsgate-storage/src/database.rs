// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, which
//! serializes writers within a process. Separate processes (gateway and
//! consumer) share the file through WAL and the busy timeout.

use std::path::Path;

use smsgate_core::SmsgateError;
use tracing::debug;

use crate::migrations::run_migrations;

/// How long a statement waits on another process's write lock.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Handle to the smsgate SQLite database.
///
/// Cloning the inner connection is cheap; every clone talks to the same
/// background thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and migrate it.
    pub async fn open(path: &str) -> Result<Self, SmsgateError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, SmsgateError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| SmsgateError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| SmsgateError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), SmsgateError> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
            ))
            .map_err(|e| SmsgateError::Storage {
                source: Box::new(e),
            })?;
            run_migrations(conn)
        })
        .await
        .map_err(|e| SmsgateError::Storage {
            source: Box::new(e),
        })?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), SmsgateError> {
        checkpoint(&self).await?;
        self.conn.close().await.map_err(|e| SmsgateError::Storage {
            source: Box::new(e),
        })?;
        debug!("database closed");
        Ok(())
    }
}

/// Fold pending WAL frames back into the main database file.
pub(crate) async fn checkpoint(db: &Database) -> Result<(), SmsgateError> {
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        })
        .await
        .map_err(map_tr_err)
}

/// Map a tokio-rusqlite error around a rusqlite error into a storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SmsgateError {
    SmsgateError::Storage {
        source: Box::new(e),
    }
}
