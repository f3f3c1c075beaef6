//! SQLite database layer

use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS user_data (
    user_id         TEXT PRIMARY KEY,
    user_tags       TEXT NOT NULL DEFAULT '[]',
    saved_questions TEXT NOT NULL DEFAULT '[]',
    search_history  TEXT NOT NULL DEFAULT '[]'
);";

/// SQLite database wrapper for user profiles
pub struct Database {
    conn: Connection,
    schema_version: u32,
}

impl Database {
    /// Open database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_pragmas(&conn)?;
        let schema_version = Self::migrate(&conn)?;
        debug!(path = %path.display(), schema_version, "profile database opened");

        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let schema_version = Self::migrate(&conn)?;
        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// Get a reference to the connection
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Current schema version after migrations.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn migrate(conn: &Connection) -> Result<u32> {
        let current: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if current < 1 {
            conn.execute_batch(SCHEMA_V1)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(SCHEMA_VERSION.max(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_creation_and_schema_version() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/profiles.db");
        let db = Database::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(db.schema_version(), SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_keeps_version() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("profiles.db");
        drop(Database::open(&db_path).unwrap());
        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.schema_version(), SCHEMA_VERSION);
    }

    #[test]
    fn test_wal_mode_enabled() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).unwrap();
        let mode: String = db
            .conn()
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_user_data_table_created() {
        let db = Database::open_in_memory().unwrap();
        let exists: i32 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='user_data'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1);
    }
}
