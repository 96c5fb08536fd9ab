//! Embedded schema scripts for the history database.
//!
//! The schema version is SQLite's `user_version` pragma: script `n` (1-based)
//! has run once `user_version >= n`. Scripts are only ever appended.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("reading schema version: {0}")]
    Version(#[from] rusqlite::Error),

    #[error("schema script {version} failed: {source}")]
    Script {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },
}

const SCRIPTS: &[&str] = &[include_str!("001_initial.sql")];

/// Schema version recorded in the database file.
pub fn schema_version(conn: &Connection) -> Result<u32, MigrationError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Apply every script newer than the recorded schema version.
///
/// Each script and its version bump commit together. Returns how many
/// scripts ran.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    let current = schema_version(conn)?;
    let mut applied = 0;

    for (version, sql) in (1u32..).zip(SCRIPTS) {
        if version <= current {
            continue;
        }
        let script = |source| MigrationError::Script { version, source };
        let tx = conn.unchecked_transaction().map_err(script)?;
        tx.execute_batch(sql).map_err(script)?;
        tx.pragma_update(None, "user_version", version).map_err(script)?;
        tx.commit().map_err(script)?;
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), SCRIPTS.len());
        conn
    }

    #[test]
    fn test_version_tracks_scripts() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        run_migrations(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap() as usize, SCRIPTS.len());
    }

    #[test]
    fn test_rerun_keeps_history() {
        let conn = migrated();
        conn.execute(
            "INSERT INTO wallpaper_history (id, source, applied_at) VALUES ('wallhaven_k7', 'wallhaven', 42)",
            [],
        )
        .unwrap();

        assert_eq!(run_migrations(&conn).unwrap(), 0);
        let applied_at: i64 = conn
            .query_row(
                "SELECT applied_at FROM wallpaper_history WHERE id = 'wallhaven_k7'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(applied_at, 42);
    }

    #[test]
    fn test_stub_row_gets_defaults() {
        // mark_applied can insert an id it has never seen cached
        let conn = migrated();
        conn.execute(
            "INSERT INTO wallpaper_history (id, source) VALUES ('pexels_9', 'pexels')",
            [],
        )
        .unwrap();

        let (category, likes, width, local_path, applied_at): (String, u32, u32, Option<String>, Option<i64>) = conn
            .query_row(
                "SELECT category, likes, width, local_path, applied_at FROM wallpaper_history",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .unwrap();
        assert_eq!((category.as_str(), likes, width), ("", 0, 0));
        assert!(local_path.is_none());
        assert!(applied_at.is_none());
    }

    #[test]
    fn test_applied_at_is_indexed() {
        let conn = migrated();
        let index: String = conn
            .query_row(
                "SELECT tbl_name FROM sqlite_master WHERE type = 'index' AND name = 'idx_wallpaper_history_applied_at'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index, "wallpaper_history");
    }
}
