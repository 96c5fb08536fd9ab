//! Applied-wallpaper history consulted by the fallback controller and scorer.
//!
//! [`HistoryStore`] is the narrow interface the pipeline needs. The SQLite
//! implementation also exposes the wider query surface used by the CLI.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use wallshift_common::{Result, WallpaperCandidate};
use wallshift_db::models::HistoryEntry;
use wallshift_db::pool::{get_conn, DbPool};
use wallshift_db::queries::history;

/// Read/write access to the applied history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Ids that have been applied at least once.
    async fn applied_ids(&self) -> Result<HashSet<String>>;

    /// `id -> last applied epoch millis` for every applied id.
    async fn applied_timestamps(&self) -> Result<HashMap<String, i64>>;

    /// Record that `id` was applied at `timestamp_millis`.
    async fn mark_applied(&self, id: &str, timestamp_millis: i64) -> Result<()>;

    /// Remember a candidate and where it was cached. Stores without metadata
    /// support ignore this.
    async fn record_cached(&self, _candidate: &WallpaperCandidate, _path: &Path) -> Result<()> {
        Ok(())
    }

    /// Forget everything.
    async fn clear(&self) -> Result<usize>;
}

/// History persisted in the SQLite database.
#[derive(Clone)]
pub struct SqliteHistory {
    pool: DbPool,
    keep: usize,
}

impl SqliteHistory {
    /// `keep` bounds how many applied rows survive pruning after each apply.
    pub fn new(pool: DbPool, keep: usize) -> Self {
        Self { pool, keep }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn current_wallpaper(&self) -> Result<Option<HistoryEntry>> {
        let conn = get_conn(&self.pool)?;
        history::current_wallpaper(&conn)
    }

    pub fn recently_applied(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = get_conn(&self.pool)?;
        history::recently_applied(&conn, limit)
    }

    pub fn get_entry(&self, id: &str) -> Result<Option<HistoryEntry>> {
        let conn = get_conn(&self.pool)?;
        history::get_entry(&conn, id)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = get_conn(&self.pool)?;
        history::count(&conn)
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn applied_ids(&self) -> Result<HashSet<String>> {
        let conn = get_conn(&self.pool)?;
        Ok(history::applied_ids(&conn)?.into_iter().collect())
    }

    async fn applied_timestamps(&self) -> Result<HashMap<String, i64>> {
        let conn = get_conn(&self.pool)?;
        history::applied_timestamps(&conn)
    }

    async fn mark_applied(&self, id: &str, timestamp_millis: i64) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        history::mark_applied(&conn, id, timestamp_millis)?;
        let pruned = history::prune_oldest_applied(&conn, self.keep)?;
        if pruned > 0 {
            tracing::debug!(pruned, keep = self.keep, "Pruned old history entries");
        }
        Ok(())
    }

    async fn record_cached(&self, candidate: &WallpaperCandidate, path: &Path) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        history::upsert_candidate(&conn, candidate)?;
        history::update_local_path(&conn, &candidate.id, &path.to_string_lossy())
    }

    async fn clear(&self) -> Result<usize> {
        let conn = get_conn(&self.pool)?;
        history::clear_all(&conn)
    }
}

/// In-process history, lost on drop.
#[derive(Default)]
pub struct MemoryHistory {
    applied: Mutex<HashMap<String, i64>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated history.
    pub fn with_applied<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let applied = entries.into_iter().map(|(id, ts)| (id.into(), ts)).collect();
        Self {
            applied: Mutex::new(applied),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn applied_ids(&self) -> Result<HashSet<String>> {
        Ok(self.applied.lock().keys().cloned().collect())
    }

    async fn applied_timestamps(&self) -> Result<HashMap<String, i64>> {
        Ok(self.applied.lock().clone())
    }

    async fn mark_applied(&self, id: &str, timestamp_millis: i64) -> Result<()> {
        self.applied.lock().insert(id.to_string(), timestamp_millis);
        Ok(())
    }

    async fn clear(&self) -> Result<usize> {
        let mut applied = self.applied.lock();
        let removed = applied.len();
        applied.clear();
        Ok(removed)
    }
}
