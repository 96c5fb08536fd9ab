//! Wallpaper history queries.
//!
//! The history table records every candidate that was cached or applied,
//! its local file path, and the last time it was applied. Scoring only ever
//! reads the `id -> applied_at` projection.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension};
use wallshift_common::{Error, Result, WallpaperCandidate};

use crate::models::HistoryEntry;

const ENTRY_COLUMNS: &str = "id, source, category, download_url, thumbnail_url, local_path, \
     applied_at, likes, width, height, photographer, attribution_url";

/// Parse a history entry from a database row.
///
/// Expects columns in [`ENTRY_COLUMNS`] order.
fn parse_entry_row(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.get(0)?,
        source: row.get(1)?,
        category: row.get(2)?,
        download_url: row.get(3)?,
        thumbnail_url: row.get(4)?,
        local_path: row.get(5)?,
        applied_at: row.get(6)?,
        likes: row.get(7)?,
        width: row.get(8)?,
        height: row.get(9)?,
        photographer: row.get(10)?,
        attribution_url: row.get(11)?,
    })
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e)
}

/// Source prefix of a candidate id (`unsplash_abc` -> `unsplash`).
fn source_prefix(id: &str) -> &str {
    id.split_once('_').map(|(prefix, _)| prefix).unwrap_or("")
}

/// Insert a candidate, or refresh its metadata if it is already known.
///
/// `applied_at` and `local_path` of an existing row are preserved.
pub fn upsert_candidate(conn: &Connection, candidate: &WallpaperCandidate) -> Result<()> {
    conn.execute(
        "INSERT INTO wallpaper_history
             (id, source, category, download_url, thumbnail_url, likes, width, height,
              photographer, attribution_url)
         VALUES (:id, :source, :category, :download_url, :thumbnail_url, :likes, :width,
                 :height, :photographer, :attribution_url)
         ON CONFLICT(id) DO UPDATE SET
             source = excluded.source,
             category = excluded.category,
             download_url = excluded.download_url,
             thumbnail_url = excluded.thumbnail_url,
             likes = excluded.likes,
             width = excluded.width,
             height = excluded.height,
             photographer = excluded.photographer,
             attribution_url = excluded.attribution_url",
        rusqlite::named_params! {
            ":id": &candidate.id,
            ":source": candidate.source.to_string(),
            ":category": &candidate.category,
            ":download_url": &candidate.download_url,
            ":thumbnail_url": &candidate.thumbnail_url,
            ":likes": candidate.likes,
            ":width": candidate.width,
            ":height": candidate.height,
            ":photographer": &candidate.photographer,
            ":attribution_url": &candidate.attribution_url,
        },
    )
    .map_err(db_err)?;

    Ok(())
}

/// Record the local cache path for a candidate.
///
/// Returns `Error::UnknownWallpaper` if the id has no history row.
pub fn update_local_path(conn: &Connection, id: &str, local_path: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE wallpaper_history SET local_path = :local_path WHERE id = :id",
            rusqlite::named_params! { ":id": id, ":local_path": local_path },
        )
        .map_err(db_err)?;

    if updated == 0 {
        return Err(Error::UnknownWallpaper(id.to_string()));
    }
    Ok(())
}

/// Mark `id` as applied at `timestamp_millis`.
///
/// Unknown ids get a stub row so the applied timestamp is never lost.
pub fn mark_applied(conn: &Connection, id: &str, timestamp_millis: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO wallpaper_history (id, source, applied_at)
         VALUES (:id, :source, :applied_at)
         ON CONFLICT(id) DO UPDATE SET applied_at = excluded.applied_at",
        rusqlite::named_params! {
            ":id": id,
            ":source": source_prefix(id),
            ":applied_at": timestamp_millis,
        },
    )
    .map_err(db_err)?;

    Ok(())
}

/// Ids of every wallpaper that has been applied at least once.
pub fn applied_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT id FROM wallpaper_history WHERE applied_at IS NOT NULL")
        .map_err(db_err)?;

    let ids = stmt
        .query_map([], |row| row.get(0))
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(db_err)?;

    Ok(ids)
}

/// `id -> applied_at` for every applied wallpaper.
pub fn applied_timestamps(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn
        .prepare("SELECT id, applied_at FROM wallpaper_history WHERE applied_at IS NOT NULL")
        .map_err(db_err)?;

    let map = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(db_err)?
        .collect::<std::result::Result<HashMap<_, _>, _>>()
        .map_err(db_err)?;

    Ok(map)
}

/// Get a single entry by id.
pub fn get_entry(conn: &Connection, id: &str) -> Result<Option<HistoryEntry>> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM wallpaper_history WHERE id = :id"),
        rusqlite::named_params! { ":id": id },
        parse_entry_row,
    )
    .optional()
    .map_err(db_err)
}

/// The most recently applied wallpaper.
pub fn current_wallpaper(conn: &Connection) -> Result<Option<HistoryEntry>> {
    Ok(recently_applied(conn, 1)?.into_iter().next())
}

/// The last `limit` applied wallpapers, most recent first.
pub fn recently_applied(conn: &Connection, limit: usize) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM wallpaper_history
             WHERE applied_at IS NOT NULL
             ORDER BY applied_at DESC
             LIMIT :limit"
        ))
        .map_err(db_err)?;

    let entries = stmt
        .query_map(
            rusqlite::named_params! { ":limit": limit as i64 },
            parse_entry_row,
        )
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;

    Ok(entries)
}

/// Delete the oldest applied entries so that at most `keep` applied rows remain.
///
/// Returns the number of rows deleted.
pub fn prune_oldest_applied(conn: &Connection, keep: usize) -> Result<usize> {
    conn.execute(
        "DELETE FROM wallpaper_history WHERE id IN (
             SELECT id FROM wallpaper_history
             WHERE applied_at IS NOT NULL
             ORDER BY applied_at DESC
             LIMIT -1 OFFSET :keep
         )",
        rusqlite::named_params! { ":keep": keep as i64 },
    )
    .map_err(db_err)
}

/// Total number of history rows.
pub fn count(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM wallpaper_history", [], |row| row.get(0))
        .map_err(db_err)
}

/// Delete all history rows, returning how many were removed.
pub fn clear_all(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM wallpaper_history", [])
        .map_err(db_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool};
    use wallshift_common::ImageSource;

    fn candidate(id: &str) -> WallpaperCandidate {
        WallpaperCandidate {
            id: id.to_string(),
            source: ImageSource::Unsplash,
            category: "nature".to_string(),
            width: 1080,
            height: 1920,
            download_url: format!("https://images.example/{id}.jpg"),
            thumbnail_url: format!("https://images.example/{id}_s.jpg"),
            likes: 12,
            photographer: "Ansel".to_string(),
            attribution_url: format!("https://example/{id}"),
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        upsert_candidate(&conn, &candidate("unsplash_a")).unwrap();
        let entry = get_entry(&conn, "unsplash_a").unwrap().unwrap();
        assert_eq!(entry.source, "unsplash");
        assert_eq!(entry.width, 1080);
        assert_eq!(entry.applied_at, None);
        assert_eq!(entry.to_candidate(), Some(candidate("unsplash_a")));

        assert!(get_entry(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_preserves_applied_and_path() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        upsert_candidate(&conn, &candidate("unsplash_a")).unwrap();
        update_local_path(&conn, "unsplash_a", "/cache/unsplash_a.jpg").unwrap();
        mark_applied(&conn, "unsplash_a", 1_000).unwrap();

        let mut refreshed = candidate("unsplash_a");
        refreshed.likes = 99;
        upsert_candidate(&conn, &refreshed).unwrap();

        let entry = get_entry(&conn, "unsplash_a").unwrap().unwrap();
        assert_eq!(entry.likes, 99);
        assert_eq!(entry.applied_at, Some(1_000));
        assert_eq!(entry.local_path.as_deref(), Some("/cache/unsplash_a.jpg"));
    }

    #[test]
    fn test_update_local_path_unknown_id() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let err = update_local_path(&conn, "nope", "/x.jpg").unwrap_err();
        assert!(matches!(err, Error::UnknownWallpaper(_)));
    }

    #[test]
    fn test_mark_applied_creates_stub_row() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        mark_applied(&conn, "pexels_77", 5_000).unwrap();
        let entry = get_entry(&conn, "pexels_77").unwrap().unwrap();
        assert_eq!(entry.source, "pexels");
        assert_eq!(entry.applied_at, Some(5_000));
        // Stub rows have no dimensions, so they cannot be rebuilt as candidates.
        assert!(entry.to_candidate().is_none());
    }

    #[test]
    fn test_applied_projections() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        upsert_candidate(&conn, &candidate("unsplash_seen")).unwrap();
        upsert_candidate(&conn, &candidate("unsplash_unseen")).unwrap();
        mark_applied(&conn, "unsplash_seen", 42).unwrap();

        assert_eq!(applied_ids(&conn).unwrap(), vec!["unsplash_seen".to_string()]);

        let timestamps = applied_timestamps(&conn).unwrap();
        assert_eq!(timestamps.len(), 1);
        assert_eq!(timestamps.get("unsplash_seen"), Some(&42));
    }

    #[test]
    fn test_recent_and_current() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        mark_applied(&conn, "unsplash_old", 100).unwrap();
        mark_applied(&conn, "unsplash_mid", 200).unwrap();
        mark_applied(&conn, "unsplash_new", 300).unwrap();

        let recent = recently_applied(&conn, 2).unwrap();
        let ids: Vec<_> = recent.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["unsplash_new", "unsplash_mid"]);

        let current = current_wallpaper(&conn).unwrap().unwrap();
        assert_eq!(current.id, "unsplash_new");
    }

    #[test]
    fn test_prune_oldest_applied() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        for (i, id) in ["a_1", "a_2", "a_3", "a_4"].iter().enumerate() {
            mark_applied(&conn, id, i as i64).unwrap();
        }
        upsert_candidate(&conn, &candidate("unsplash_never")).unwrap();

        let deleted = prune_oldest_applied(&conn, 2).unwrap();
        assert_eq!(deleted, 2);
        assert!(get_entry(&conn, "a_1").unwrap().is_none());
        assert!(get_entry(&conn, "a_2").unwrap().is_none());
        assert!(get_entry(&conn, "a_4").unwrap().is_some());
        // Never-applied rows are untouched.
        assert!(get_entry(&conn, "unsplash_never").unwrap().is_some());
        assert_eq!(count(&conn).unwrap(), 3);
    }

    #[test]
    fn test_clear_all() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        upsert_candidate(&conn, &candidate("unsplash_a")).unwrap();
        mark_applied(&conn, "unsplash_b", 1).unwrap();

        assert_eq!(clear_all(&conn).unwrap(), 2);
        assert_eq!(count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_source_prefix() {
        assert_eq!(source_prefix("wallhaven_8x1kxo"), "wallhaven");
        assert_eq!(source_prefix("noprefix"), "");
    }
}
