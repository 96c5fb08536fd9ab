//! Filesystem-level storage for cached wallpapers.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;
use wallshift_common::paths::{cache_file_name, is_partial_file, is_safe_cache_id, PARTIAL_SUFFIX};

use super::CacheError;

/// Convert a megabyte budget to bytes (`mb * 1024 * 1024`).
pub fn budget_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

/// A wallpaper available on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub path: PathBuf,
    /// `true` when this call fetched the file, `false` when it already existed.
    pub downloaded: bool,
}

/// One file in the cache directory.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// What an eviction pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvictionSummary {
    pub removed: usize,
    pub freed_bytes: u64,
    pub remaining_bytes: u64,
    /// Files that could not be deleted.
    pub failures: usize,
}

impl EvictionSummary {
    pub fn within(&self, max_bytes: u64) -> bool {
        self.remaining_bytes <= max_bytes
    }
}

/// Flat directory of downloaded wallpapers.
pub struct ContentCache {
    dir: PathBuf,
    client: reqwest::Client,
}

impl ContentCache {
    /// The directory is created lazily on the first download.
    pub fn new(dir: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            dir: dir.into(),
            client,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a candidate id is cached at.
    pub fn path_for(&self, id: &str) -> Result<PathBuf, CacheError> {
        if !is_safe_cache_id(id) {
            return Err(CacheError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(cache_file_name(id)))
    }

    /// Existing cached file for `id`, if any.
    pub fn cached_path(&self, id: &str) -> Option<PathBuf> {
        self.path_for(id).ok().filter(|path| path.is_file())
    }

    /// Return the cached file for `id`, downloading `download_url` first if
    /// it isn't cached yet.
    ///
    /// The body is streamed to a randomly named `.part` file which is renamed
    /// into place only after the whole body was written. The part file is
    /// deleted on any failure, and also when the returned future is dropped
    /// mid-download.
    pub async fn ensure_cached(&self, id: &str, download_url: &str) -> Result<CachedFile, CacheError> {
        let target = self.path_for(id)?;
        if tokio::fs::try_exists(&target).await? {
            debug!(id, path = %target.display(), "Cache hit");
            return Ok(CachedFile {
                path: target,
                downloaded: false,
            });
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let result = match self.download_part(id, download_url).await {
            Ok((part, bytes)) => part
                .persist(&target)
                .map(|()| bytes)
                .map_err(|e| CacheError::Io(e.error)),
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                info!(id, bytes, path = %target.display(), "Downloaded wallpaper");
                Ok(CachedFile {
                    path: target,
                    downloaded: true,
                })
            }
            Err(e) => {
                error!(id, url = download_url, error = %e, "Wallpaper download failed");
                Err(e)
            }
        }
    }

    /// Stream `url` into a new part file next to the cache entries.
    ///
    /// The returned [`TempPath`] removes the file when dropped unless it is
    /// persisted.
    async fn download_part(&self, id: &str, url: &str) -> Result<(TempPath, u64), CacheError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(CacheError::Download)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Status(status.as_u16()));
        }

        let prefix = format!("{}.", cache_file_name(id));
        let (file, part) = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(&self.dir)?
            .into_parts();

        let mut file = tokio::fs::File::from_std(file);
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(CacheError::Download)? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok((part, written))
    }

    /// Completed cache files, oldest first. Partial downloads are skipped.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && !is_partial_file(entry.path()))
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                Some(CacheEntry {
                    path: entry.into_path(),
                    size: metadata.len(),
                    modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                })
            })
            .collect();

        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        entries
    }

    /// Total size of completed cache files in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.entries().iter().map(|entry| entry.size).sum()
    }

    /// Delete oldest files until the cache fits in `max_bytes`.
    ///
    /// Files that can't be deleted are logged and skipped. Never fails; check
    /// the returned summary for the outcome.
    pub fn evict_to_budget(&self, max_bytes: u64) -> EvictionSummary {
        evict_entries(self.entries(), max_bytes)
    }

    /// Delete every file in the cache directory, including partial downloads.
    ///
    /// A file that can't be deleted is logged and skipped. Returns the number
    /// of files removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();

        let (removed, failed) = remove_each(files);
        if failed > 0 {
            warn!(removed, failed, dir = %self.dir.display(), "Cleared wallpaper cache with failures");
        } else {
            info!(removed, dir = %self.dir.display(), "Cleared wallpaper cache");
        }
        Ok(removed)
    }
}

/// Remove `entries` (oldest first) until their total fits in `max_bytes`.
fn evict_entries(entries: Vec<CacheEntry>, max_bytes: u64) -> EvictionSummary {
    let mut summary = EvictionSummary {
        remaining_bytes: entries.iter().map(|entry| entry.size).sum(),
        ..EvictionSummary::default()
    };

    if summary.remaining_bytes <= max_bytes {
        return summary;
    }

    for entry in entries {
        if summary.remaining_bytes <= max_bytes {
            break;
        }
        match std::fs::remove_file(&entry.path) {
            Ok(()) => {
                debug!(path = %entry.path.display(), size = entry.size, "Evicted");
                summary.removed += 1;
                summary.freed_bytes += entry.size;
                summary.remaining_bytes = summary.remaining_bytes.saturating_sub(entry.size);
            }
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "Failed to evict cache file");
                summary.failures += 1;
            }
        }
    }

    if summary.within(max_bytes) {
        info!(
            removed = summary.removed,
            freed_bytes = summary.freed_bytes,
            remaining_bytes = summary.remaining_bytes,
            "Cache trimmed to budget"
        );
    } else {
        warn!(
            failures = summary.failures,
            remaining_bytes = summary.remaining_bytes,
            max_bytes,
            "Cache still over budget after eviction"
        );
    }

    summary
}

/// Delete every path, carrying on past failures. Returns `(removed, failed)`.
fn remove_each(paths: impl IntoIterator<Item = PathBuf>) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;
    for path in paths {
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove cache file");
                failed += 1;
            }
        }
    }
    (removed, failed)
}
