//! Local content cache for downloaded wallpapers.
//!
//! Files live in one flat directory named `<candidate id>.jpg`. The cache
//! size is computed on demand and trimmed oldest-first against a byte budget.

mod storage;

pub use storage::{budget_bytes, CacheEntry, CachedFile, ContentCache, EvictionSummary};

/// Failure to make a wallpaper available locally.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The request or body transfer failed.
    #[error("download failed: {0}")]
    Download(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("download returned HTTP {0}")]
    Status(u16),

    /// Writing, renaming or listing files failed.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The id cannot be used as a file name inside the cache directory.
    #[error("invalid cache id: {0:?}")]
    InvalidId(String),
}
