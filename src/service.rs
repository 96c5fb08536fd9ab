//! The wallpaper pipeline: fetch, rank, cache, record.
//!
//! [`WallpaperService`] is what schedulers and UI actions call. Applying the
//! image to the screen is left to the caller; the service hands back a local
//! file path and records the apply when told to.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use wallshift_common::{DeviceDescriptor, WallpaperCandidate};

use crate::cache::{budget_bytes, CacheError, ContentCache};
use crate::config::SettingsSource;
use crate::history::HistoryStore;
use crate::scoring::{ScoredCandidate, SmartSelector};
use crate::search::{FallbackController, FetchOutcome};

/// A ranked wallpaper that is ready on disk.
#[derive(Debug, Clone)]
pub struct PreparedWallpaper {
    pub candidate: WallpaperCandidate,
    pub path: PathBuf,
}

pub struct WallpaperService {
    fallback: FallbackController,
    selector: SmartSelector,
    cache: Arc<ContentCache>,
    history: Arc<dyn HistoryStore>,
    settings: Arc<dyn SettingsSource>,
    max_download_attempts: usize,
}

impl WallpaperService {
    pub fn new(
        fallback: FallbackController,
        selector: SmartSelector,
        cache: Arc<ContentCache>,
        history: Arc<dyn HistoryStore>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self {
            fallback,
            selector,
            cache,
            history,
            settings,
            max_download_attempts: 3,
        }
    }

    /// How many ranked candidates [`next_wallpaper`](Self::next_wallpaper)
    /// tries before giving up. At least one.
    pub fn with_max_download_attempts(mut self, attempts: usize) -> Self {
        self.max_download_attempts = attempts.max(1);
        self
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Candidates for `categories`, possibly empty.
    pub async fn fetch_wallpapers(&self, categories: &[String], page: u32) -> Vec<WallpaperCandidate> {
        self.fallback.fetch_candidates(categories, page).await
    }

    /// Like [`fetch_wallpapers`](Self::fetch_wallpapers) with tier details.
    pub async fn fetch_detailed(&self, categories: &[String], page: u32) -> FetchOutcome {
        self.fallback.fetch(categories, page).await
    }

    /// Best candidate for `device`; `None` only when `candidates` is empty.
    pub async fn select_best(
        &self,
        candidates: Vec<WallpaperCandidate>,
        device: &DeviceDescriptor,
    ) -> Option<WallpaperCandidate> {
        self.selector.select(candidates, device).await
    }

    /// All candidates with score breakdowns, best first.
    pub async fn rank(
        &self,
        candidates: Vec<WallpaperCandidate>,
        device: &DeviceDescriptor,
    ) -> Vec<ScoredCandidate> {
        self.selector.rank(candidates, device).await
    }

    /// Make `candidate` available locally and return its path.
    ///
    /// A fresh download triggers an eviction pass against the budget read
    /// from settings at that moment.
    pub async fn cache_and_get_path(&self, candidate: &WallpaperCandidate) -> Result<PathBuf, CacheError> {
        let cached = self
            .cache
            .ensure_cached(&candidate.id, &candidate.download_url)
            .await?;

        if cached.downloaded {
            let max_bytes = budget_bytes(self.settings.cache_budget_mb());
            let cache = Arc::clone(&self.cache);
            let evicted = tokio::task::spawn_blocking(move || cache.evict_to_budget(max_bytes)).await;
            if let Err(e) = evicted {
                warn!(error = %e, "Eviction task failed");
            }
        }

        if let Err(e) = self.history.record_cached(candidate, &cached.path).await {
            warn!(id = %candidate.id, error = %e, "Failed to record cached wallpaper");
        }

        Ok(cached.path)
    }

    /// One full run: fetch, rank, then cache the best candidate that
    /// downloads successfully. Does not mark anything as applied.
    pub async fn next_wallpaper(
        &self,
        categories: &[String],
        device: &DeviceDescriptor,
    ) -> Option<PreparedWallpaper> {
        let candidates = self.fetch_wallpapers(categories, 1).await;
        if candidates.is_empty() {
            info!("No wallpaper available");
            return None;
        }

        let ranked = self.rank(candidates, device).await;
        for scored in ranked.into_iter().take(self.max_download_attempts) {
            match self.cache_and_get_path(&scored.candidate).await {
                Ok(path) => {
                    info!(
                        id = %scored.candidate.id,
                        score = scored.score.total,
                        path = %path.display(),
                        "Prepared wallpaper"
                    );
                    return Some(PreparedWallpaper {
                        candidate: scored.candidate,
                        path,
                    });
                }
                Err(e) => {
                    warn!(id = %scored.candidate.id, error = %e, "Candidate unusable, trying next");
                }
            }
        }

        warn!(
            attempts = self.max_download_attempts,
            "Every attempted candidate failed to download"
        );
        None
    }

    /// Record that `id` was applied now.
    pub async fn mark_applied(&self, id: &str) -> wallshift_common::Result<()> {
        let now = self.selector.now_millis();
        self.history.mark_applied(id, now).await?;
        info!(id, applied_at = now, "Marked wallpaper applied");
        Ok(())
    }

    /// Wipe history and cached files. Returns `(history rows, files)` removed.
    pub async fn clear_history(&self) -> anyhow::Result<(usize, usize)> {
        let rows = self.history.clear().await?;
        let files = self.cache.clear()?;
        Ok((rows, files))
    }
}
