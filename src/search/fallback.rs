//! Search broadening and unseen-first filtering.
//!
//! Tiers run strictly in order and stop at the first non-empty one:
//! the user's categories, then `"wallpaper"`, then `"popular wallpaper"`.
//! The surviving pool is then narrowed to never-applied candidates, unless
//! every candidate has been applied before, in which case the whole pool is
//! kept and freshness decay decides.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use wallshift_common::WallpaperCandidate;

use super::aggregator::CandidateSearch;
use crate::history::HistoryStore;

/// Broad query used when the categories return nothing.
pub const BROAD_QUERY: &str = "wallpaper";
/// Last-resort query.
pub const POPULAR_QUERY: &str = "popular wallpaper";

/// Which tier produced the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTier {
    Categories,
    Broad,
    Popular,
}

impl fmt::Display for FallbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Categories => write!(f, "categories"),
            Self::Broad => write!(f, "{BROAD_QUERY}"),
            Self::Popular => write!(f, "{POPULAR_QUERY}"),
        }
    }
}

/// Result of one fetch, with enough detail for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// `None` when every tier came back empty.
    pub tier: Option<FallbackTier>,
    pub candidates: Vec<WallpaperCandidate>,
    /// Candidates dropped because they were applied before.
    pub seen_filtered: usize,
}

/// Runs the fallback tiers over a [`CandidateSearch`].
pub struct FallbackController {
    search: Arc<dyn CandidateSearch>,
    history: Arc<dyn HistoryStore>,
    per_page: u32,
}

impl FallbackController {
    pub fn new(search: Arc<dyn CandidateSearch>, history: Arc<dyn HistoryStore>, per_page: u32) -> Self {
        Self {
            search,
            history,
            per_page,
        }
    }

    /// Candidates for `categories`, broadened and filtered. Empty means no
    /// wallpaper is available from any source.
    pub async fn fetch_candidates(&self, categories: &[String], page: u32) -> Vec<WallpaperCandidate> {
        self.fetch(categories, page).await.candidates
    }

    /// Like [`fetch_candidates`](Self::fetch_candidates), also reporting the
    /// tier that answered.
    pub async fn fetch(&self, categories: &[String], page: u32) -> FetchOutcome {
        let Some((tier, candidates)) = self.first_non_empty_tier(categories, page).await else {
            info!(?categories, page, "No candidates from any fallback tier");
            return FetchOutcome::default();
        };

        let total = candidates.len();
        let candidates = self.prefer_unseen(candidates).await;
        let seen_filtered = total - candidates.len();
        debug!(%tier, total, seen_filtered, "Fetched candidates");

        FetchOutcome {
            tier: Some(tier),
            candidates,
            seen_filtered,
        }
    }

    async fn first_non_empty_tier(
        &self,
        categories: &[String],
        page: u32,
    ) -> Option<(FallbackTier, Vec<WallpaperCandidate>)> {
        let found = self
            .search
            .search_categories(categories, page, self.per_page)
            .await;
        if !found.is_empty() {
            return Some((FallbackTier::Categories, found));
        }

        debug!(?categories, "Category search empty, trying broad query");
        let found = self.search.search(BROAD_QUERY, page, self.per_page).await;
        if !found.is_empty() {
            return Some((FallbackTier::Broad, found));
        }

        debug!("Broad query empty, trying popular query");
        let found = self.search.search(POPULAR_QUERY, page, self.per_page).await;
        if !found.is_empty() {
            return Some((FallbackTier::Popular, found));
        }

        None
    }

    async fn prefer_unseen(&self, candidates: Vec<WallpaperCandidate>) -> Vec<WallpaperCandidate> {
        let applied = match self.history.applied_ids().await {
            Ok(applied) => applied,
            Err(e) => {
                warn!(error = %e, "Failed to read history, keeping all candidates");
                return candidates;
            }
        };

        let (unseen, seen): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| !applied.contains(&c.id));

        if unseen.is_empty() {
            debug!(count = seen.len(), "Every candidate was applied before, keeping all");
            seen
        } else {
            unseen
        }
    }
}
