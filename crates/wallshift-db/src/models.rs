//! Rust models matching the database schema.

use serde::{Deserialize, Serialize};
use wallshift_common::{AppliedRecord, ImageSource, WallpaperCandidate};

/// One row of `wallpaper_history`.
///
/// `source` is kept as the raw stored string: rows created by a bare
/// `mark_applied` only know the id prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub source: String,
    pub category: String,
    pub download_url: String,
    pub thumbnail_url: String,
    pub local_path: Option<String>,
    pub applied_at: Option<i64>,
    pub likes: u32,
    pub width: u32,
    pub height: u32,
    pub photographer: String,
    pub attribution_url: String,
}

impl HistoryEntry {
    /// Parsed provider, if the stored source is a known one.
    pub fn image_source(&self) -> Option<ImageSource> {
        self.source.parse().ok()
    }

    /// Rebuild the candidate this row was recorded from.
    ///
    /// Returns `None` for stub rows without a known source or dimensions.
    pub fn to_candidate(&self) -> Option<WallpaperCandidate> {
        let source = self.image_source()?;
        let candidate = WallpaperCandidate {
            id: self.id.clone(),
            source,
            category: self.category.clone(),
            width: self.width,
            height: self.height,
            download_url: self.download_url.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            likes: self.likes,
            photographer: self.photographer.clone(),
            attribution_url: self.attribution_url.clone(),
        };
        candidate.is_scoreable().then_some(candidate)
    }

    /// History projection used by scoring.
    pub fn applied_record(&self) -> AppliedRecord {
        AppliedRecord {
            id: self.id.clone(),
            applied_at_epoch_millis: self.applied_at,
        }
    }
}

impl From<&WallpaperCandidate> for HistoryEntry {
    fn from(candidate: &WallpaperCandidate) -> Self {
        Self {
            id: candidate.id.clone(),
            source: candidate.source.to_string(),
            category: candidate.category.clone(),
            download_url: candidate.download_url.clone(),
            thumbnail_url: candidate.thumbnail_url.clone(),
            local_path: None,
            applied_at: None,
            likes: candidate.likes,
            width: candidate.width,
            height: candidate.height,
            photographer: candidate.photographer.clone(),
            attribution_url: candidate.attribution_url.clone(),
        }
    }
}
