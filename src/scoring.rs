//! Candidate scoring and best-wallpaper selection.
//!
//! Every candidate gets five factor scores in `[0, 1]` which are combined into
//! a weighted total:
//!
//! | factor     | weight | meaning                                         |
//! |------------|--------|-------------------------------------------------|
//! | resolution | 0.25   | image covers the screen in both dimensions      |
//! | aspect     | 0.25   | height/width ratio close to the device's        |
//! | popularity | 0.15   | likes relative to the best-liked candidate      |
//! | freshness  | 0.20   | 1.0 if never applied, else recovers to 0.8      |
//! | quality    | 0.15   | pixel surplus up to twice the device's          |
//!
//! Ranking is pure: given the same candidates, device, history snapshot and
//! clock it always produces the same order. Ties keep input order.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use wallshift_common::{DeviceDescriptor, WallpaperCandidate};

use crate::history::HistoryStore;

pub const RESOLUTION_WEIGHT: f64 = 0.25;
pub const ASPECT_WEIGHT: f64 = 0.25;
pub const POPULARITY_WEIGHT: f64 = 0.15;
pub const FRESHNESS_WEIGHT: f64 = 0.20;
pub const QUALITY_WEIGHT: f64 = 0.15;

/// Days after which a previously applied wallpaper is fully "recovered".
const FRESHNESS_RECOVERY_DAYS: f64 = 30.0;
/// Freshness ceiling for anything that has been applied before.
const SEEN_FRESHNESS_CAP: f64 = 0.8;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Per-factor scores for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub resolution: f64,
    pub aspect: f64,
    pub popularity: f64,
    pub freshness: f64,
    pub quality: f64,
    pub total: f64,
}

/// A candidate together with its score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub candidate: WallpaperCandidate,
    pub score: ScoreBreakdown,
}

/// `min(min(w / dw, h / dh), 1)`.
pub fn resolution_score(candidate: &WallpaperCandidate, device: &DeviceDescriptor) -> f64 {
    let width_ratio = f64::from(candidate.width) / f64::from(device.screen_width_px);
    let height_ratio = f64::from(candidate.height) / f64::from(device.screen_height_px);
    width_ratio.min(height_ratio).min(1.0)
}

/// `clamp(1 - |aspect - device_aspect| / device_aspect, 0, 1)`.
pub fn aspect_score(candidate: &WallpaperCandidate, device: &DeviceDescriptor) -> f64 {
    if !candidate.is_scoreable() {
        return 0.0;
    }
    let image_aspect = f64::from(candidate.height) / f64::from(candidate.width);
    let device_aspect = device.aspect();
    (1.0 - (image_aspect - device_aspect).abs() / device_aspect).clamp(0.0, 1.0)
}

/// `likes / max_likes`, with `max_likes` floored at 1.
pub fn popularity_score(likes: u32, max_likes: u32) -> f64 {
    f64::from(likes) / f64::from(max_likes.max(1))
}

/// 1.0 when never applied, otherwise `min(days_since / 30, 0.8)`.
///
/// Days are whole elapsed days; an `applied_at` in the future counts as today.
pub fn freshness_score(applied_at_millis: Option<i64>, now_millis: i64) -> f64 {
    match applied_at_millis {
        None => 1.0,
        Some(applied_at) => {
            let days = now_millis.saturating_sub(applied_at).max(0) / MILLIS_PER_DAY;
            (days as f64 / FRESHNESS_RECOVERY_DAYS).min(SEEN_FRESHNESS_CAP)
        }
    }
}

/// `min(pixels / (2 * device_pixels), 1)`.
pub fn quality_score(candidate: &WallpaperCandidate, device: &DeviceDescriptor) -> f64 {
    let surplus = candidate.pixels() as f64 / (2.0 * device.pixels() as f64);
    surplus.min(1.0)
}

/// Score a single candidate against a precomputed `max_likes`.
pub fn score_candidate(
    candidate: &WallpaperCandidate,
    device: &DeviceDescriptor,
    max_likes: u32,
    applied_at_millis: Option<i64>,
    now_millis: i64,
) -> ScoreBreakdown {
    let resolution = resolution_score(candidate, device);
    let aspect = aspect_score(candidate, device);
    let popularity = popularity_score(candidate.likes, max_likes);
    let freshness = freshness_score(applied_at_millis, now_millis);
    let quality = quality_score(candidate, device);

    let total = RESOLUTION_WEIGHT * resolution
        + ASPECT_WEIGHT * aspect
        + POPULARITY_WEIGHT * popularity
        + FRESHNESS_WEIGHT * freshness
        + QUALITY_WEIGHT * quality;

    ScoreBreakdown {
        resolution,
        aspect,
        popularity,
        freshness,
        quality,
        total,
    }
}

/// Score every candidate and sort by descending total.
///
/// The sort is stable, so equal totals keep their input order.
pub fn rank(
    candidates: Vec<WallpaperCandidate>,
    device: &DeviceDescriptor,
    applied_timestamps: &HashMap<String, i64>,
    now_millis: i64,
) -> Vec<ScoredCandidate> {
    let max_likes = candidates.iter().map(|c| c.likes).max().unwrap_or(0).max(1);

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let applied_at = applied_timestamps.get(&candidate.id).copied();
            let score = score_candidate(&candidate, device, max_likes, applied_at, now_millis);
            ScoredCandidate { candidate, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total.total_cmp(&a.score.total));
    scored
}

/// Highest-scoring candidate, first one on ties. `None` only for empty input.
pub fn select(
    candidates: Vec<WallpaperCandidate>,
    device: &DeviceDescriptor,
    applied_timestamps: &HashMap<String, i64>,
    now_millis: i64,
) -> Option<WallpaperCandidate> {
    rank(candidates, device, applied_timestamps, now_millis)
        .into_iter()
        .next()
        .map(|scored| scored.candidate)
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Scorer bound to a history store and a clock.
///
/// Reads the history snapshot once per call.
#[derive(Clone)]
pub struct SmartSelector {
    history: Arc<dyn HistoryStore>,
    clock: Clock,
}

impl SmartSelector {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self {
            history,
            clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Replace the wall clock, e.g. with a fixed instant.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn now_millis(&self) -> i64 {
        (self.clock)()
    }

    pub async fn rank(
        &self,
        candidates: Vec<WallpaperCandidate>,
        device: &DeviceDescriptor,
    ) -> Vec<ScoredCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let timestamps = match self.history.applied_timestamps().await {
            Ok(timestamps) => timestamps,
            Err(e) => {
                warn!(error = %e, "Failed to read history, scoring everything as unseen");
                HashMap::new()
            }
        };

        let ranked = rank(candidates, device, &timestamps, self.now_millis());
        if let Some(best) = ranked.first() {
            debug!(
                id = %best.candidate.id,
                total = best.score.total,
                pool = ranked.len(),
                "Ranked candidates"
            );
        }
        ranked
    }

    pub async fn select(
        &self,
        candidates: Vec<WallpaperCandidate>,
        device: &DeviceDescriptor,
    ) -> Option<WallpaperCandidate> {
        self.rank(candidates, device)
            .await
            .into_iter()
            .next()
            .map(|scored| scored.candidate)
    }
}
