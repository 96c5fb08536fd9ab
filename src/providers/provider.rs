//! Trait definition and types for image providers.
//!
//! Every external image search API is wrapped in an [`ImageProvider`] that
//! performs a single paged keyword search and returns normalized [`RawHit`]s.
//! Turning a hit into a [`WallpaperCandidate`] (id prefixing, category
//! tagging) is done by the aggregator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wallshift_common::{ImageSource, WallpaperCandidate};

/// Why a single provider search failed.
///
/// These never escape the aggregator; they only decide how loudly a failure
/// is logged.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider is disabled or has no credentials.
    #[error("{0} is not configured")]
    Unavailable(ImageSource),

    /// HTTP 429 from the provider.
    #[error("rate limited (HTTP 429)")]
    RateLimited {
        /// Value of the `Retry-After` header in seconds, if sent.
        retry_after_secs: Option<u64>,
    },

    /// Any other non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The request did not finish in time.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS, or body transfer failure.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Rate limits are expected under load and logged as warnings, not errors.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// A provider search hit after field renaming, before id prefixing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    /// The provider's own id for the image.
    pub native_id: String,
    pub width: u32,
    pub height: u32,
    pub download_url: String,
    pub thumbnail_url: String,
    pub likes: u32,
    pub photographer: String,
    pub attribution_url: String,
}

impl RawHit {
    /// Build the provider-agnostic candidate for this hit.
    pub fn into_candidate(self, source: ImageSource, category: &str) -> WallpaperCandidate {
        WallpaperCandidate {
            id: WallpaperCandidate::make_id(source, &self.native_id),
            source,
            category: category.to_string(),
            width: self.width,
            height: self.height,
            download_url: self.download_url,
            thumbnail_url: self.thumbnail_url,
            likes: self.likes,
            photographer: self.photographer,
            attribution_url: self.attribution_url,
        }
    }
}

/// Validated pixel dimensions; `None` unless both are positive.
pub(crate) fn dimensions(width: i64, height: i64) -> Option<(u32, u32)> {
    let width = u32::try_from(width).ok().filter(|w| *w > 0)?;
    let height = u32::try_from(height).ok().filter(|h| *h > 0)?;
    Some((width, height))
}

/// Clamp a provider-reported count into `u32`, treating negatives as 0.
pub(crate) fn count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Async trait that all image providers must implement.
///
/// Each provider wraps a single external API and is shared behind an `Arc`
/// across concurrent searches.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Which source this provider represents.
    fn source(&self) -> ImageSource;

    /// Returns `true` when the provider can serve requests (enabled and,
    /// where required, holding an API key).
    fn is_available(&self) -> bool;

    /// One paged keyword search.
    ///
    /// Hits without positive dimensions are dropped.
    async fn search(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RawHit>, ProviderError>;
}
