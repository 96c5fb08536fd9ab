//! Pixabay image search provider.
//!
//! `GET /api/`, authenticated with the `key` query parameter. Vertical photos
//! only, safe search on, popularity order.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wallshift_common::ImageSource;

use super::http::ProviderHttp;
use super::provider::{count, dimensions, ImageProvider, ProviderError, RawHit};

/// Pixabay rejects `per_page` outside this range.
const PER_PAGE_RANGE: (u32, u32) = (3, 200);

#[derive(Debug, Deserialize)]
struct PixabaySearchResponse {
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PixabayHit {
    id: u64,
    #[serde(rename = "webformatURL")]
    webformat_url: String,
    #[serde(rename = "largeImageURL")]
    large_image_url: String,
    image_width: i64,
    image_height: i64,
    #[serde(default)]
    likes: i64,
    user: String,
    #[serde(rename = "pageURL")]
    page_url: String,
}

impl PixabayHit {
    fn into_hit(self) -> Option<RawHit> {
        let (width, height) = dimensions(self.image_width, self.image_height)?;
        Some(RawHit {
            native_id: self.id.to_string(),
            width,
            height,
            download_url: self.large_image_url,
            thumbnail_url: self.webformat_url,
            likes: count(self.likes),
            photographer: self.user,
            attribution_url: self.page_url,
        })
    }
}

/// Pixabay provider.
pub struct PixabayProvider {
    http: ProviderHttp,
    api_key: String,
    base_url: String,
    enabled: bool,
}

impl PixabayProvider {
    pub fn new(http: ProviderHttp, api_key: String, base_url: String, enabled: bool) -> Self {
        Self {
            http,
            api_key,
            base_url,
            enabled,
        }
    }
}

#[async_trait]
impl ImageProvider for PixabayProvider {
    fn source(&self) -> ImageSource {
        ImageSource::Pixabay
    }

    fn is_available(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RawHit>, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable(self.source()));
        }

        let url = format!("{}/api/", self.base_url);
        let per_page = per_page.clamp(PER_PAGE_RANGE.0, PER_PAGE_RANGE.1);
        debug!(query, page, per_page, "Pixabay search");
        let page = page.to_string();
        let per_page = per_page.to_string();

        let request = self.http.get(&url).query(&[
            ("key", self.api_key.as_str()),
            ("q", query),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
            ("orientation", "vertical"),
            ("image_type", "photo"),
            ("safesearch", "true"),
            ("order", "popular"),
        ]);

        let body: PixabaySearchResponse = self.http.send_json(request).await?;
        Ok(body
            .hits
            .into_iter()
            .filter_map(PixabayHit::into_hit)
            .collect())
    }
}
