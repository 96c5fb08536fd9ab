//! Pexels photo search provider.
//!
//! `GET /v1/search`, authenticated with the `Authorization` header. Pexels
//! does not expose likes, so every hit reports 0.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wallshift_common::ImageSource;

use super::http::ProviderHttp;
use super::provider::{dimensions, ImageProvider, ProviderError, RawHit};

#[derive(Debug, Deserialize)]
struct PexelsSearchResponse {
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    id: u64,
    width: i64,
    height: i64,
    url: String,
    photographer: String,
    src: PexelsSrc,
}

#[derive(Debug, Deserialize)]
struct PexelsSrc {
    large2x: String,
    medium: String,
}

impl PexelsPhoto {
    fn into_hit(self) -> Option<RawHit> {
        let (width, height) = dimensions(self.width, self.height)?;
        Some(RawHit {
            native_id: self.id.to_string(),
            width,
            height,
            download_url: self.src.large2x,
            thumbnail_url: self.src.medium,
            likes: 0,
            photographer: self.photographer,
            attribution_url: self.url,
        })
    }
}

/// Pexels provider.
pub struct PexelsProvider {
    http: ProviderHttp,
    api_key: String,
    base_url: String,
    enabled: bool,
}

impl PexelsProvider {
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
impl ImageProvider for PexelsProvider {
    fn source(&self) -> ImageSource {
        ImageSource::Pexels
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

        let url = format!("{}/v1/search", self.base_url);
        debug!(query, page, per_page, "Pexels search");
        let page = page.to_string();
        let per_page = per_page.to_string();

        let request = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .query(&[
                ("query", query),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
                ("orientation", "portrait"),
            ]);

        let body: PexelsSearchResponse = self.http.send_json(request).await?;
        Ok(body
            .photos
            .into_iter()
            .filter_map(PexelsPhoto::into_hit)
            .collect())
    }
}
