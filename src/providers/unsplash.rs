//! Unsplash photo search provider.
//!
//! `GET /search/photos`, authenticated with the `client_id` query parameter.
//! Portrait orientation, relevance order.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wallshift_common::ImageSource;

use super::http::ProviderHttp;
use super::provider::{count, dimensions, ImageProvider, ProviderError, RawHit};

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: String,
    width: i64,
    height: i64,
    #[serde(default)]
    likes: i64,
    urls: UnsplashUrls,
    user: UnsplashUser,
    links: UnsplashLinks,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    full: String,
    small: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashLinks {
    html: String,
}

impl UnsplashPhoto {
    fn into_hit(self) -> Option<RawHit> {
        let (width, height) = dimensions(self.width, self.height)?;
        Some(RawHit {
            native_id: self.id,
            width,
            height,
            download_url: self.urls.full,
            thumbnail_url: self.urls.small,
            likes: count(self.likes),
            photographer: self.user.name,
            attribution_url: self.links.html,
        })
    }
}

/// Unsplash provider.
pub struct UnsplashProvider {
    http: ProviderHttp,
    access_key: String,
    base_url: String,
    enabled: bool,
}

impl UnsplashProvider {
    pub fn new(http: ProviderHttp, access_key: String, base_url: String, enabled: bool) -> Self {
        Self {
            http,
            access_key,
            base_url,
            enabled,
        }
    }
}

#[async_trait]
impl ImageProvider for UnsplashProvider {
    fn source(&self) -> ImageSource {
        ImageSource::Unsplash
    }

    fn is_available(&self) -> bool {
        self.enabled && !self.access_key.is_empty()
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

        let url = format!("{}/search/photos", self.base_url);
        debug!(query, page, per_page, "Unsplash search");
        let page = page.to_string();
        let per_page = per_page.to_string();

        let request = self.http.get(&url).query(&[
            ("query", query),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
            ("orientation", "portrait"),
            ("order_by", "relevant"),
            ("client_id", self.access_key.as_str()),
        ]);

        let body: UnsplashSearchResponse = self.http.send_json(request).await?;
        Ok(body
            .results
            .into_iter()
            .filter_map(UnsplashPhoto::into_hit)
            .collect())
    }
}
