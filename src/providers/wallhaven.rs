//! Wallhaven wallpaper search provider.
//!
//! `GET /api/v1/search`. Anonymous access works for SFW content; an API key
//! is sent when configured. Wallhaven uses a fixed page size, so `per_page`
//! is ignored, and filters server-side by minimum resolution.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wallshift_common::ImageSource;

use super::http::ProviderHttp;
use super::provider::{count, dimensions, ImageProvider, ProviderError, RawHit};

#[derive(Debug, Deserialize)]
struct WallhavenSearchResponse {
    data: Vec<WallhavenData>,
}

#[derive(Debug, Deserialize)]
struct WallhavenData {
    id: String,
    url: String,
    path: String,
    dimension_x: i64,
    dimension_y: i64,
    #[serde(default)]
    favorites: i64,
    thumbs: WallhavenThumbs,
}

#[derive(Debug, Deserialize)]
struct WallhavenThumbs {
    small: String,
}

impl WallhavenData {
    fn into_hit(self) -> Option<RawHit> {
        let (width, height) = dimensions(self.dimension_x, self.dimension_y)?;
        Some(RawHit {
            native_id: self.id,
            width,
            height,
            download_url: self.path,
            thumbnail_url: self.thumbs.small,
            likes: count(self.favorites),
            photographer: "Wallhaven".to_string(),
            attribution_url: self.url,
        })
    }
}

/// Wallhaven provider.
pub struct WallhavenProvider {
    http: ProviderHttp,
    api_key: String,
    base_url: String,
    min_resolution: String,
    enabled: bool,
}

impl WallhavenProvider {
    pub fn new(
        http: ProviderHttp,
        api_key: String,
        base_url: String,
        min_resolution: String,
        enabled: bool,
    ) -> Self {
        Self {
            http,
            api_key,
            base_url,
            min_resolution,
            enabled,
        }
    }
}

#[async_trait]
impl ImageProvider for WallhavenProvider {
    fn source(&self) -> ImageSource {
        ImageSource::Wallhaven
    }

    fn is_available(&self) -> bool {
        self.enabled
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        _per_page: u32,
    ) -> Result<Vec<RawHit>, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable(self.source()));
        }

        let url = format!("{}/api/v1/search", self.base_url);
        debug!(query, page, "Wallhaven search");

        let page = page.to_string();
        let mut params = vec![
            ("q", query),
            ("page", page.as_str()),
            ("categories", "100"),
            ("purity", "100"),
            ("sorting", "relevance"),
            ("atleast", self.min_resolution.as_str()),
        ];
        if !self.api_key.is_empty() {
            params.push(("apikey", self.api_key.as_str()));
        }

        let request = self.http.get(&url).query(&params);
        let body: WallhavenSearchResponse = self.http.send_json(request).await?;
        Ok(body
            .data
            .into_iter()
            .filter_map(WallhavenData::into_hit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn anonymous_search_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .and(query_param("q", "nebula"))
            .and(query_param("purity", "100"))
            .and(query_param("atleast", "1080x1920"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": "8x1kxo",
                    "url": "https://wallhaven.cc/w/8x1kxo",
                    "path": "https://w.wallhaven.cc/full/8x/wallhaven-8x1kxo.jpg",
                    "dimension_x": 2160,
                    "dimension_y": 3840,
                    "favorites": 311,
                    "thumbs": {
                        "large": "https://th.wallhaven.cc/lg/8x/8x1kxo.jpg",
                        "original": "https://th.wallhaven.cc/orig/8x/8x1kxo.jpg",
                        "small": "https://th.wallhaven.cc/small/8x/8x1kxo.jpg"
                    }
                }],
                "meta": { "current_page": 1 }
            })))
            .mount(&server)
            .await;

        let provider = WallhavenProvider::new(
            ProviderHttp::new(reqwest::Client::new(), 100),
            String::new(),
            server.uri(),
            "1080x1920".into(),
            true,
        );
        assert!(provider.is_available());

        let hits = provider.search("nebula", 1, 30).await.unwrap();
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.native_id, "8x1kxo");
        assert_eq!(hit.likes, 311);
        assert_eq!(hit.photographer, "Wallhaven");
        assert_eq!(
            hit.download_url,
            "https://w.wallhaven.cc/full/8x/wallhaven-8x1kxo.jpg"
        );
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = WallhavenProvider::new(
            ProviderHttp::new(reqwest::Client::new(), 100),
            String::new(),
            server.uri(),
            "1080x1920".into(),
            true,
        );
        let err = provider.search("nebula", 1, 30).await.unwrap_err();
        assert!(err.is_rate_limit());
    }
}
