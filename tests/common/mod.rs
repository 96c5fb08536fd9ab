//! Shared test harness for integration tests.
//!
//! [`TestHarness`] starts a wiremock server that impersonates all four image
//! providers plus the image host, and wires a full [`WallpaperService`]
//! against it with a temporary cache directory and history database.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wallshift::cache::ContentCache;
use wallshift::config::{Config, StaticSettings};
use wallshift::history::SqliteHistory;
use wallshift::scoring::SmartSelector;
use wallshift::search::{Aggregator, FallbackController};
use wallshift::service::WallpaperService;
use wallshift_db::pool::init_pool;

pub struct TestHarness {
    pub server: MockServer,
    pub tmp: TempDir,
    pub config: Config,
}

impl TestHarness {
    /// Mock server with no routes and a config pointing every provider at it.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().expect("failed to create temp dir");

        let mut config = Config::default();
        config.categories = vec!["nature".to_string()];
        config.search.requests_per_second = 100;
        config.search.request_timeout_secs = 5;
        config.cache.dir = Some(tmp.path().join("cache"));
        config.history.db_path = Some(tmp.path().join("history.db"));
        config.providers.unsplash.api_key = "unsplash-key".into();
        config.providers.pexels.api_key = "pexels-key".into();
        config.providers.pixabay.api_key = "pixabay-key".into();
        for provider in [
            &mut config.providers.unsplash,
            &mut config.providers.pexels,
            &mut config.providers.pixabay,
            &mut config.providers.wallhaven,
        ] {
            provider.base_url = Some(server.uri());
        }

        Self {
            server,
            tmp,
            config,
        }
    }

    /// Unsplash rate limited, Pixabay failing, Pexels and Wallhaven answering,
    /// and every image URL downloadable.
    pub async fn with_mixed_providers() -> Self {
        let harness = Self::new().await;
        let uri = harness.server.uri();

        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "60"))
            .mount(&harness.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&harness.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "photos": [{
                    "id": 11,
                    "width": 1080,
                    "height": 1920,
                    "url": "https://www.pexels.com/photo/11/",
                    "photographer": "Pia",
                    "src": {
                        "large2x": format!("{uri}/img/pexels-11.jpg"),
                        "medium": format!("{uri}/thumb/pexels-11.jpg")
                    }
                }]
            })))
            .mount(&harness.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {
                        "id": "aa",
                        "url": "https://wallhaven.cc/w/aa",
                        "path": format!("{uri}/img/wallhaven-aa.jpg"),
                        "dimension_x": 2160,
                        "dimension_y": 3840,
                        "favorites": 10,
                        "thumbs": { "small": format!("{uri}/thumb/aa.jpg") }
                    },
                    {
                        "id": "bb",
                        "url": "https://wallhaven.cc/w/bb",
                        "path": format!("{uri}/img/wallhaven-bb.jpg"),
                        "dimension_x": 1080,
                        "dimension_y": 1920,
                        "favorites": 5,
                        "thumbs": { "small": format!("{uri}/thumb/bb.jpg") }
                    }
                ]
            })))
            .mount(&harness.server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/img/.+\.jpg$"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFFu8; 4096]))
            .mount(&harness.server)
            .await;

        harness
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.tmp.path().join("cache")
    }

    /// Full service plus the history store it writes to.
    pub fn service(&self) -> (WallpaperService, Arc<SqliteHistory>) {
        let client = reqwest::Client::new();
        let db_path = self.config.history.resolved_db_path();
        let pool = init_pool(&db_path.to_string_lossy()).expect("failed to open history db");
        let history = Arc::new(SqliteHistory::new(pool, self.config.history.keep));

        let aggregator = Arc::new(Aggregator::from_config(&self.config, client.clone()));
        let fallback =
            FallbackController::new(aggregator, history.clone(), self.config.search.per_page);
        let selector = SmartSelector::new(history.clone());
        let cache = Arc::new(ContentCache::new(self.cache_dir(), client));

        let service = WallpaperService::new(
            fallback,
            selector,
            cache,
            history.clone(),
            Arc::new(StaticSettings::new(self.config.cache.max_size_mb)),
        );
        (service, history)
    }
}
