//! Fan-out search across every configured image provider.
//!
//! The [`Aggregator`] queries all available providers for one keyword, each
//! bounded by its own timeout, and concatenates the successful results in
//! provider priority order. A failing provider is logged and contributes
//! nothing; the search as a whole never fails.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, warn};
use wallshift_common::WallpaperCandidate;

use crate::config::Config;
use crate::providers::{build_providers, ImageProvider, ProviderError};

/// Smallest per-category page size when a total is split across categories.
pub const MIN_PER_CATEGORY: u32 = 5;

/// Search surface used by the fallback controller.
#[async_trait]
pub trait CandidateSearch: Send + Sync {
    /// One keyword across every provider.
    async fn search(&self, query: &str, page: u32, per_page: u32) -> Vec<WallpaperCandidate>;

    /// One [`search`](Self::search) per category, flattened in category order.
    async fn search_categories(
        &self,
        categories: &[String],
        page: u32,
        per_page_total: u32,
    ) -> Vec<WallpaperCandidate>;
}

/// Page size each category gets when `per_page_total` is shared.
pub fn per_category_page_size(per_page_total: u32, categories: usize) -> u32 {
    let categories = u32::try_from(categories.max(1)).unwrap_or(u32::MAX);
    (per_page_total / categories).max(MIN_PER_CATEGORY)
}

/// Registry of image providers searched together.
///
/// Providers are queried in registration order, which is also the order
/// their results appear in.
pub struct Aggregator {
    providers: Vec<Arc<dyn ImageProvider>>,
    request_timeout: Duration,
    max_concurrency: usize,
}

impl Aggregator {
    /// Create an empty aggregator.
    pub fn new(request_timeout: Duration, max_concurrency: usize) -> Self {
        Self {
            providers: Vec::new(),
            request_timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// All four providers, in priority order, using the search settings from
    /// `config`.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut aggregator = Self::new(
            Duration::from_secs(config.search.request_timeout_secs),
            config.search.max_concurrency,
        );
        for provider in build_providers(config, client) {
            aggregator.register(provider);
        }
        aggregator
    }

    /// Append a provider at the lowest priority.
    pub fn register(&mut self, provider: Arc<dyn ImageProvider>) {
        self.providers.push(provider);
    }

    /// Providers that can currently serve requests.
    pub fn available(&self) -> Vec<Arc<dyn ImageProvider>> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .cloned()
            .collect()
    }

    async fn search_provider(
        &self,
        provider: Arc<dyn ImageProvider>,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Vec<WallpaperCandidate> {
        let source = provider.source();
        let outcome =
            tokio::time::timeout(self.request_timeout, provider.search(query, page, per_page))
                .await
                .unwrap_or(Err(ProviderError::Timeout));

        match outcome {
            Ok(hits) => {
                debug!(%source, query, hits = hits.len(), "Provider search finished");
                hits.into_iter()
                    .map(|hit| hit.into_candidate(source, query))
                    .collect()
            }
            Err(e) if e.is_rate_limit() => {
                warn!(%source, query, error = %e, "Provider rate limited, skipping");
                Vec::new()
            }
            Err(e) => {
                error!(%source, query, error = %e, "Provider search failed");
                Vec::new()
            }
        }
    }
}

/// Keep the first occurrence of every id.
fn dedup_by_id(candidates: impl IntoIterator<Item = WallpaperCandidate>) -> Vec<WallpaperCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect()
}

#[async_trait]
impl CandidateSearch for Aggregator {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> Vec<WallpaperCandidate> {
        let available = self.available();
        if available.is_empty() {
            warn!(query, "No image providers available");
            return Vec::new();
        }

        // Boxed up front so the stream holds no closure over borrowed args.
        let searches: Vec<BoxFuture<'_, Vec<WallpaperCandidate>>> = available
            .into_iter()
            .map(|provider| self.search_provider(provider, query, page, per_page).boxed())
            .collect();
        let batches: Vec<Vec<WallpaperCandidate>> = stream::iter(searches)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        dedup_by_id(batches.into_iter().flatten())
    }

    async fn search_categories(
        &self,
        categories: &[String],
        page: u32,
        per_page_total: u32,
    ) -> Vec<WallpaperCandidate> {
        if categories.is_empty() {
            return Vec::new();
        }

        let per_page = per_category_page_size(per_page_total, categories.len());
        let mut merged = Vec::new();
        for category in categories {
            merged.extend(self.search(category, page, per_page).await);
        }
        dedup_by_id(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::RawHit;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;
    use wallshift_common::ImageSource;

    enum Behavior {
        Hits(Vec<&'static str>),
        Fail(fn() -> ProviderError),
        Hang,
    }

    struct StubProvider {
        source: ImageSource,
        available: bool,
        behavior: Behavior,
        calls: Mutex<Vec<(String, u32, u32)>>,
    }

    impl StubProvider {
        fn new(source: ImageSource, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                source,
                available: true,
                behavior,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    fn hit(native_id: &str) -> RawHit {
        RawHit {
            native_id: native_id.to_string(),
            width: 1080,
            height: 1920,
            download_url: format!("https://img.example/{native_id}.jpg"),
            thumbnail_url: String::new(),
            likes: 1,
            photographer: "stub".into(),
            attribution_url: String::new(),
        }
    }

    #[async_trait]
    impl ImageProvider for StubProvider {
        fn source(&self) -> ImageSource {
            self.source
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn search(
            &self,
            query: &str,
            page: u32,
            per_page: u32,
        ) -> Result<Vec<RawHit>, ProviderError> {
            self.calls.lock().push((query.to_string(), page, per_page));
            match &self.behavior {
                Behavior::Hits(ids) => Ok(ids.iter().map(|id| hit(id)).collect()),
                Behavior::Fail(make) => Err(make()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn aggregator(providers: Vec<Arc<StubProvider>>) -> Aggregator {
        let mut aggregator = Aggregator::new(Duration::from_millis(200), 4);
        for provider in providers {
            aggregator.register(provider);
        }
        aggregator
    }

    #[tokio::test]
    async fn three_failures_one_success_returns_survivor() {
        let agg = aggregator(vec![
            StubProvider::new(
                ImageSource::Unsplash,
                Behavior::Fail(|| ProviderError::RateLimited {
                    retry_after_secs: None,
                }),
            ),
            StubProvider::new(ImageSource::Pexels, Behavior::Fail(|| ProviderError::Status(500))),
            StubProvider::new(ImageSource::Pixabay, Behavior::Hang),
            StubProvider::new(ImageSource::Wallhaven, Behavior::Hits(vec!["w1", "w2"])),
        ]);

        let results = agg.search("nature", 1, 30).await;

        let ids: Vec<_> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["wallhaven_w1", "wallhaven_w2"]);
        assert!(results.iter().all(|c| c.category == "nature"));
        assert_matches!(results[0].source, ImageSource::Wallhaven);
    }

    #[tokio::test]
    async fn all_failing_is_empty_not_error() {
        let agg = aggregator(vec![
            StubProvider::new(ImageSource::Unsplash, Behavior::Fail(|| ProviderError::Timeout)),
            StubProvider::new(
                ImageSource::Pexels,
                Behavior::Fail(|| ProviderError::Decode("bad".into())),
            ),
        ]);
        assert!(agg.search("nature", 1, 30).await.is_empty());
    }

    #[tokio::test]
    async fn results_follow_registration_order() {
        let agg = aggregator(vec![
            StubProvider::new(ImageSource::Unsplash, Behavior::Hits(vec!["u1"])),
            StubProvider::new(ImageSource::Pexels, Behavior::Hits(vec!["p1", "p2"])),
            StubProvider::new(ImageSource::Pixabay, Behavior::Hits(vec!["x1"])),
        ]);

        let ids: Vec<_> = agg
            .search("sky", 1, 30)
            .await
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["unsplash_u1", "pexels_p1", "pexels_p2", "pixabay_x1"]);
    }

    #[tokio::test]
    async fn unavailable_providers_are_not_called() {
        let disabled = Arc::new(StubProvider {
            source: ImageSource::Unsplash,
            available: false,
            behavior: Behavior::Hits(vec!["u1"]),
            calls: Mutex::new(Vec::new()),
        });
        let agg = aggregator(vec![disabled.clone()]);

        assert!(agg.search("sky", 1, 30).await.is_empty());
        assert!(disabled.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn categories_split_page_size_and_dedup() {
        let provider = StubProvider::new(ImageSource::Pexels, Behavior::Hits(vec!["same"]));
        let agg = aggregator(vec![provider.clone()]);
        let categories = vec!["nature".to_string(), "minimal".to_string(), "abstract".to_string()];

        let results = agg.search_categories(&categories, 2, 30).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].category, "nature");
        let calls = provider.calls.lock().clone();
        assert_eq!(
            calls,
            vec![
                ("nature".to_string(), 2, 10),
                ("minimal".to_string(), 2, 10),
                ("abstract".to_string(), 2, 10),
            ]
        );
    }

    /// Tracks how many searches run at once across every provider sharing it.
    struct Gauge {
        source: ImageSource,
        in_flight: Arc<std::sync::atomic::AtomicUsize>,
        peak: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl ImageProvider for Gauge {
        fn source(&self) -> ImageSource {
            self.source
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn search(&self, query: &str, _page: u32, _per_page: u32) -> Result<Vec<RawHit>, ProviderError> {
            use std::sync::atomic::Ordering;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![hit(&format!("{}-{query}", self.source))])
        }
    }

    #[tokio::test]
    async fn concurrency_is_bounded_and_order_kept() {
        let in_flight = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let peak = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut agg = Aggregator::new(Duration::from_secs(2), 2);
        for &source in ImageSource::all() {
            agg.register(Arc::new(Gauge {
                source,
                in_flight: in_flight.clone(),
                peak: peak.clone(),
            }));
        }

        let results = agg.search("sea", 1, 30).await;

        assert_eq!(results.len(), 4);
        assert_eq!(peak.load(std::sync::atomic::Ordering::SeqCst), 2);
        let sources: Vec<_> = results.iter().map(|c| c.source).collect();
        assert_eq!(sources, ImageSource::all().to_vec());
    }

    #[tokio::test]
    async fn empty_categories_return_empty() {
        let provider = StubProvider::new(ImageSource::Pexels, Behavior::Hits(vec!["a"]));
        let agg = aggregator(vec![provider.clone()]);
        assert!(agg.search_categories(&[], 1, 30).await.is_empty());
        assert!(provider.calls.lock().is_empty());
    }

    #[test]
    fn per_category_floor() {
        assert_eq!(per_category_page_size(30, 3), 10);
        assert_eq!(per_category_page_size(30, 10), 5);
        assert_eq!(per_category_page_size(12, 1), 12);
        assert_eq!(per_category_page_size(30, 0), 30);
    }
}
