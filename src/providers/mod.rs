//! External image search providers.
//!
//! Each submodule wraps one public API behind [`ImageProvider`]. Use
//! [`build_providers`] to construct every provider from configuration, in
//! priority order.

pub mod http;
pub mod pexels;
pub mod pixabay;
pub mod provider;
pub mod unsplash;
pub mod wallhaven;

use std::sync::Arc;

use wallshift_common::ImageSource;

use crate::config::Config;

pub use http::ProviderHttp;
pub use pexels::PexelsProvider;
pub use pixabay::PixabayProvider;
pub use provider::{ImageProvider, ProviderError, RawHit};
pub use unsplash::UnsplashProvider;
pub use wallhaven::WallhavenProvider;

/// Build all four providers from configuration, sharing one HTTP client.
///
/// Disabled or key-less providers are still returned; they report
/// `is_available() == false` and are skipped at search time.
pub fn build_providers(config: &Config, client: reqwest::Client) -> Vec<Arc<dyn ImageProvider>> {
    let rps = config.search.requests_per_second;

    ImageSource::all()
        .iter()
        .map(|&source| {
            let settings = config.providers.get(source);
            let http = ProviderHttp::new(client.clone(), rps);
            let api_key = settings.api_key.clone();
            let base_url = settings.base_url_for(source);
            let enabled = settings.enabled;

            let provider: Arc<dyn ImageProvider> = match source {
                ImageSource::Unsplash => {
                    Arc::new(UnsplashProvider::new(http, api_key, base_url, enabled))
                }
                ImageSource::Pexels => {
                    Arc::new(PexelsProvider::new(http, api_key, base_url, enabled))
                }
                ImageSource::Pixabay => {
                    Arc::new(PixabayProvider::new(http, api_key, base_url, enabled))
                }
                ImageSource::Wallhaven => Arc::new(WallhavenProvider::new(
                    http,
                    api_key,
                    base_url,
                    config.search.min_resolution.clone(),
                    enabled,
                )),
            };
            provider
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_in_priority_order() {
        let providers = build_providers(&Config::default(), reqwest::Client::new());
        let sources: Vec<_> = providers.iter().map(|p| p.source()).collect();
        assert_eq!(sources, ImageSource::all());
    }

    #[test]
    fn only_wallhaven_is_available_without_keys() {
        let providers = build_providers(&Config::default(), reqwest::Client::new());
        let available: Vec<_> = providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.source())
            .collect();
        assert_eq!(available, vec![ImageSource::Wallhaven]);
    }

    #[test]
    fn keys_make_providers_available() {
        let mut config = Config::default();
        config.providers.pexels.api_key = "px".into();
        config.providers.wallhaven.enabled = false;

        let providers = build_providers(&config, reqwest::Client::new());
        let available: Vec<_> = providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.source())
            .collect();
        assert_eq!(available, vec![ImageSource::Pexels]);
    }
}
