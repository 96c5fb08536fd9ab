//! Shared HTTP plumbing for provider adapters.
//!
//! Wraps a `reqwest::Client` with a token-bucket rate limiter and maps HTTP
//! outcomes onto [`ProviderError`]. A 429 is reported, not retried: each
//! aggregated search makes exactly one attempt per provider.

use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::provider::ProviderError;

/// HTTP client shared by one provider.
pub struct ProviderHttp {
    client: reqwest::Client,
    rate_limiter: DefaultDirectRateLimiter,
}

impl ProviderHttp {
    /// Create a client limited to `requests_per_second` (minimum 1).
    pub fn new(client: reqwest::Client, requests_per_second: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            client,
            rate_limiter: RateLimiter::direct(Quota::per_second(rate)),
        }
    }

    /// Start a GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send a request and decode a JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        self.rate_limiter.until_ready().await;

        let resp = request.send().await.map_err(transport_error)?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(e)
    }
}
