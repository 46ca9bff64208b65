use anyhow::{Context, Result};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use url::Url;

/// Builds the shared HTTP client for market data calls.
///
/// Transient failures are retried with exponential backoff (max 3); the
/// public klines endpoint answers well inside the 10s timeout.
pub fn market_data_client() -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_else(|_| Client::new());

    ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}

/// Appends query parameters to an endpoint URL.
///
/// reqwest-middleware does not expose `.query()`, so the URL is assembled
/// up front.
pub fn endpoint_with_query(base: &str, params: &[(&str, String)]) -> Result<Url> {
    Url::parse_with_params(base, params.iter().map(|(k, v)| (*k, v.as_str())))
        .with_context(|| format!("Invalid endpoint URL: {}", base))
}
