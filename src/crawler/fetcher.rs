//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building one shared client with the fixed user agent, age-gate cookie
//!   and timeout
//! - Plain GET requests with error classification
//!
//! Nothing here retries. A failed request is reported once and the caller
//! moves on to the next unit of work.

use crate::config::CrawlerConfig;
use crate::{ConfigError, HarvestError};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - The cookie was not a valid header value, or the
///   client could not be built
///
/// # Example
///
/// ```no_run
/// use ptt_harvest::config::CrawlerConfig;
/// use ptt_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, HarvestError> {
    let cookie = HeaderValue::from_str(&config.age_cookie).map_err(|e| {
        ConfigError::Validation(format!("age-cookie is not a valid header value: {}", e))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, cookie);

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(config.request_timeout.min(10)))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches a page and returns its body
///
/// # Errors
///
/// | Condition | Result |
/// |-----------|--------|
/// | Non-2xx status | `Transport` with `HTTP {code}` |
/// | Timeout | `Transport` with `request timeout` |
/// | Connection refused | `Transport` with `connection refused` |
/// | Body read failure | `Transport` with the reqwest message |
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, HarvestError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_fault(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::Transport {
            url: url.to_string(),
            reason: format!("HTTP {}", status.as_u16()),
        });
    }

    response.text().await.map_err(|e| transport_fault(url, &e))
}

/// Classifies a reqwest error as a transport fault
fn transport_fault(url: &str, e: &reqwest::Error) -> HarvestError {
    let reason = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        "connection refused".to_string()
    } else {
        e.to_string()
    };

    HarvestError::Transport {
        url: url.to_string(),
        reason,
    }
}
