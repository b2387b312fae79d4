//! HTTP catalog source backed by `reqwest`.

use crate::error::CatalogError;
use crate::wire::{decode_catalog, ObjectRecord};
use crate::CatalogSource;
use async_trait::async_trait;
use ctrlf_core::Catalog;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend address used by the demo deployment.
pub const DEFAULT_CATALOG_URL: &str = "http://192.168.0.101:5000";

/// Endpoint path returning the object list.
pub const OBJECTS_PATH: &str = "/get-objects";

/// Endpoint path accepting one detected object.
pub const STORE_PATH: &str = "/store-object";

/// Exponential backoff with jitter between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based), including up to 50% jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(1u32 << retry.saturating_sub(1).min(16));
        let jitter_ms = exp.as_millis() as u64 / 2;
        if jitter_ms == 0 {
            return exp;
        }
        exp + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Connection settings for [`HttpCatalogSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSourceConfig {
    /// Scheme, host and port of the backend, e.g. `http://10.0.0.2:5000`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry behaviour on transient failures.
    pub retry: RetryPolicy,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// Fetches the catalog from the backend's `/get-objects` endpoint and
/// records detections through `/store-object`.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    endpoint: String,
    store_endpoint: String,
    retry: RetryPolicy,
}

impl HttpCatalogSource {
    /// Build a source; fails only if the HTTP client cannot be constructed.
    pub fn new(config: HttpSourceConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .no_proxy()
            .build()?;
        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            endpoint: format!("{base}{OBJECTS_PATH}"),
            store_endpoint: format!("{base}{STORE_PATH}"),
            retry: config.retry,
        })
    }

    /// Full URL requested on each fetch.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full URL detections are posted to.
    pub fn store_endpoint(&self) -> &str {
        &self.store_endpoint
    }

    /// Post one object position to the backend.
    ///
    /// Sent once; inserts are not idempotent, so failures are not retried.
    pub async fn store_object(&self, record: &ObjectRecord) -> Result<(), CatalogError> {
        let response = self
            .client
            .post(&self.store_endpoint)
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.store_endpoint, name = %record.name, %status, "Store rejected");
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }
        info!(name = %record.name, offset = ?record.offset(), "Stored object");
        Ok(())
    }

    async fn fetch_once(&self) -> Result<Catalog, CatalogError> {
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        decode_catalog(&body)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError> {
        let mut retry = 0;
        loop {
            match self.fetch_once().await {
                Ok(catalog) => {
                    info!(
                        endpoint = %self.endpoint,
                        entries = catalog.len(),
                        "Fetched object catalog"
                    );
                    return Ok(catalog);
                }
                Err(err) if err.is_retryable() && retry < self.retry.max_retries => {
                    retry += 1;
                    let delay = self.retry.delay_for(retry);
                    warn!(
                        endpoint = %self.endpoint,
                        %err,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        "Catalog fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    debug!(endpoint = %self.endpoint, %err, "Catalog fetch gave up");
                    return Err(err);
                }
            }
        }
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url_and_path() {
        let source = HttpCatalogSource::new(HttpSourceConfig {
            base_url: "http://localhost:5000/".into(),
            ..HttpSourceConfig::default()
        })
        .expect("client builds");
        assert_eq!(source.endpoint(), "http://localhost:5000/get-objects");
        assert_eq!(
            source.store_endpoint(),
            "http://localhost:5000/store-object"
        );
    }

    #[test]
    fn backoff_doubles_with_bounded_jitter() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        for (retry, base) in [(1, 100u64), (2, 200), (3, 400)] {
            let delay = policy.delay_for(retry).as_millis() as u64;
            assert!(
                (base..=base + base / 2).contains(&delay),
                "retry {retry}: {delay}ms outside [{base}, {}]",
                base + base / 2
            );
        }
    }

    #[test]
    fn no_retry_policy_has_zero_delay() {
        assert_eq!(RetryPolicy::none().delay_for(1), Duration::ZERO);
    }
}
