//! Rate-limited API client with retry
//!
//! Every attempt acquires the upstream's [`RateLimiter`], issues one GET
//! through the [`HttpTransport`] under a bounded timeout and decodes the
//! body. Transient failures are retried with exponential backoff and
//! jitter; anything else surfaces immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::status_error;
use super::rate_limiter::RateLimiter;
use super::transport::HttpTransport;
use crate::ports::ApiError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Backoff schedule between attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Relative jitter, 0.2 means +/-20%
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): base x 2^retry, jittered, capped
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(2u32.saturating_pow(retry));
        let capped = exp.min(self.max_delay);
        if self.jitter <= 0.0 {
            return capped;
        }
        let factor = rand::thread_rng().gen_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        capped.mul_f64(factor).min(self.max_delay)
    }
}

/// Per-upstream client settings
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Upstream name used in logs
    pub name: String,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Query parameters sent with every request (e.g. API key)
    pub default_query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiClientConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            default_query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.default_query.push((key.to_string(), value.into()));
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

/// Snapshot of client counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiStats {
    /// Attempts sent to the transport
    pub requests: u64,
    /// Attempts after the first, per call
    pub retries: u64,
    /// Calls that ended in an error
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
}

pub struct ApiClient {
    config: ApiClientConfig,
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<RateLimiter>,
    counters: Counters,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("name", &self.config.name)
            .field("base_url", &self.config.base_url)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        config: ApiClientConfig,
        transport: Arc<dyn HttpTransport>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            config,
            transport,
            limiter,
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn stats(&self) -> ApiStats {
        ApiStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            retries: self.counters.retries.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// GET `endpoint` and decode the JSON body into `T`
    pub async fn fetch<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.fetch_with(endpoint, params, |body| {
            serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
        })
        .await
    }

    /// GET `endpoint` and decode with `decode`
    ///
    /// `decode` runs inside the retry loop, so a transient error it returns
    /// (e.g. a rate-limit message in a 200 body) is retried.
    pub async fn fetch_with<T, F>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        decode: F,
    ) -> Result<T, ApiError>
    where
        F: Fn(&str) -> Result<T, ApiError> + Send + Sync,
        T: Send,
    {
        let url = self.url(endpoint);
        let query = self.query(params);
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.config.retry.backoff(attempt - 1);
                self.counters.retries.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "{} {} retry {}/{} in {:?}",
                    self.config.name,
                    endpoint,
                    attempt,
                    max_attempts - 1,
                    delay
                );
                tokio::time::sleep(delay).await;
            }

            let result = self.attempt(&url, &query).await.and_then(|body| decode(&body));
            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    warn!(
                        "{} {} attempt {} failed ({}): {}",
                        self.config.name,
                        endpoint,
                        attempt + 1,
                        err.kind(),
                        err
                    );
                    last_error = Some(err);
                }
                Err(err) => {
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    return Err(err);
                }
            }
        }

        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        Err(ApiError::RetriesExhausted {
            attempts: max_attempts,
            last_error: Box::new(
                last_error.unwrap_or_else(|| ApiError::Network("no attempt made".into())),
            ),
        })
    }

    async fn attempt(&self, url: &str, query: &[(String, String)]) -> Result<String, ApiError> {
        let waited = self.limiter.acquire().await;
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        debug!(
            "{} GET {} (rate wait {:?})",
            self.config.name, url, waited
        );

        let timeout = self.config.timeout;
        let response = tokio::time::timeout(
            timeout,
            self.transport.get(url, query, &self.config.headers, timeout),
        )
        .await
        .map_err(|_| ApiError::Timeout(timeout))??;

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(status_error(response.status, &response.body))
        }
    }

    fn url(&self, endpoint: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        if endpoint.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, endpoint)
        }
    }

    fn query(&self, params: &[(&str, String)]) -> Vec<(String, String)> {
        params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .chain(self.config.default_query.iter().cloned())
            .collect()
    }
}
