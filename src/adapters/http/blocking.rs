//! Blocking facade over [`ApiClient`]
//!
//! Drives the async client on a private current-thread runtime, so both
//! modes share the retry policy, decoders and rate limiter. Must not be
//! called from inside another tokio runtime.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::runtime::{Builder, Runtime};

use super::client::{ApiClient, ApiStats};
use crate::ports::ApiError;

pub struct BlockingApiClient {
    inner: Arc<ApiClient>,
    runtime: Runtime,
}

impl BlockingApiClient {
    pub fn new(inner: Arc<ApiClient>) -> Result<Self, ApiError> {
        Ok(Self {
            inner,
            runtime: current_thread_runtime()?,
        })
    }

    pub fn fetch<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.runtime.block_on(self.inner.fetch(endpoint, params))
    }

    pub fn stats(&self) -> ApiStats {
        self.inner.stats()
    }

    pub fn inner(&self) -> &Arc<ApiClient> {
        &self.inner
    }
}

pub(crate) fn current_thread_runtime() -> Result<Runtime, ApiError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ApiError::Network(format!("Failed to start blocking runtime: {}", e)))
}
