//! HTTP transport seam
//!
//! `ApiClient` speaks to upstreams through [`HttpTransport`] so tests can
//! script responses and failures without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::error::from_reqwest;
use crate::ports::ApiError;

/// Raw upstream response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One GET request; implementations must respect `timeout`
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, ApiError>;
}

/// Production transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, ApiError> {
        let mut request = self.client.get(url).query(query).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| from_reqwest(e, timeout))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| from_reqwest(e, timeout))?;
        Ok(HttpResponse { status, body })
    }
}
