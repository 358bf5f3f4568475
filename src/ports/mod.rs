//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Chain explorer feeds (token transfers, balances)
//! - Market data feeds (trending, listings, coin detail)
//! - Alert rendering

pub mod alerts;
pub mod explorer;
pub mod market_data;
#[cfg(test)]
pub mod mocks;

use std::time::Duration;
use thiserror::Error;

pub use alerts::AlertRenderer;
pub use explorer::ChainExplorerPort;
pub use market_data::{MarketDataPort, MarketOrder};

/// Failure talking to an upstream API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Client error {status}: {body}")]
    Client { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Upstream returned an error: {0}")]
    Upstream(String),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<ApiError>,
    },
}

impl ApiError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout(_)
                | ApiError::Network(_)
                | ApiError::RateLimited(_)
                | ApiError::Server { .. }
        )
    }

    /// Short classification used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Timeout(_) => "timeout",
            ApiError::Network(_) => "network",
            ApiError::RateLimited(_) => "rate_limited",
            ApiError::Server { .. } => "server",
            ApiError::Client { .. } => "client",
            ApiError::NotFound(_) => "not_found",
            ApiError::Decode(_) => "decode",
            ApiError::Upstream(_) => "upstream",
            ApiError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Timeout(Duration::from_secs(30)).is_transient());
        assert!(ApiError::Network("reset".into()).is_transient());
        assert!(ApiError::RateLimited("429".into()).is_transient());
        assert!(ApiError::Server { status: 503, body: String::new() }.is_transient());

        assert!(!ApiError::Client { status: 400, body: String::new() }.is_transient());
        assert!(!ApiError::NotFound("coin".into()).is_transient());
        assert!(!ApiError::Decode("bad json".into()).is_transient());
        assert!(!ApiError::Upstream("NOTOK".into()).is_transient());
    }

    #[test]
    fn test_exhausted_is_terminal() {
        let err = ApiError::RetriesExhausted {
            attempts: 3,
            last_error: Box::new(ApiError::Timeout(Duration::from_secs(1))),
        };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("3 attempts"));
    }
}
