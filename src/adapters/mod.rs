//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - HTTP: rate limiter, retrying API client, blocking wrapper
//! - BscScan: chain explorer client
//! - CoinGecko: market data client
//! - Alerts: plain-text alert renderer
//! - CLI: command-line definitions

pub mod alerts;
pub mod bscscan;
pub mod cli;
pub mod coingecko;
pub mod http;

pub use alerts::PlainTextAlertRenderer;
pub use bscscan::BscScanClient;
pub use cli::CliApp;
pub use coingecko::CoinGeckoClient;
pub use http::{ApiClient, BlockingApiClient, RateLimiter};
