//! Shared HTTP plumbing for upstream APIs
//!
//! - `RateLimiter`: sliding-window call budget per upstream
//! - `ApiClient`: rate-limited GET with retry and typed decoding
//! - `HttpTransport`: the network seam (reqwest in production)
//! - `BlockingApiClient`: sequential facade over the same client

pub mod blocking;
pub mod client;
pub mod error;
pub mod rate_limiter;
pub mod transport;

pub use blocking::BlockingApiClient;
pub use client::{ApiClient, ApiClientConfig, ApiStats, RetryPolicy};
pub use error::status_error;
pub use rate_limiter::{RateLimiter, RateLimiterError};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};

pub use crate::ports::ApiError;
