//! Mapping of transport failures and HTTP statuses onto [`ApiError`]

use std::time::Duration;

use crate::ports::ApiError;

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 200;

pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(timeout)
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Classify a non-success status
pub fn status_error(status: u16, body: &str) -> ApiError {
    let body = truncate(body);
    match status {
        429 => ApiError::RateLimited(format!("HTTP 429: {}", body)),
        404 => ApiError::NotFound(body),
        500..=599 => ApiError::Server { status, body },
        _ => ApiError::Client { status, body },
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
