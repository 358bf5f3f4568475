//! Sliding-window rate limiter
//!
//! At most `max_calls` call slots fall inside any trailing `window`. A caller
//! reserves its slot under the mutex, then sleeps until the slot arrives, so
//! concurrent callers queue up instead of being rejected.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// BscScan free tier
pub const DEFAULT_EXPLORER_CALLS_PER_SECOND: u32 = 4;

/// CoinGecko public tier
pub const DEFAULT_MARKET_CALLS_PER_MINUTE: u32 = 30;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateLimiterError {
    #[error("Invalid rate: {max_calls} calls per {window:?}")]
    InvalidRate { max_calls: u32, window: Duration },
}

#[derive(Debug)]
pub struct RateLimiter {
    max_calls: u32,
    window: Duration,
    /// Reserved slots, ascending, at most `max_calls` entries
    slots: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: u32, window: Duration) -> Result<Self, RateLimiterError> {
        if max_calls == 0 || window.is_zero() {
            return Err(RateLimiterError::InvalidRate { max_calls, window });
        }
        Ok(Self {
            max_calls,
            window,
            slots: Mutex::new(VecDeque::with_capacity(max_calls as usize)),
        })
    }

    pub fn per_second(max_calls: u32) -> Result<Self, RateLimiterError> {
        Self::new(max_calls, Duration::from_secs(1))
    }

    pub fn per_minute(max_calls: u32) -> Result<Self, RateLimiterError> {
        Self::new(max_calls, Duration::from_secs(60))
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until one more call fits the rate, then return the time waited
    pub async fn acquire(&self) -> Duration {
        let slot = self.reserve();
        let now = Instant::now();
        if slot > now {
            tokio::time::sleep_until(slot).await;
        }
        slot.saturating_duration_since(now)
    }

    /// Thread-blocking variant of [`acquire`](Self::acquire) sharing the same slots
    pub fn acquire_blocking(&self) -> Duration {
        let slot = self.reserve();
        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        wait
    }

    /// Decide and record the next call slot atomically
    fn reserve(&self) -> Instant {
        let now = Instant::now();
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        while let Some(front) = slots.front() {
            if *front + self.window <= now {
                slots.pop_front();
            } else {
                break;
            }
        }

        let max = self.max_calls as usize;
        let slot = if slots.len() < max {
            now
        } else {
            // N-th most recent slot bounds the next one
            (slots[slots.len() - max] + self.window).max(now)
        };

        slots.push_back(slot);
        while slots.len() > max {
            slots.pop_front();
        }

        if slot > now {
            tracing::debug!(
                "Rate limit reached ({} per {:?}), next slot in {:?}",
                self.max_calls,
                self.window,
                slot - now
            );
        }
        slot
    }
}
