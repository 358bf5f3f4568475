//! Blocking scanner
//!
//! Sequential entry points for callers without an async runtime. Drives the
//! same async tracker and finder on a private current-thread runtime.

use tokio::runtime::Runtime;

use super::gem_finder::{ComprehensiveScan, GemFinder, StrategyScan};
use super::whale_tracker::{WhaleTracker, WhaleTrackerError};
use crate::adapters::http::blocking::current_thread_runtime;
use crate::domain::{DiscoverySource, WhaleEvent};
use crate::ports::ApiError;

pub struct BlockingScanner {
    runtime: Runtime,
    tracker: WhaleTracker,
    finder: GemFinder,
}

impl BlockingScanner {
    pub fn new(tracker: WhaleTracker, finder: GemFinder) -> Result<Self, ApiError> {
        Ok(Self {
            runtime: current_thread_runtime()?,
            tracker,
            finder,
        })
    }

    pub fn scan_whales(
        &self,
        contract: &str,
        price_usd: f64,
        since_block: Option<u64>,
    ) -> Result<Vec<WhaleEvent>, WhaleTrackerError> {
        self.runtime
            .block_on(self.tracker.scan(contract, price_usd, since_block))
    }

    pub fn scan_whales_with_liquidity(
        &self,
        contract: &str,
        price_usd: f64,
        since_block: Option<u64>,
        pool_liquidity_usd: f64,
    ) -> Result<Vec<WhaleEvent>, WhaleTrackerError> {
        self.runtime.block_on(self.tracker.scan_with_liquidity(
            contract,
            price_usd,
            since_block,
            pool_liquidity_usd,
        ))
    }

    pub fn exchange_balance(&self, address: &str) -> Result<f64, WhaleTrackerError> {
        self.runtime.block_on(self.tracker.exchange_balance(address))
    }

    pub fn scan_strategy(&self, source: DiscoverySource) -> Result<StrategyScan, ApiError> {
        self.runtime.block_on(self.finder.scan(source))
    }

    pub fn comprehensive_scan(&self) -> ComprehensiveScan {
        self.runtime.block_on(self.finder.comprehensive_scan())
    }

    pub fn tracker(&self) -> &WhaleTracker {
        &self.tracker
    }

    pub fn finder(&self) -> &GemFinder {
        &self.finder
    }
}
