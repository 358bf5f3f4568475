//! Whale Tracker
//!
//! Pulls token transfers from the chain explorer and classifies them into
//! whale events. `scan_unseen` keeps the reported hashes with their block
//! so a polling loop only surfaces each transaction once, plus a block
//! cursor so each poll resumes where the previous one stopped. Hashes below
//! the cursor can no longer be fetched and are pruned after every poll.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{WhaleClassifier, WhaleEvent};
use crate::ports::{AlertRenderer, ApiError, ChainExplorerPort};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WhaleTrackerError {
    #[error("Explorer request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Token price must be finite and >= 0, got {0}")]
    InvalidPrice(f64),
}

pub struct WhaleTracker {
    explorer: Arc<dyn ChainExplorerPort>,
    classifier: WhaleClassifier,
    renderer: Arc<dyn AlertRenderer>,
    /// Reported tx hash -> block number
    seen: Mutex<HashMap<String, u64>>,
    /// Highest block fetched by `scan_unseen`
    cursor: Mutex<Option<u64>>,
}

impl WhaleTracker {
    pub fn new(
        explorer: Arc<dyn ChainExplorerPort>,
        classifier: WhaleClassifier,
        renderer: Arc<dyn AlertRenderer>,
    ) -> Self {
        Self {
            explorer,
            classifier,
            renderer,
            seen: Mutex::new(HashMap::new()),
            cursor: Mutex::new(None),
        }
    }

    pub fn classifier(&self) -> &WhaleClassifier {
        &self.classifier
    }

    /// Whale transfers of `contract`, in explorer order
    pub async fn scan(
        &self,
        contract: &str,
        price_usd: f64,
        since_block: Option<u64>,
    ) -> Result<Vec<WhaleEvent>, WhaleTrackerError> {
        let (events, _) = self.fetch_events(contract, price_usd, since_block).await?;
        Ok(events)
    }

    /// Events plus the highest block among all fetched transfers
    async fn fetch_events(
        &self,
        contract: &str,
        price_usd: f64,
        since_block: Option<u64>,
    ) -> Result<(Vec<WhaleEvent>, Option<u64>), WhaleTrackerError> {
        check_price(price_usd)?;

        let transfers = self.explorer.token_transfers(contract, since_block).await?;
        let events = self
            .classifier
            .classify_batch(&transfers, price_usd)
            .map_err(|_| WhaleTrackerError::InvalidPrice(price_usd))?;

        info!(
            "Whale scan {}: {} of {} transfers >= ${:.0}",
            contract,
            events.len(),
            transfers.len(),
            self.classifier.threshold_usd()
        );
        let max_block = transfers.iter().map(|t| t.block_number).max();
        Ok((events, max_block))
    }

    /// `scan` plus a price impact estimate against a pool of `pool_liquidity_usd`
    pub async fn scan_with_liquidity(
        &self,
        contract: &str,
        price_usd: f64,
        since_block: Option<u64>,
        pool_liquidity_usd: f64,
    ) -> Result<Vec<WhaleEvent>, WhaleTrackerError> {
        if !pool_liquidity_usd.is_finite() || pool_liquidity_usd <= 0.0 {
            warn!(
                "Ignoring pool liquidity {} for {}, no impact estimate",
                pool_liquidity_usd, contract
            );
        }

        let events = self.scan(contract, price_usd, since_block).await?;
        Ok(events
            .into_iter()
            .map(|event| event.with_price_impact(pool_liquidity_usd))
            .collect())
    }

    /// `scan`, dropping transactions this tracker has already returned.
    /// Without `since_block` the scan resumes at the cursor; the cursor block
    /// itself is fetched again and its hashes filtered out.
    pub async fn scan_unseen(
        &self,
        contract: &str,
        price_usd: f64,
        since_block: Option<u64>,
    ) -> Result<Vec<WhaleEvent>, WhaleTrackerError> {
        let start = since_block.or_else(|| self.cursor());
        let (events, max_block) = self.fetch_events(contract, price_usd, start).await?;
        let cursor = {
            let mut cursor = self
                .cursor
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(block) = max_block {
                *cursor = Some(cursor.map_or(block, |current| current.max(block)));
            }
            *cursor
        };

        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = events.len();
        let fresh: Vec<WhaleEvent> = events
            .into_iter()
            .filter(|event| {
                seen.insert(event.transfer.tx_hash.clone(), event.transfer.block_number)
                    .is_none()
            })
            .collect();

        // the cursor block is fetched again on the next poll, so keep it
        if let Some(floor) = cursor {
            seen.retain(|_, block| *block >= floor);
        }

        debug!(
            "{} new whale events ({} already reported, {} tracked)",
            fresh.len(),
            before - fresh.len(),
            seen.len()
        );
        Ok(fresh)
    }

    pub fn cursor(&self) -> Option<u64> {
        *self
            .cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Point the cursor at the chain head so `scan_unseen` skips history
    pub async fn start_from_latest(&self) -> Result<u64, WhaleTrackerError> {
        let latest = self.explorer.latest_block().await?;
        *self
            .cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(latest);
        info!("Whale cursor set to block {}", latest);
        Ok(latest)
    }

    pub fn seen_count(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn render_alert(&self, event: &WhaleEvent) -> String {
        self.renderer.render_whale(event)
    }

    /// Native balance of an address, for report context
    pub async fn exchange_balance(&self, address: &str) -> Result<f64, WhaleTrackerError> {
        let balance = self.explorer.native_balance(address).await?;
        if let Some(label) = self.classifier.registry().lookup(address) {
            debug!("{} ({}) balance: {}", label, address, balance);
        }
        Ok(balance)
    }
}

fn check_price(price_usd: f64) -> Result<(), WhaleTrackerError> {
    if !price_usd.is_finite() || price_usd < 0.0 {
        return Err(WhaleTrackerError::InvalidPrice(price_usd));
    }
    Ok(())
}
