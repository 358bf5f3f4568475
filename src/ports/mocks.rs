//! In-memory port implementations for unit tests
//!
//! Each fake records the calls it receives and answers from responses
//! configured through builder methods.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ApiError, ChainExplorerPort, MarketDataPort, MarketOrder};
use crate::domain::{Candidate, DiscoveryFilters, DiscoverySource, MarketListing, TransferRecord};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock chain explorer keyed by contract / address
#[derive(Debug, Default, Clone)]
pub struct MockExplorer {
    calls: Arc<Mutex<Vec<String>>>,
    transfers: Arc<Mutex<HashMap<String, Vec<TransferRecord>>>>,
    balances: Arc<Mutex<HashMap<String, f64>>>,
    latest_block: Arc<Mutex<u64>>,
    failure: Arc<Mutex<Option<ApiError>>>,
}

impl MockExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the transfers returned for a contract
    pub fn with_transfers(self, contract: &str, records: Vec<TransferRecord>) -> Self {
        locked(&self.transfers).insert(contract.to_lowercase(), records);
        self
    }

    pub fn with_balance(self, address: &str, balance: f64) -> Self {
        locked(&self.balances).insert(address.to_lowercase(), balance);
        self
    }

    pub fn with_latest_block(self, block: u64) -> Self {
        *locked(&self.latest_block) = block;
        self
    }

    /// Every call fails with `error`
    pub fn failing_with(self, error: ApiError) -> Self {
        *locked(&self.failure) = Some(error);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl ChainExplorerPort for MockExplorer {
    async fn token_transfers(
        &self,
        contract: &str,
        since_block: Option<u64>,
    ) -> Result<Vec<TransferRecord>, ApiError> {
        locked(&self.calls).push(format!("tokentx:{}", contract));
        if let Some(err) = locked(&self.failure).clone() {
            return Err(err);
        }
        let records = locked(&self.transfers)
            .get(&contract.to_lowercase())
            .cloned()
            .unwrap_or_default();
        Ok(records
            .into_iter()
            .filter(|r| since_block.map_or(true, |b| r.block_number >= b))
            .collect())
    }

    async fn native_balance(&self, address: &str) -> Result<f64, ApiError> {
        locked(&self.calls).push(format!("balance:{}", address));
        if let Some(err) = locked(&self.failure).clone() {
            return Err(err);
        }
        Ok(locked(&self.balances)
            .get(&address.to_lowercase())
            .copied()
            .unwrap_or(0.0))
    }

    async fn latest_block(&self) -> Result<u64, ApiError> {
        locked(&self.calls).push("blocknumber".to_string());
        if let Some(err) = locked(&self.failure).clone() {
            return Err(err);
        }
        Ok(*locked(&self.latest_block))
    }
}

/// Mock market data feed with per-listing id lists and coin details
#[derive(Debug, Default, Clone)]
pub struct MockMarketData {
    calls: Arc<Mutex<Vec<String>>>,
    listings: Arc<Mutex<HashMap<String, Vec<MarketListing>>>>,
    details: Arc<Mutex<HashMap<String, Candidate>>>,
    failing_listings: Arc<Mutex<HashMap<String, ApiError>>>,
}

const TRENDING: &str = "trending";
const NEW_LISTINGS: &str = "new";

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trending(self, ids: &[&str]) -> Self {
        self.set_listing(TRENDING, ids);
        self
    }

    pub fn with_new_listings(self, ids: &[&str]) -> Self {
        self.set_listing(NEW_LISTINGS, ids);
        self
    }

    /// Markets listing rows without cap or volume figures
    pub fn with_markets(self, order: MarketOrder, ids: &[&str]) -> Self {
        self.set_listing(order.as_param(), ids);
        self
    }

    pub fn with_market_rows(self, order: MarketOrder, rows: Vec<MarketListing>) -> Self {
        locked(&self.listings).insert(order.as_param().to_string(), rows);
        self
    }

    /// Builder method to set the detail snapshot for a token
    pub fn with_candidate(self, candidate: Candidate) -> Self {
        locked(&self.details).insert(candidate.id.clone(), candidate);
        self
    }

    /// Make the trending listing fail with `error`
    pub fn with_trending_failure(self, error: ApiError) -> Self {
        locked(&self.failing_listings).insert(TRENDING.to_string(), error);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        locked(&self.calls).clone()
    }

    fn set_listing(&self, key: &str, ids: &[&str]) {
        locked(&self.listings).insert(
            key.to_string(),
            ids.iter().map(|id| MarketListing::bare(*id)).collect(),
        );
    }

    fn listing(&self, key: &str) -> Result<Vec<MarketListing>, ApiError> {
        locked(&self.calls).push(key.to_string());
        if let Some(err) = locked(&self.failing_listings).get(key) {
            return Err(err.clone());
        }
        Ok(locked(&self.listings).get(key).cloned().unwrap_or_default())
    }

    fn listing_ids(&self, key: &str, limit: Option<usize>) -> Result<Vec<String>, ApiError> {
        let rows = self.listing(key)?;
        let limit = limit.unwrap_or(rows.len());
        Ok(rows.into_iter().take(limit).map(|row| row.id).collect())
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn trending_ids(&self) -> Result<Vec<String>, ApiError> {
        self.listing_ids(TRENDING, None)
    }

    async fn market_listings(
        &self,
        order: MarketOrder,
        filters: &DiscoveryFilters,
        limit: usize,
    ) -> Result<Vec<MarketListing>, ApiError> {
        let rows = self.listing(order.as_param())?;
        Ok(rows
            .into_iter()
            .filter(|row| filters.admits_listing(row))
            .take(limit)
            .collect())
    }

    async fn new_listing_ids(&self, limit: usize) -> Result<Vec<String>, ApiError> {
        self.listing_ids(NEW_LISTINGS, Some(limit))
    }

    async fn candidate(&self, id: &str, source: DiscoverySource) -> Result<Candidate, ApiError> {
        locked(&self.calls).push(format!("coin:{}", id));
        locked(&self.details)
            .get(id)
            .cloned()
            .map(|c| c.with_source(source))
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_market_data_listing_and_missing_coin() {
        let mock = MockMarketData::new().with_trending(&["a", "b"]);

        assert_eq!(mock.trending_ids().await, Ok(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(
            mock.candidate("a", DiscoverySource::Trending).await,
            Err(ApiError::NotFound("a".to_string()))
        );
        assert_eq!(mock.get_calls(), vec!["trending".to_string(), "coin:a".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_market_rows_apply_listing_bounds() {
        let rows = vec![
            MarketListing {
                id: "bitcoin".to_string(),
                market_cap_usd: Some(1.3e12),
                volume_24h_usd: Some(3.0e10),
            },
            MarketListing::bare("unpriced"),
        ];
        let mock = MockMarketData::new().with_market_rows(MarketOrder::MarketCapDesc, rows);

        let listed = mock
            .market_listings(MarketOrder::MarketCapDesc, &DiscoveryFilters::default(), 5)
            .await
            .unwrap();
        assert_eq!(listed, vec![MarketListing::bare("unpriced")]);
        assert_eq!(mock.get_calls(), vec!["market_cap_desc".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_explorer_failure() {
        let mock = MockExplorer::new().failing_with(ApiError::Network("down".into()));
        assert!(mock.token_transfers("0xabc", None).await.is_err());
        assert_eq!(mock.get_calls(), vec!["tokentx:0xabc".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_explorer_latest_block() {
        let mock = MockExplorer::new().with_latest_block(34_120_689);
        assert_eq!(mock.latest_block().await, Ok(34_120_689));
        assert_eq!(mock.get_calls(), vec!["blocknumber".to_string()]);
    }
}
