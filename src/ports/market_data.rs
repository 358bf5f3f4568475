//! Market data port
//!
//! Listing feeds and per-coin detail used by the gem finder.

use async_trait::async_trait;

use super::ApiError;
use crate::domain::{Candidate, DiscoveryFilters, DiscoverySource, MarketListing};

/// Sort order for the paged markets listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketOrder {
    VolumeDesc,
    MarketCapDesc,
}

impl MarketOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            MarketOrder::VolumeDesc => "volume_desc",
            MarketOrder::MarketCapDesc => "market_cap_desc",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Token ids currently trending
    async fn trending_ids(&self) -> Result<Vec<String>, ApiError>;

    /// Up to `limit` rows from the markets listing in `order` that pass the
    /// listing-level bounds of `filters`
    ///
    /// Pages are walked until `limit` rows pass or the listing runs out.
    async fn market_listings(
        &self,
        order: MarketOrder,
        filters: &DiscoveryFilters,
        limit: usize,
    ) -> Result<Vec<MarketListing>, ApiError>;

    /// Up to `limit` most recently listed token ids
    async fn new_listing_ids(&self, limit: usize) -> Result<Vec<String>, ApiError>;

    /// Full snapshot of one token
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    async fn candidate(&self, id: &str, source: DiscoverySource) -> Result<Candidate, ApiError>;
}
