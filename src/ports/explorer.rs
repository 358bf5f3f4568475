//! Chain explorer port
//!
//! Source of raw token transfers and wallet balances for a BSC-style chain.

use async_trait::async_trait;

use super::ApiError;
use crate::domain::TransferRecord;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainExplorerPort: Send + Sync {
    /// Transfers of `contract`, oldest first, optionally starting at `since_block`
    async fn token_transfers(
        &self,
        contract: &str,
        since_block: Option<u64>,
    ) -> Result<Vec<TransferRecord>, ApiError>;

    /// Native coin balance of `address`, in whole units
    async fn native_balance(&self, address: &str) -> Result<f64, ApiError>;

    /// Most recent block number
    async fn latest_block(&self) -> Result<u64, ApiError>;
}
