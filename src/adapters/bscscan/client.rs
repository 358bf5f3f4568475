//! BscScan API client
//!
//! Implements [`ChainExplorerPort`] on top of the shared [`ApiClient`].
//! `tokentx` is walked page by page in ascending block order until a short
//! page or `max_pages`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::types::{decode_balance, decode_block_number, decode_tokentx, TransferPage};
use crate::adapters::http::{ApiClient, ApiClientConfig};
use crate::domain::TransferRecord;
use crate::ports::{ApiError, ChainExplorerPort};

pub const DEFAULT_BSCSCAN_URL: &str = "https://api.bscscan.com/api";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 5;
/// The account API returns no rows past `page * offset` of this many
pub const MAX_RESULT_WINDOW: u32 = 10_000;

/// Upper block bound the upstream accepts as "latest"
const END_BLOCK: u64 = 999_999_999;

/// Base client settings for BscScan, with the API key as a query parameter
pub fn api_client_config(base_url: &str, api_key: Option<&str>) -> ApiClientConfig {
    let config = ApiClientConfig::new("bscscan", base_url);
    match api_key.filter(|k| !k.is_empty()) {
        Some(key) => config.with_query("apikey", key),
        None => config,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BscScanConfig {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for BscScanConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

#[derive(Debug)]
pub struct BscScanClient {
    api: Arc<ApiClient>,
    config: BscScanConfig,
    quarantined: AtomicU64,
}

impl BscScanClient {
    pub fn new(api: Arc<ApiClient>, config: BscScanConfig) -> Self {
        Self {
            api,
            config,
            quarantined: AtomicU64::new(0),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Rows dropped by schema validation since creation
    pub fn quarantined(&self) -> u64 {
        self.quarantined.load(Ordering::Relaxed)
    }

    async fn fetch_page(
        &self,
        contract: &str,
        start_block: u64,
        page: u32,
    ) -> Result<TransferPage, ApiError> {
        let params = [
            ("module", "account".to_string()),
            ("action", "tokentx".to_string()),
            ("contractaddress", contract.to_string()),
            ("startblock", start_block.to_string()),
            ("endblock", END_BLOCK.to_string()),
            ("page", page.to_string()),
            ("offset", self.config.page_size.to_string()),
            ("sort", "asc".to_string()),
        ];
        self.api.fetch_with("", &params, decode_tokentx).await
    }
}

#[async_trait]
impl ChainExplorerPort for BscScanClient {
    async fn token_transfers(
        &self,
        contract: &str,
        since_block: Option<u64>,
    ) -> Result<Vec<TransferRecord>, ApiError> {
        let start_block = since_block.unwrap_or(0);
        let mut records = Vec::new();
        let mut quarantined = 0;

        for page in 1..=self.config.max_pages.max(1) {
            let batch = self.fetch_page(contract, start_block, page).await?;
            debug!(
                "tokentx {} page {}: {} rows, {} quarantined",
                contract, page, batch.row_count, batch.quarantined
            );
            quarantined += batch.quarantined;
            records.extend(batch.records);

            if batch.row_count < self.config.page_size as usize {
                break;
            }
        }

        if quarantined > 0 {
            self.quarantined
                .fetch_add(quarantined as u64, Ordering::Relaxed);
        }
        info!(
            "Fetched {} transfers for {} from block {} ({} quarantined)",
            records.len(),
            contract,
            start_block,
            quarantined
        );
        Ok(records)
    }

    async fn native_balance(&self, address: &str) -> Result<f64, ApiError> {
        let params = [
            ("module", "account".to_string()),
            ("action", "balance".to_string()),
            ("address", address.to_string()),
            ("tag", "latest".to_string()),
        ];
        self.api.fetch_with("", &params, decode_balance).await
    }

    async fn latest_block(&self) -> Result<u64, ApiError> {
        let params = [
            ("module", "proxy".to_string()),
            ("action", "eth_blockNumber".to_string()),
        ];
        self.api.fetch_with("", &params, decode_block_number).await
    }
}
