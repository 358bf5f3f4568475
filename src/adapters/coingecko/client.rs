//! CoinGecko API client
//!
//! Implements [`MarketDataPort`] on top of the shared [`ApiClient`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::types::{
    decode_coin, decode_markets, decode_new_listings, decode_trending, ListingPage, MarketRow,
};
use crate::adapters::http::{ApiClient, ApiClientConfig};
use crate::domain::{Candidate, DiscoveryFilters, DiscoverySource, MarketListing};
use crate::ports::{ApiError, MarketDataPort, MarketOrder};

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Upstream cap on `per_page`
pub const MAX_PER_PAGE: usize = 250;
pub const DEFAULT_MARKET_MAX_PAGES: u32 = 4;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

#[derive(Debug, Clone, PartialEq)]
pub struct CoinGeckoConfig {
    pub vs_currency: String,
    pub max_pages: u32,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            max_pages: DEFAULT_MARKET_MAX_PAGES,
        }
    }
}

/// Base client settings for CoinGecko, with the optional demo key header
pub fn api_client_config(base_url: &str, api_key: Option<&str>) -> ApiClientConfig {
    let config = ApiClientConfig::new("coingecko", base_url);
    match api_key.filter(|k| !k.is_empty()) {
        Some(key) => config.with_header(API_KEY_HEADER, key),
        None => config,
    }
}

#[derive(Debug)]
pub struct CoinGeckoClient {
    api: Arc<ApiClient>,
    config: CoinGeckoConfig,
    /// Listing timestamps seen on the new-listings feed
    activations: Mutex<HashMap<String, i64>>,
    quarantined: AtomicU64,
}

impl CoinGeckoClient {
    pub fn new(api: Arc<ApiClient>, config: CoinGeckoConfig) -> Self {
        Self {
            api,
            config,
            activations: Mutex::new(HashMap::new()),
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

    fn note_quarantine<T>(&self, page: &ListingPage<T>) {
        if page.quarantined > 0 {
            self.quarantined
                .fetch_add(page.quarantined as u64, Ordering::Relaxed);
        }
    }

    fn activation(&self, id: &str) -> Option<i64> {
        self.activations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .copied()
    }
}

#[async_trait]
impl MarketDataPort for CoinGeckoClient {
    async fn trending_ids(&self) -> Result<Vec<String>, ApiError> {
        let page = self
            .api
            .fetch_with("search/trending", &[], decode_trending)
            .await?;
        self.note_quarantine(&page);
        debug!("Trending: {} ids", page.rows.len());
        Ok(page.rows)
    }

    async fn market_listings(
        &self,
        order: MarketOrder,
        filters: &DiscoveryFilters,
        limit: usize,
    ) -> Result<Vec<MarketListing>, ApiError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut listings = Vec::with_capacity(limit);
        let mut scanned = 0usize;

        for page_no in 1..=self.config.max_pages.max(1) {
            let params = [
                ("vs_currency", self.config.vs_currency.clone()),
                ("order", order.as_param().to_string()),
                ("per_page", MAX_PER_PAGE.to_string()),
                ("page", page_no.to_string()),
                ("sparkline", "false".to_string()),
            ];
            let page = self
                .api
                .fetch_with("coins/markets", &params, decode_markets)
                .await?;
            self.note_quarantine(&page);
            scanned += page.row_count;

            listings.extend(
                page.rows
                    .into_iter()
                    .map(MarketRow::into_listing)
                    .filter(|listing| filters.admits_listing(listing)),
            );
            if listings.len() >= limit || page.row_count < MAX_PER_PAGE {
                break;
            }
        }

        listings.truncate(limit);
        info!(
            "Markets ({}): {} of {} rows in range",
            order.as_param(),
            listings.len(),
            scanned
        );
        Ok(listings)
    }

    async fn new_listing_ids(&self, limit: usize) -> Result<Vec<String>, ApiError> {
        let page = self
            .api
            .fetch_with("coins/list/new", &[], decode_new_listings)
            .await?;
        self.note_quarantine(&page);

        let mut activations = self
            .activations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let ids: Vec<String> = page
            .rows
            .into_iter()
            .take(limit)
            .map(|row| {
                if let Some(ts) = row.activated_at {
                    activations.insert(row.id.clone(), ts);
                }
                row.id
            })
            .collect();
        debug!("New listings: {} ids", ids.len());
        Ok(ids)
    }

    async fn candidate(&self, id: &str, source: DiscoverySource) -> Result<Candidate, ApiError> {
        let params = [
            ("localization", "false".to_string()),
            ("tickers", "true".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "true".to_string()),
            ("developer_data", "true".to_string()),
            ("sparkline", "false".to_string()),
        ];
        let endpoint = format!("coins/{}", id);
        let detail = self.api.fetch_with(&endpoint, &params, decode_coin).await?;
        detail.into_candidate(source, Utc::now(), self.activation(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::client::tests::{client_with, ScriptedTransport, Step};
    use crate::adapters::http::HttpResponse;

    fn client(transport: Arc<ScriptedTransport>, max_pages: u32) -> CoinGeckoClient {
        CoinGeckoClient::new(
            Arc::new(client_with(transport)),
            CoinGeckoConfig {
                max_pages,
                ..CoinGeckoConfig::default()
            },
        )
    }

    fn markets(ids: &[&str]) -> String {
        let rows: Vec<(&str, f64)> = ids.iter().map(|id| (*id, 20_000_000.0)).collect();
        markets_with_caps(&rows)
    }

    fn markets_with_caps(rows: &[(&str, f64)]) -> String {
        let rows: Vec<String> = rows
            .iter()
            .map(|(id, cap)| {
                format!(
                    r#"{{"id":"{id}","symbol":"{id}","name":"{id}","market_cap":{cap},"total_volume":{}}}"#,
                    cap / 10.0
                )
            })
            .collect();
        format!("[{}]", rows.join(","))
    }

    fn ids(listings: &[MarketListing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_market_listings_stop_on_short_page() {
        let transport = ScriptedTransport::ok(&[&markets(&["a", "b"]), &markets(&["c", "d"])]);
        let gecko = client(transport.clone(), 5);

        let rows = gecko
            .market_listings(MarketOrder::VolumeDesc, &DiscoveryFilters::default(), 3)
            .await
            .unwrap();

        assert_eq!(ids(&rows), vec!["a", "b"]);
        assert_eq!(rows[0].market_cap_usd, Some(20_000_000.0));
        assert_eq!(transport.request_count(), 1);
        let requests = transport.requests.lock().unwrap();
        assert!(requests[0].0.ends_with("/coins/markets"));
        assert!(requests[0].1.contains(&("order".to_string(), "volume_desc".to_string())));
        assert!(requests[0].1.contains(&("per_page".to_string(), "250".to_string())));
    }

    #[tokio::test]
    async fn test_market_listings_walk_full_pages() {
        let first: Vec<String> = (0..MAX_PER_PAGE).map(|i| format!("coin-{}", i)).collect();
        let first: Vec<&str> = first.iter().map(String::as_str).collect();
        let transport = ScriptedTransport::ok(&[&markets(&first), &markets(&["x", "y", "z"])]);
        let gecko = client(transport.clone(), 5);

        let rows = gecko
            .market_listings(MarketOrder::MarketCapDesc, &DiscoveryFilters::default(), 252)
            .await
            .unwrap();

        assert_eq!(rows.len(), 252);
        assert_eq!(rows[0].id, "coin-0");
        assert_eq!(rows[251].id, "y");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_market_listings_skip_out_of_range_rows() {
        // a full page of large caps, then the in-range tail
        let mut first: Vec<(String, f64)> = vec![
            ("bitcoin".to_string(), 1.3e12),
            ("ethereum".to_string(), 4.0e11),
            ("bnb".to_string(), 8.0e10),
        ];
        first.extend((3..MAX_PER_PAGE).map(|i| (format!("large-{}", i), 5.0e9)));
        let first: Vec<(&str, f64)> = first.iter().map(|(id, cap)| (id.as_str(), *cap)).collect();
        let second = markets_with_caps(&[("smallgem", 20_000_000.0), ("dust", 10_000.0)]);
        let transport = ScriptedTransport::ok(&[&markets_with_caps(&first), &second]);
        let gecko = client(transport.clone(), 5);

        let rows = gecko
            .market_listings(MarketOrder::MarketCapDesc, &DiscoveryFilters::default(), 3)
            .await
            .unwrap();

        assert_eq!(ids(&rows), vec!["smallgem"]);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_market_listings_respect_page_budget() {
        let big: Vec<(String, f64)> = (0..MAX_PER_PAGE).map(|i| (format!("big-{}", i), 5.0e9)).collect();
        let big: Vec<(&str, f64)> = big.iter().map(|(id, cap)| (id.as_str(), *cap)).collect();
        let page = markets_with_caps(&big);
        let transport = ScriptedTransport::ok(&[&page, &page, &page]);
        let gecko = client(transport.clone(), 2);

        let rows = gecko
            .market_listings(MarketOrder::VolumeDesc, &DiscoveryFilters::default(), 10)
            .await
            .unwrap();

        assert!(rows.is_empty());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_trending_ids() {
        let body = r#"{"coins":[{"item":{"id":"pepe","name":"Pepe"}},{"item":{"name":"no id"}}]}"#;
        let gecko = client(ScriptedTransport::ok(&[body]), 1);

        assert_eq!(gecko.trending_ids().await.unwrap(), vec!["pepe"]);
        assert_eq!(gecko.quarantined(), 1);
    }

    #[tokio::test]
    async fn test_new_listing_activation_feeds_age() {
        let now = Utc::now().timestamp();
        let listing = format!(r#"[{{"id":"fresh","activated_at":{}}}]"#, now - 3 * 86_400);
        let detail = r#"{"id":"fresh","symbol":"frs","name":"Fresh",
            "market_data":{"current_price":{"usd":0.1},"market_cap":{"usd":2000000},"total_volume":{"usd":300000}}}"#;
        let gecko = client(ScriptedTransport::ok(&[listing.as_str(), detail]), 1);

        let ids = gecko.new_listing_ids(10).await.unwrap();
        let candidate = gecko.candidate(&ids[0], DiscoverySource::NewListing).await.unwrap();

        assert_eq!(candidate.symbol, "FRS");
        assert_eq!(candidate.listing_age_days, Some(3));
        assert_eq!(candidate.source, DiscoverySource::NewListing);
    }

    #[tokio::test]
    async fn test_unknown_coin_is_not_found() {
        let transport = ScriptedTransport::new(vec![Step::Respond(HttpResponse {
            status: 404,
            body: r#"{"error":"coin not found"}"#.into(),
        })]);
        let gecko = client(transport, 1);

        let err = gecko.candidate("nope", DiscoverySource::Trending).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
