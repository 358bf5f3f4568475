//! CoinGecko wire schema, version `coingecko.*.v1`
//!
//! Listing endpoints return arrays whose rows are validated one by one;
//! invalid rows are quarantined. The coin detail endpoint is a single
//! object and any schema failure there is a decode error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{
    Candidate, DeveloperMetrics, DiscoverySource, LiquidityMetrics, MarketListing, MarketSnapshot,
    SocialMetrics,
};
use crate::ports::ApiError;

pub const TRENDING_SCHEMA: &str = "coingecko.trending.v1";
pub const MARKETS_SCHEMA: &str = "coingecko.markets.v1";
pub const NEW_LISTINGS_SCHEMA: &str = "coingecko.list_new.v1";
pub const COIN_SCHEMA: &str = "coingecko.coin.v1";

/// Rows of one listing response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage<T> {
    pub rows: Vec<T>,
    /// Rows received, valid or not
    pub row_count: usize,
    pub quarantined: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct TrendingEntry {
    item: TrendingCoin,
}

#[derive(Debug, Clone, Deserialize)]
struct TrendingCoin {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketRow {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
}

impl MarketRow {
    pub fn into_listing(self) -> MarketListing {
        MarketListing {
            id: self.id,
            market_cap_usd: self.market_cap,
            volume_24h_usd: self.total_volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewListingRow {
    pub id: String,
    /// Unix seconds of the listing
    #[serde(default)]
    pub activated_at: Option<i64>,
}

fn parse_value(body: &str, schema: &str) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Decode(format!("{}: {}", schema, e)))?;
    check_error_body(&value)?;
    Ok(value)
}

/// Error objects sometimes arrive with a 200 status
fn check_error_body(value: &Value) -> Result<(), ApiError> {
    if let Some(status) = value.get("status") {
        if let Some(code) = status.get("error_code").and_then(Value::as_u64) {
            let message = status
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(if code == 429 {
                ApiError::RateLimited(message)
            } else {
                ApiError::Upstream(format!("{}: {}", code, message))
            });
        }
    }
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(if message.to_ascii_lowercase().contains("not found") {
            ApiError::NotFound(message.to_string())
        } else {
            ApiError::Upstream(message.to_string())
        });
    }
    Ok(())
}

fn validate_rows<T, F>(rows: Vec<Value>, schema: &str, id_of: F) -> ListingPage<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> &str,
{
    let mut page = ListingPage {
        rows: Vec::with_capacity(rows.len()),
        row_count: rows.len(),
        quarantined: 0,
    };
    for row in rows {
        match serde_json::from_value::<T>(row) {
            Ok(parsed) if !id_of(&parsed).trim().is_empty() => page.rows.push(parsed),
            Ok(_) => {
                page.quarantined += 1;
                warn!("Quarantined {} row: empty id", schema);
            }
            Err(e) => {
                page.quarantined += 1;
                warn!("Quarantined {} row: {}", schema, e);
            }
        }
    }
    page
}

fn into_array(value: Value, schema: &str) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(rows) => Ok(rows),
        _ => Err(ApiError::Decode(format!("{}: expected an array", schema))),
    }
}

pub fn decode_trending(body: &str) -> Result<ListingPage<String>, ApiError> {
    let mut value = parse_value(body, TRENDING_SCHEMA)?;
    let coins = value
        .get_mut("coins")
        .map(Value::take)
        .unwrap_or(Value::Null);
    let coins = into_array(coins, TRENDING_SCHEMA)?;
    let page = validate_rows::<TrendingEntry, _>(coins, TRENDING_SCHEMA, |e| &e.item.id);
    Ok(ListingPage {
        rows: page.rows.into_iter().map(|e| e.item.id).collect(),
        row_count: page.row_count,
        quarantined: page.quarantined,
    })
}

pub fn decode_markets(body: &str) -> Result<ListingPage<MarketRow>, ApiError> {
    let value = parse_value(body, MARKETS_SCHEMA)?;
    let rows = into_array(value, MARKETS_SCHEMA)?;
    Ok(validate_rows(rows, MARKETS_SCHEMA, |r: &MarketRow| &r.id))
}

pub fn decode_new_listings(body: &str) -> Result<ListingPage<NewListingRow>, ApiError> {
    let value = parse_value(body, NEW_LISTINGS_SCHEMA)?;
    let rows = into_array(value, NEW_LISTINGS_SCHEMA)?;
    Ok(validate_rows(rows, NEW_LISTINGS_SCHEMA, |r: &NewListingRow| &r.id))
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CurrencyMap {
    usd: Option<f64>,
}

fn usd(map: &Option<CurrencyMap>) -> Option<f64> {
    map.as_ref().and_then(|m| m.usd)
}

#[derive(Debug, Clone, Deserialize)]
struct MarketData {
    current_price: Option<CurrencyMap>,
    market_cap: Option<CurrencyMap>,
    total_volume: Option<CurrencyMap>,
    #[serde(default)]
    high_24h: Option<CurrencyMap>,
    #[serde(default)]
    low_24h: Option<CurrencyMap>,
    #[serde(default)]
    ath: Option<CurrencyMap>,
    #[serde(default)]
    price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    price_change_percentage_7d: Option<f64>,
    #[serde(default)]
    price_change_percentage_30d: Option<f64>,
    #[serde(default)]
    circulating_supply: Option<f64>,
    #[serde(default)]
    total_supply: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommunityData {
    facebook_likes: Option<u64>,
    twitter_followers: Option<u64>,
    reddit_subscribers: Option<u64>,
    reddit_accounts_active_48h: Option<u64>,
    telegram_channel_user_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct DeveloperData {
    forks: Option<u64>,
    stars: Option<u64>,
    closed_issues: Option<u64>,
    pull_requests_merged: Option<u64>,
    commit_count_4_weeks: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct Ticker {
    #[serde(default)]
    bid_ask_spread_percentage: Option<f64>,
    #[serde(default)]
    cost_to_move_up_usd: Option<f64>,
    #[serde(default)]
    cost_to_move_down_usd: Option<f64>,
    #[serde(default)]
    converted_volume: Option<CurrencyMap>,
}

/// `coins/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub genesis_date: Option<String>,
    market_data: Option<MarketData>,
    #[serde(default)]
    community_data: Option<CommunityData>,
    #[serde(default)]
    developer_data: Option<DeveloperData>,
    #[serde(default)]
    tickers: Vec<Ticker>,
}

pub fn decode_coin(body: &str) -> Result<CoinDetail, ApiError> {
    let value = parse_value(body, COIN_SCHEMA)?;
    serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{}: {}", COIN_SCHEMA, e)))
}

impl CoinDetail {
    /// Build the candidate snapshot captured at `now`
    ///
    /// `activated_at` (from the new-listings feed) stands in for a missing
    /// genesis date when computing listing age.
    pub fn into_candidate(
        self,
        source: DiscoverySource,
        now: DateTime<Utc>,
        activated_at: Option<i64>,
    ) -> Result<Candidate, ApiError> {
        let market_data = self
            .market_data
            .ok_or_else(|| ApiError::Decode(format!("{}: {} has no market_data", COIN_SCHEMA, self.id)))?;
        let price_usd = usd(&market_data.current_price).ok_or_else(|| {
            ApiError::Decode(format!("{}: {} has no current_price.usd", COIN_SCHEMA, self.id))
        })?;

        let market = MarketSnapshot {
            price_usd,
            market_cap_usd: usd(&market_data.market_cap).unwrap_or(0.0),
            volume_24h_usd: usd(&market_data.total_volume).unwrap_or(0.0),
            high_24h_usd: usd(&market_data.high_24h),
            low_24h_usd: usd(&market_data.low_24h),
            price_change_24h_pct: market_data.price_change_percentage_24h,
            price_change_7d_pct: market_data.price_change_percentage_7d,
            price_change_30d_pct: market_data.price_change_percentage_30d,
            circulating_supply: market_data.circulating_supply,
            total_supply: market_data.total_supply,
            ath_usd: usd(&market_data.ath),
        };

        let listing_age_days = listing_age_days(self.genesis_date.as_deref(), activated_at, now);
        let liquidity = Some(aggregate_liquidity(&self.tickers, &market));

        let social = self.community_data.map(|c| SocialMetrics {
            twitter_followers: c.twitter_followers.unwrap_or(0),
            reddit_subscribers: c.reddit_subscribers.unwrap_or(0),
            reddit_active_48h: c.reddit_accounts_active_48h.unwrap_or(0),
            telegram_users: c.telegram_channel_user_count.unwrap_or(0),
            facebook_likes: c.facebook_likes.unwrap_or(0),
        });
        let developer = self.developer_data.map(|d| DeveloperMetrics {
            commits_4w: d.commit_count_4_weeks.unwrap_or(0),
            stars: d.stars.unwrap_or(0),
            forks: d.forks.unwrap_or(0),
            closed_issues: d.closed_issues.unwrap_or(0),
            merged_pull_requests: d.pull_requests_merged.unwrap_or(0),
        });

        Ok(Candidate {
            id: self.id,
            symbol: self.symbol.to_uppercase(),
            name: self.name,
            market,
            listing_age_days,
            social,
            developer,
            liquidity,
            // not published by this upstream
            holders: None,
            source,
            discovered_at: now,
        })
    }
}

fn listing_age_days(
    genesis_date: Option<&str>,
    activated_at: Option<i64>,
    now: DateTime<Utc>,
) -> Option<u32> {
    let days = if let Some(date) = genesis_date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
        (now.date_naive() - date).num_days()
    } else {
        let listed = activated_at.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))?;
        (now - listed).num_days()
    };
    u32::try_from(days.max(0)).ok()
}

/// Depth summed over venues, spread weighted by venue volume
fn aggregate_liquidity(tickers: &[Ticker], market: &MarketSnapshot) -> LiquidityMetrics {
    let mut depth: Option<f64> = None;
    let mut weighted_spread: f64 = 0.0;
    let mut weight_total: f64 = 0.0;
    let mut plain_spreads = Vec::new();

    for ticker in tickers {
        if let (Some(up), Some(down)) = (ticker.cost_to_move_up_usd, ticker.cost_to_move_down_usd) {
            *depth.get_or_insert(0.0) += up + down;
        }
        if let Some(spread) = ticker.bid_ask_spread_percentage.filter(|s| s.is_finite() && *s >= 0.0) {
            plain_spreads.push(spread);
            if let Some(volume) = usd(&ticker.converted_volume).filter(|v| *v > 0.0) {
                weighted_spread += spread * volume;
                weight_total += volume;
            }
        }
    }

    let bid_ask_spread_pct = if weight_total > 0.0 {
        Some(weighted_spread / weight_total)
    } else if !plain_spreads.is_empty() {
        Some(plain_spreads.iter().sum::<f64>() / plain_spreads.len() as f64)
    } else {
        None
    };

    LiquidityMetrics {
        turnover_ratio: market.turnover_ratio(),
        depth_2pct_usd: depth,
        bid_ask_spread_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_body_rate_limit() {
        let body = r#"{"status":{"error_code":429,"error_message":"You've exceeded the Rate Limit"}}"#;
        assert!(matches!(decode_markets(body), Err(ApiError::RateLimited(_))));
    }

    #[test]
    fn test_error_body_not_found() {
        assert!(matches!(
            decode_coin(r#"{"error":"coin not found"}"#),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_markets_quarantine_rows_without_id() {
        let body = r#"[{"id":"a","symbol":"a","name":"A"},{"symbol":"b"},{"id":"","symbol":"c","name":"C"}]"#;
        let page = decode_markets(body).unwrap();
        assert_eq!(page.row_count, 3);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.quarantined, 2);
    }

    #[test]
    fn test_listing_age_prefers_genesis_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(listing_age_days(Some("2024-03-01"), None, now), Some(30));

        let ten_days_ago = (now - chrono::Duration::days(10)).timestamp();
        assert_eq!(listing_age_days(None, Some(ten_days_ago), now), Some(10));
        assert_eq!(listing_age_days(Some("garbage"), None, now), None);
    }

    #[test]
    fn test_spread_weighted_by_volume() {
        let tickers = vec![
            Ticker {
                bid_ask_spread_percentage: Some(1.0),
                cost_to_move_up_usd: Some(100.0),
                cost_to_move_down_usd: Some(50.0),
                converted_volume: Some(CurrencyMap { usd: Some(3_000.0) }),
            },
            Ticker {
                bid_ask_spread_percentage: Some(3.0),
                cost_to_move_up_usd: None,
                cost_to_move_down_usd: Some(10.0),
                converted_volume: Some(CurrencyMap { usd: Some(1_000.0) }),
            },
        ];
        let liquidity = aggregate_liquidity(&tickers, &MarketSnapshot::default());
        assert_eq!(liquidity.depth_2pct_usd, Some(150.0));
        assert_eq!(liquidity.bid_ask_spread_pct, Some(1.5));
        assert_eq!(liquidity.turnover_ratio, None);
    }

    #[test]
    fn test_missing_market_data_is_decode_error() {
        let detail = decode_coin(r#"{"id":"x","symbol":"x","name":"X"}"#).unwrap();
        assert!(matches!(
            detail.into_candidate(DiscoverySource::Trending, Utc::now(), None),
            Err(ApiError::Decode(_))
        ));
    }
}
