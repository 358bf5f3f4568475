//! Gem Candidates
//!
//! Snapshot of a token captured at discovery time. Every metric slice the
//! scorer reads is optional: `None` means the upstream did not supply it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which discovery strategy surfaced the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Trending,
    NewListing,
    Volume,
    MarketCap,
    SocialBuzz,
}

impl DiscoverySource {
    /// Fixed execution order used by the comprehensive scan
    pub const ALL: [DiscoverySource; 5] = [
        DiscoverySource::Trending,
        DiscoverySource::NewListing,
        DiscoverySource::Volume,
        DiscoverySource::MarketCap,
        DiscoverySource::SocialBuzz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoverySource::Trending => "trending",
            DiscoverySource::NewListing => "new_listing",
            DiscoverySource::Volume => "volume",
            DiscoverySource::MarketCap => "market_cap",
            DiscoverySource::SocialBuzz => "social_buzz",
        }
    }
}

impl std::fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price and supply figures in USD
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price_usd: f64,
    pub market_cap_usd: f64,
    pub volume_24h_usd: f64,
    pub high_24h_usd: Option<f64>,
    pub low_24h_usd: Option<f64>,
    pub price_change_24h_pct: Option<f64>,
    pub price_change_7d_pct: Option<f64>,
    pub price_change_30d_pct: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub ath_usd: Option<f64>,
}

impl MarketSnapshot {
    /// 24h volume / market cap, `None` without a market cap
    pub fn turnover_ratio(&self) -> Option<f64> {
        if self.market_cap_usd > 0.0 {
            Some(self.volume_24h_usd / self.market_cap_usd)
        } else {
            None
        }
    }
}

/// One row of a paged markets listing, before the detail fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketListing {
    pub id: String,
    pub market_cap_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
}

impl MarketListing {
    /// Row with no figures attached
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            market_cap_usd: None,
            volume_24h_usd: None,
        }
    }
}

/// Community reach
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialMetrics {
    pub twitter_followers: u64,
    pub reddit_subscribers: u64,
    pub reddit_active_48h: u64,
    pub telegram_users: u64,
    pub facebook_likes: u64,
}

impl SocialMetrics {
    /// Whether any channel has an audience at all
    pub fn has_presence(&self) -> bool {
        self.twitter_followers > 0 || self.reddit_subscribers > 0
    }

    /// Count of channels above the buzz thresholds
    pub fn buzz_signals(&self) -> u8 {
        [
            self.twitter_followers > 10_000,
            self.reddit_subscribers > 5_000,
            self.reddit_active_48h > 100,
            self.telegram_users > 1_000,
        ]
        .iter()
        .filter(|hit| **hit)
        .count() as u8
    }
}

/// Repository activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeveloperMetrics {
    pub commits_4w: u64,
    pub stars: u64,
    pub forks: u64,
    pub closed_issues: u64,
    pub merged_pull_requests: u64,
}

/// Order-book depth and spread, aggregated over exchange tickers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityMetrics {
    /// 24h volume / market cap
    pub turnover_ratio: Option<f64>,
    /// USD needed to move price +2% plus -2%, summed over venues
    pub depth_2pct_usd: Option<f64>,
    /// Volume-weighted bid/ask spread in percent
    pub bid_ask_spread_pct: Option<f64>,
}

/// Holder distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderMetrics {
    pub holder_count: Option<u64>,
    /// Share of supply held by the ten largest holders, in percent
    pub top10_concentration_pct: Option<f64>,
}

/// Token discovered by the gem finder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Upstream token identifier (dedup key)
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub market: MarketSnapshot,
    /// Days since listing / genesis
    pub listing_age_days: Option<u32>,
    pub social: Option<SocialMetrics>,
    pub developer: Option<DeveloperMetrics>,
    pub liquidity: Option<LiquidityMetrics>,
    pub holders: Option<HolderMetrics>,
    pub source: DiscoverySource,
    pub discovered_at: DateTime<Utc>,
}

impl Candidate {
    /// Holder count if the holder slice carries one
    pub fn holder_count(&self) -> Option<u64> {
        self.holders.as_ref().and_then(|h| h.holder_count)
    }

    /// Same snapshot, attributed to another strategy
    pub fn with_source(mut self, source: DiscoverySource) -> Self {
        self.source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turnover_ratio() {
        let market = MarketSnapshot {
            market_cap_usd: 10_000_000.0,
            volume_24h_usd: 500_000.0,
            ..Default::default()
        };
        assert_eq!(market.turnover_ratio(), Some(0.05));
        assert_eq!(MarketSnapshot::default().turnover_ratio(), None);
    }

    #[test]
    fn test_buzz_signals() {
        let social = SocialMetrics {
            twitter_followers: 20_000,
            reddit_subscribers: 100,
            reddit_active_48h: 150,
            telegram_users: 0,
            facebook_likes: 0,
        };
        assert_eq!(social.buzz_signals(), 2);
        assert!(social.has_presence());
        assert!(!SocialMetrics::default().has_presence());
    }

    #[test]
    fn test_source_order_fixed() {
        assert_eq!(DiscoverySource::ALL[0], DiscoverySource::Trending);
        assert_eq!(DiscoverySource::ALL[4], DiscoverySource::SocialBuzz);
        assert_eq!(DiscoverySource::NewListing.to_string(), "new_listing");
    }
}
