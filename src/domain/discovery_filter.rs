//! Discovery Filters
//!
//! Conjunctive predicate applied to every candidate a strategy captures.
//! A bound of zero is inactive. When a bound is active and the candidate
//! lacks the metric it needs, the candidate fails that bound.

use serde::Deserialize;
use thiserror::Error;

use super::candidate::{Candidate, MarketListing};

pub const DEFAULT_MIN_MARKET_CAP_USD: f64 = 1_000_000.0;
pub const DEFAULT_MAX_MARKET_CAP_USD: f64 = 100_000_000.0;
pub const DEFAULT_MIN_VOLUME_24H_USD: f64 = 100_000.0;
/// Off: the market data source carries no holder counts
pub const DEFAULT_MIN_HOLDERS: u64 = 0;
pub const DEFAULT_MIN_AGE_DAYS: u32 = 7;
pub const DEFAULT_MAX_AGE_DAYS: u32 = 90;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("min_market_cap_usd ({min}) exceeds max_market_cap_usd ({max})")]
    InvertedMarketCap { min: f64, max: f64 },

    #[error("min_age_days ({min}) exceeds max_age_days ({max})")]
    InvertedAge { min: u32, max: u32 },

    #[error("Filter bound must be finite and non-negative: {0}")]
    InvalidBound(&'static str),
}

/// Which bound rejected a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRejection {
    MarketCapBelowMin,
    MarketCapAboveMax,
    VolumeBelowMin,
    HoldersBelowMin,
    HoldersMissing,
    TooYoung,
    TooOld,
    AgeMissing,
    TurnoverBelowMin,
    TurnoverMissing,
    NoSocialPresence,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiscoveryFilters {
    pub min_market_cap_usd: f64,
    pub max_market_cap_usd: f64,
    pub min_volume_24h_usd: f64,
    pub min_holders: u64,
    pub min_age_days: u32,
    pub max_age_days: u32,
    /// 24h volume as a percent of market cap
    pub min_turnover_pct: f64,
    /// Reject tokens with neither twitter followers nor reddit subscribers
    pub require_social_presence: bool,
}

impl Default for DiscoveryFilters {
    fn default() -> Self {
        Self {
            min_market_cap_usd: DEFAULT_MIN_MARKET_CAP_USD,
            max_market_cap_usd: DEFAULT_MAX_MARKET_CAP_USD,
            min_volume_24h_usd: DEFAULT_MIN_VOLUME_24H_USD,
            min_holders: DEFAULT_MIN_HOLDERS,
            min_age_days: DEFAULT_MIN_AGE_DAYS,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            min_turnover_pct: 0.0,
            require_social_presence: false,
        }
    }
}

impl DiscoveryFilters {
    /// Filters with every bound disabled
    pub fn unbounded() -> Self {
        Self {
            min_market_cap_usd: 0.0,
            max_market_cap_usd: 0.0,
            min_volume_24h_usd: 0.0,
            min_holders: 0,
            min_age_days: 0,
            max_age_days: 0,
            min_turnover_pct: 0.0,
            require_social_presence: false,
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        for (name, value) in [
            ("min_market_cap_usd", self.min_market_cap_usd),
            ("max_market_cap_usd", self.max_market_cap_usd),
            ("min_volume_24h_usd", self.min_volume_24h_usd),
            ("min_turnover_pct", self.min_turnover_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FilterError::InvalidBound(name));
            }
        }
        if self.max_market_cap_usd > 0.0 && self.min_market_cap_usd > self.max_market_cap_usd {
            return Err(FilterError::InvertedMarketCap {
                min: self.min_market_cap_usd,
                max: self.max_market_cap_usd,
            });
        }
        if self.max_age_days > 0 && self.min_age_days > self.max_age_days {
            return Err(FilterError::InvertedAge {
                min: self.min_age_days,
                max: self.max_age_days,
            });
        }
        Ok(())
    }

    /// First bound the candidate violates, checked in a fixed order
    pub fn check(&self, candidate: &Candidate) -> Result<(), FilterRejection> {
        let market_cap = candidate.market.market_cap_usd;
        if self.min_market_cap_usd > 0.0 && market_cap < self.min_market_cap_usd {
            return Err(FilterRejection::MarketCapBelowMin);
        }
        if self.max_market_cap_usd > 0.0 && market_cap > self.max_market_cap_usd {
            return Err(FilterRejection::MarketCapAboveMax);
        }
        if self.min_volume_24h_usd > 0.0
            && candidate.market.volume_24h_usd < self.min_volume_24h_usd
        {
            return Err(FilterRejection::VolumeBelowMin);
        }
        if self.min_turnover_pct > 0.0 {
            match candidate.market.turnover_ratio() {
                None => return Err(FilterRejection::TurnoverMissing),
                Some(ratio) if ratio * 100.0 < self.min_turnover_pct => {
                    return Err(FilterRejection::TurnoverBelowMin)
                }
                Some(_) => {}
            }
        }

        if self.min_holders > 0 {
            match candidate.holder_count() {
                None => return Err(FilterRejection::HoldersMissing),
                Some(count) if count < self.min_holders => {
                    return Err(FilterRejection::HoldersBelowMin)
                }
                Some(_) => {}
            }
        }

        let age_active = self.min_age_days > 0 || self.max_age_days > 0;
        if age_active {
            let Some(age) = candidate.listing_age_days else {
                return Err(FilterRejection::AgeMissing);
            };
            if age < self.min_age_days {
                return Err(FilterRejection::TooYoung);
            }
            if self.max_age_days > 0 && age > self.max_age_days {
                return Err(FilterRejection::TooOld);
            }
        }

        if self.require_social_presence
            && !candidate.social.as_ref().is_some_and(|s| s.has_presence())
        {
            return Err(FilterRejection::NoSocialPresence);
        }

        Ok(())
    }

    /// Market cap and volume bounds against a listing row
    ///
    /// A figure the row lacks admits; the detail check decides later.
    pub fn admits_listing(&self, listing: &MarketListing) -> bool {
        if let Some(cap) = listing.market_cap_usd {
            if self.min_market_cap_usd > 0.0 && cap < self.min_market_cap_usd {
                return false;
            }
            if self.max_market_cap_usd > 0.0 && cap > self.max_market_cap_usd {
                return false;
            }
        }
        match listing.volume_24h_usd {
            Some(volume) => self.min_volume_24h_usd <= 0.0 || volume >= self.min_volume_24h_usd,
            None => true,
        }
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.check(candidate).is_ok()
    }
}
