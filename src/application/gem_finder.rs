//! Gem Finder
//!
//! Multi-strategy discovery of low-cap candidates from the market data feed.
//! Each strategy pulls a list of ids, captures a detail snapshot per id (up
//! to `per_strategy_limit`) and keeps the ones that pass the discovery
//! filters. Markets listings arrive pre-filtered on cap and volume, so the
//! detail budget goes to tokens that can still pass. `comprehensive_scan`
//! runs every strategy concurrently over one shared [`ScanSession`] and
//! merges the results in the fixed order of [`DiscoverySource::ALL`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::domain::{Candidate, DiscoveryFilters, DiscoverySource, FilterError, MarketListing};
use crate::ports::{ApiError, MarketDataPort, MarketOrder};

pub const DEFAULT_PER_STRATEGY_LIMIT: usize = 50;

/// Social channels above threshold needed for the social buzz strategy
pub const SOCIAL_BUZZ_MIN_SIGNALS: u8 = 2;

/// A strategy that failed during a comprehensive scan
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyFailure {
    pub strategy: DiscoverySource,
    pub error: ApiError,
}

/// A token a strategy dropped because its detail was missing or unreadable
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedToken {
    pub strategy: DiscoverySource,
    pub id: String,
    pub error: ApiError,
}

/// Outcome of one strategy
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrategyScan {
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedToken>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComprehensiveScan {
    /// Unique candidates, first-seen snapshot per id
    pub candidates: Vec<Candidate>,
    pub failures: Vec<StrategyFailure>,
    pub skipped: Vec<SkippedToken>,
}

impl ComprehensiveScan {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl From<StrategyScan> for ComprehensiveScan {
    fn from(scan: StrategyScan) -> Self {
        Self {
            candidates: scan.candidates,
            failures: Vec::new(),
            skipped: scan.skipped,
        }
    }
}

/// Upstream responses shared by the strategies of one scan
///
/// Detail snapshots are fetched at most once per id while the session
/// lives; the market cap listing feeds both the market cap and social buzz
/// strategies.
#[derive(Debug, Default)]
pub struct ScanSession {
    details: Mutex<HashMap<String, Arc<OnceCell<Candidate>>>>,
    market_cap_rows: OnceCell<Vec<MarketListing>>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids with a cached detail snapshot
    pub fn cached_details(&self) -> usize {
        self.lock_details()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    fn lock_details(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<OnceCell<Candidate>>>> {
        self.details
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn detail_cell(&self, id: &str) -> Arc<OnceCell<Candidate>> {
        self.lock_details()
            .entry(id.to_string())
            .or_default()
            .clone()
    }
}

pub struct GemFinder {
    market: Arc<dyn MarketDataPort>,
    filters: DiscoveryFilters,
    per_strategy_limit: usize,
}

impl GemFinder {
    pub fn new(
        market: Arc<dyn MarketDataPort>,
        filters: DiscoveryFilters,
        per_strategy_limit: usize,
    ) -> Result<Self, FilterError> {
        filters.validate()?;
        Ok(Self {
            market,
            filters,
            per_strategy_limit,
        })
    }

    pub fn filters(&self) -> &DiscoveryFilters {
        &self.filters
    }

    /// Run one strategy by source
    pub async fn scan(&self, source: DiscoverySource) -> Result<StrategyScan, ApiError> {
        self.scan_in(source, &ScanSession::new()).await
    }

    /// Run one strategy against an existing session
    pub async fn scan_in(
        &self,
        source: DiscoverySource,
        session: &ScanSession,
    ) -> Result<StrategyScan, ApiError> {
        match source {
            DiscoverySource::Trending => self.trending(session).await,
            DiscoverySource::NewListing => self.new_listings(session).await,
            DiscoverySource::Volume => self.by_volume(session).await,
            DiscoverySource::MarketCap => self.by_market_cap(session).await,
            DiscoverySource::SocialBuzz => self.social_buzz(session).await,
        }
    }

    pub async fn scan_trending(&self) -> Result<StrategyScan, ApiError> {
        self.trending(&ScanSession::new()).await
    }

    pub async fn scan_new_listings(&self) -> Result<StrategyScan, ApiError> {
        self.new_listings(&ScanSession::new()).await
    }

    pub async fn scan_by_volume(&self) -> Result<StrategyScan, ApiError> {
        self.by_volume(&ScanSession::new()).await
    }

    pub async fn scan_by_market_cap(&self) -> Result<StrategyScan, ApiError> {
        self.by_market_cap(&ScanSession::new()).await
    }

    /// Market cap listing, narrowed to tokens with at least two buzzing channels
    pub async fn scan_social_buzz(&self) -> Result<StrategyScan, ApiError> {
        self.social_buzz(&ScanSession::new()).await
    }

    /// All strategies concurrently; a failing strategy is reported, not fatal
    pub async fn comprehensive_scan(&self) -> ComprehensiveScan {
        let session = ScanSession::new();
        let (trending, new_listings, volume, market_cap, social) = tokio::join!(
            self.trending(&session),
            self.new_listings(&session),
            self.by_volume(&session),
            self.by_market_cap(&session),
            self.social_buzz(&session),
        );

        let outcomes = DiscoverySource::ALL
            .into_iter()
            .zip([trending, new_listings, volume, market_cap, social]);

        let mut scan = ComprehensiveScan::default();
        let mut seen = HashSet::new();
        let mut total = 0;

        for (strategy, outcome) in outcomes {
            match outcome {
                Ok(found) => {
                    total += found.candidates.len();
                    scan.candidates.extend(
                        found
                            .candidates
                            .into_iter()
                            .filter(|c| seen.insert(c.id.clone())),
                    );
                    scan.skipped.extend(found.skipped);
                }
                Err(error) => {
                    warn!("Strategy {} failed: {}", strategy, error);
                    scan.failures.push(StrategyFailure { strategy, error });
                }
            }
        }

        info!(
            "Comprehensive scan: {} unique candidates from {} hits, {} skipped, {} strategies failed",
            scan.candidates.len(),
            total,
            scan.skipped.len(),
            scan.failures.len()
        );
        scan
    }

    async fn trending(&self, session: &ScanSession) -> Result<StrategyScan, ApiError> {
        let ids = self.market.trending_ids().await?;
        self.capture(session, ids, DiscoverySource::Trending, |_| true)
            .await
    }

    async fn new_listings(&self, session: &ScanSession) -> Result<StrategyScan, ApiError> {
        let ids = self.market.new_listing_ids(self.per_strategy_limit).await?;
        self.capture(session, ids, DiscoverySource::NewListing, |_| true)
            .await
    }

    async fn by_volume(&self, session: &ScanSession) -> Result<StrategyScan, ApiError> {
        let rows = self
            .market
            .market_listings(MarketOrder::VolumeDesc, &self.filters, self.per_strategy_limit)
            .await?;
        self.capture(session, listing_ids(&rows), DiscoverySource::Volume, |_| true)
            .await
    }

    async fn by_market_cap(&self, session: &ScanSession) -> Result<StrategyScan, ApiError> {
        let rows = self.market_cap_rows(session).await?;
        self.capture(session, listing_ids(rows), DiscoverySource::MarketCap, |_| true)
            .await
    }

    async fn social_buzz(&self, session: &ScanSession) -> Result<StrategyScan, ApiError> {
        let rows = self.market_cap_rows(session).await?;
        self.capture(
            session,
            listing_ids(rows),
            DiscoverySource::SocialBuzz,
            |candidate| {
                candidate
                    .social
                    .as_ref()
                    .is_some_and(|s| s.buzz_signals() >= SOCIAL_BUZZ_MIN_SIGNALS)
            },
        )
        .await
    }

    async fn market_cap_rows<'s>(
        &self,
        session: &'s ScanSession,
    ) -> Result<&'s Vec<MarketListing>, ApiError> {
        session
            .market_cap_rows
            .get_or_try_init(|| {
                self.market.market_listings(
                    MarketOrder::MarketCapDesc,
                    &self.filters,
                    self.per_strategy_limit,
                )
            })
            .await
    }

    async fn detail(
        &self,
        session: &ScanSession,
        id: &str,
        source: DiscoverySource,
    ) -> Result<Candidate, ApiError> {
        let cell = session.detail_cell(id);
        let snapshot = cell
            .get_or_try_init(|| self.market.candidate(id, source))
            .await?;
        Ok(snapshot.clone().with_source(source))
    }

    async fn capture<F>(
        &self,
        session: &ScanSession,
        ids: Vec<String>,
        source: DiscoverySource,
        extra: F,
    ) -> Result<StrategyScan, ApiError>
    where
        F: Fn(&Candidate) -> bool + Send + Sync,
    {
        let mut scan = StrategyScan::default();
        let mut looked_up = 0;

        for id in ids.into_iter().take(self.per_strategy_limit) {
            looked_up += 1;
            let candidate = match self.detail(session, &id, source).await {
                Ok(candidate) => candidate,
                Err(err @ (ApiError::NotFound(_) | ApiError::Decode(_))) => {
                    warn!("Skipping {} in {}: {}", id, source, err);
                    scan.skipped.push(SkippedToken {
                        strategy: source,
                        id,
                        error: err,
                    });
                    continue;
                }
                Err(err) => return Err(err),
            };

            if let Err(rejection) = self.filters.check(&candidate) {
                debug!("{} rejected by {:?}", id, rejection);
                continue;
            }
            if !extra(&candidate) {
                debug!("{} rejected by {} criteria", id, source);
                continue;
            }
            scan.candidates.push(candidate);
        }

        info!(
            "{}: {} of {} candidates kept, {} skipped",
            source,
            scan.candidates.len(),
            looked_up,
            scan.skipped.len()
        );
        Ok(scan)
    }
}

fn listing_ids(rows: &[MarketListing]) -> Vec<String> {
    rows.iter().map(|row| row.id.clone()).collect()
}
