//! Gem Scoring
//!
//! Multi-dimensional score for a discovered candidate. Five sub-scores are
//! computed from disjoint metric slices, combined with fixed weights, then
//! scaled down by an independent risk score.
//!
//! Every sub-score and the risk score are clamped to [0, 100]. A missing
//! metric slice scores 0; missing risk signals count as the worst case.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::candidate::{
    Candidate, DeveloperMetrics, HolderMetrics, LiquidityMetrics, MarketSnapshot, SocialMetrics,
};

pub const DEFAULT_RISK_PENALTY_FACTOR: f64 = 0.5;

/// Tolerance on the weight sum
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Invalid score weights: {0}")]
    InvalidWeights(String),

    #[error("Risk penalty factor must be within [0, 1], got {0}")]
    InvalidPenalty(f64),
}

/// Investment recommendation (ordered best first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    ModerateBuy,
    HoldWatch,
    WeakHold,
    Avoid,
}

impl Recommendation {
    /// Band lookup, lower bounds inclusive
    pub fn from_score(risk_adjusted: f64) -> Self {
        if risk_adjusted >= 85.0 {
            Recommendation::StrongBuy
        } else if risk_adjusted >= 75.0 {
            Recommendation::Buy
        } else if risk_adjusted >= 65.0 {
            Recommendation::ModerateBuy
        } else if risk_adjusted >= 55.0 {
            Recommendation::HoldWatch
        } else if risk_adjusted >= 45.0 {
            Recommendation::WeakHold
        } else {
            Recommendation::Avoid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "STRONG_BUY",
            Recommendation::Buy => "BUY",
            Recommendation::ModerateBuy => "MODERATE_BUY",
            Recommendation::HoldWatch => "HOLD_WATCH",
            Recommendation::WeakHold => "WEAK_HOLD",
            Recommendation::Avoid => "AVOID",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter grade of the risk-adjusted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "C-")]
    CMinus,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        const BANDS: [(f64, Grade); 10] = [
            (90.0, Grade::APlus),
            (85.0, Grade::A),
            (80.0, Grade::AMinus),
            (75.0, Grade::BPlus),
            (70.0, Grade::B),
            (65.0, Grade::BMinus),
            (60.0, Grade::CPlus),
            (55.0, Grade::C),
            (50.0, Grade::CMinus),
            (40.0, Grade::D),
        ];
        BANDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weights of the five sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub social: f64,
    pub on_chain: f64,
    pub developer: f64,
    pub liquidity: f64,
    pub holder: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            social: 0.30,
            on_chain: 0.25,
            developer: 0.20,
            liquidity: 0.15,
            holder: 0.10,
        }
    }
}

impl ScoreWeights {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("social", self.social),
            ("on_chain", self.on_chain),
            ("developer", self.developer),
            ("liquidity", self.liquidity),
            ("holder", self.holder),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.named().iter().map(|(_, w)| w).sum()
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        for (name, weight) in self.named() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoringError::InvalidWeights(format!(
                    "{} weight must be finite and non-negative, got {}",
                    name, weight
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must sum to 1.0, got {:.4}",
                sum
            )));
        }
        Ok(())
    }

    /// Weighted composite of already-clamped sub-scores
    pub fn composite(&self, scores: &SubScores) -> f64 {
        let total = scores.social * self.social
            + scores.on_chain * self.on_chain
            + scores.developer * self.developer
            + scores.liquidity * self.liquidity
            + scores.holder * self.holder;
        total.clamp(0.0, 100.0)
    }
}

/// The five dimension scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub social: f64,
    pub on_chain: f64,
    pub developer: f64,
    pub liquidity: f64,
    pub holder: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub token_id: String,
    pub symbol: String,
    pub sub_scores: SubScores,
    pub risk: f64,
    pub composite: f64,
    pub risk_adjusted: f64,
    pub recommendation: Recommendation,
    pub grade: Grade,
    /// Short-term price momentum (informational)
    pub momentum: f64,
    /// Long-term trend (informational)
    pub trend: f64,
}

/// Stateless scorer configured with validated weights
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    weights: ScoreWeights,
    risk_penalty_factor: f64,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            risk_penalty_factor: DEFAULT_RISK_PENALTY_FACTOR,
        }
    }
}

impl ScoreEngine {
    pub fn new(weights: ScoreWeights, risk_penalty_factor: f64) -> Result<Self, ScoringError> {
        weights.validate()?;
        if !(0.0..=1.0).contains(&risk_penalty_factor) {
            return Err(ScoringError::InvalidPenalty(risk_penalty_factor));
        }
        Ok(Self {
            weights,
            risk_penalty_factor,
        })
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn score(&self, candidate: &Candidate) -> ScoreResult {
        let sub_scores = SubScores {
            social: social_score(candidate.social.as_ref()),
            on_chain: on_chain_score(&candidate.market),
            developer: developer_score(candidate.developer.as_ref()),
            liquidity: liquidity_score(candidate.liquidity.as_ref()),
            holder: holder_score(candidate.holders.as_ref()),
        };
        let composite = self.weights.composite(&sub_scores);
        let risk = risk_score(candidate);
        let risk_adjusted = self.risk_adjust(composite, risk);

        ScoreResult {
            token_id: candidate.id.clone(),
            symbol: candidate.symbol.clone(),
            sub_scores,
            risk,
            composite,
            risk_adjusted,
            recommendation: Recommendation::from_score(risk_adjusted),
            grade: Grade::from_score(risk_adjusted),
            momentum: momentum_score(&candidate.market),
            trend: trend_score(&candidate.market),
        }
    }

    /// composite x (1 - risk/100 x penalty), floored at 0
    pub fn risk_adjust(&self, composite: f64, risk: f64) -> f64 {
        let factor = 1.0 - (risk.clamp(0.0, 100.0) / 100.0) * self.risk_penalty_factor;
        (composite * factor).max(0.0)
    }

    /// Score every candidate, best risk-adjusted first (ties by token id)
    pub fn rank(&self, candidates: &[Candidate]) -> Vec<ScoreResult> {
        let mut results: Vec<ScoreResult> = candidates.iter().map(|c| self.score(c)).collect();
        results.sort_by(|a, b| {
            b.risk_adjusted
                .total_cmp(&a.risk_adjusted)
                .then_with(|| a.token_id.cmp(&b.token_id))
        });
        results
    }
}

fn capped_log10(value: u64, factor: f64, cap: f64) -> f64 {
    if value == 0 {
        return 0.0;
    }
    ((value as f64).log10() * factor).min(cap)
}

fn social_score(social: Option<&SocialMetrics>) -> f64 {
    let Some(s) = social else { return 0.0 };

    let mut score = capped_log10(s.twitter_followers, 8.0, 40.0);
    if s.reddit_subscribers > 0 {
        score += capped_log10(s.reddit_subscribers, 4.0, 20.0);
        let activity = s.reddit_active_48h as f64 / s.reddit_subscribers as f64;
        score += (activity * 200.0).min(10.0);
    }
    score += capped_log10(s.telegram_users, 4.0, 20.0);
    score += capped_log10(s.facebook_likes, 2.0, 10.0);
    score.clamp(0.0, 100.0)
}

fn on_chain_score(market: &MarketSnapshot) -> f64 {
    let market_cap = market.market_cap_usd;
    if market_cap <= 0.0 {
        return 0.0;
    }

    // Sweet spot is 10M-50M
    let mut score: f64 = if (10_000_000.0..=50_000_000.0).contains(&market_cap) {
        30.0
    } else if market_cap >= 5_000_000.0 && market_cap < 10_000_000.0 {
        25.0
    } else if market_cap >= 1_000_000.0 && market_cap < 5_000_000.0 {
        20.0
    } else if market_cap > 50_000_000.0 && market_cap <= 100_000_000.0 {
        15.0
    } else {
        10.0
    };

    if market.volume_24h_usd > 0.0 {
        let turnover = market.volume_24h_usd / market_cap;
        score += match turnover {
            t if t > 0.2 => 25.0,
            t if t > 0.1 => 20.0,
            t if t > 0.05 => 15.0,
            t if t > 0.02 => 10.0,
            _ => 5.0,
        };
    }

    if let Some(change) = market.price_change_7d_pct {
        score += if (0.0..=50.0).contains(&change) {
            20.0
        } else if (-20.0..0.0).contains(&change) {
            15.0
        } else if change > 50.0 && change <= 100.0 {
            10.0
        } else {
            5.0
        };
    }

    if let (Some(circulating), Some(total)) = (market.circulating_supply, market.total_supply) {
        if circulating > 0.0 && total > 0.0 {
            let ratio = circulating / total;
            score += if ratio > 0.8 {
                15.0
            } else if ratio > 0.5 {
                10.0
            } else {
                5.0
            };
        }
    }

    if let Some(ath) = market.ath_usd {
        if ath > 0.0 && market.price_usd > 0.0 {
            let distance = (ath - market.price_usd) / ath;
            score += if distance < 0.2 {
                5.0
            } else if distance < 0.5 {
                10.0
            } else if distance < 0.8 {
                8.0
            } else {
                5.0
            };
        }
    }

    score.clamp(0.0, 100.0)
}

fn developer_score(developer: Option<&DeveloperMetrics>) -> f64 {
    let Some(d) = developer else { return 0.0 };

    let mut score: f64 = match d.commits_4w {
        0 => 0.0,
        c if c >= 100 => 40.0,
        c if c >= 50 => 30.0,
        c if c >= 20 => 20.0,
        c if c >= 5 => 10.0,
        _ => 5.0,
    };
    score += capped_log10(d.stars, 5.0, 20.0);
    score += capped_log10(d.forks, 3.75, 15.0);
    score += match d.closed_issues {
        0 => 0.0,
        n if n >= 100 => 15.0,
        n if n >= 50 => 10.0,
        n if n >= 20 => 7.0,
        _ => 3.0,
    };
    score += match d.merged_pull_requests {
        0 => 0.0,
        n if n >= 50 => 10.0,
        n if n >= 20 => 7.0,
        n if n >= 10 => 5.0,
        _ => 2.0,
    };
    score.clamp(0.0, 100.0)
}

fn liquidity_score(liquidity: Option<&LiquidityMetrics>) -> f64 {
    let Some(l) = liquidity else { return 0.0 };

    let mut score: f64 = match l.turnover_ratio {
        Some(r) if r >= 0.3 => 50.0,
        Some(r) if r >= 0.2 => 45.0,
        Some(r) if r >= 0.1 => 40.0,
        Some(r) if r >= 0.05 => 30.0,
        Some(r) if r >= 0.02 => 20.0,
        Some(r) if r >= 0.01 => 10.0,
        Some(r) if r > 0.0 => 5.0,
        _ => 0.0,
    };
    score += match l.depth_2pct_usd {
        Some(d) if d >= 1_000_000.0 => 25.0,
        Some(d) if d >= 500_000.0 => 20.0,
        Some(d) if d >= 100_000.0 => 15.0,
        Some(d) if d >= 50_000.0 => 10.0,
        Some(d) if d >= 10_000.0 => 5.0,
        Some(d) if d > 0.0 => 2.0,
        _ => 0.0,
    };
    score += match l.bid_ask_spread_pct {
        Some(s) if s < 0.0 => 0.0,
        Some(s) if s <= 0.5 => 25.0,
        Some(s) if s <= 1.0 => 20.0,
        Some(s) if s <= 2.0 => 15.0,
        Some(s) if s <= 5.0 => 10.0,
        Some(_) => 5.0,
        None => 0.0,
    };
    score.clamp(0.0, 100.0)
}

fn holder_score(holders: Option<&HolderMetrics>) -> f64 {
    let Some(h) = holders else { return 0.0 };

    let count = h
        .holder_count
        .map(|c| capped_log10(c, 8.0, 40.0))
        .unwrap_or(0.0);
    let distribution = h
        .top10_concentration_pct
        .map(|pct| ((100.0 - pct.clamp(0.0, 100.0)) * 0.6).min(60.0))
        .unwrap_or(0.0);
    (count + distribution).clamp(0.0, 100.0)
}

/// Volatility (<=35) + concentration (<=35) + age (<=30); missing signals take the maximum
fn risk_score(candidate: &Candidate) -> f64 {
    let volatility: f64 = match candidate.market.price_change_7d_pct.map(f64::abs) {
        None => 35.0,
        Some(c) if c > 100.0 => 35.0,
        Some(c) if c > 50.0 => 25.0,
        Some(c) if c > 20.0 => 15.0,
        Some(c) if c > 10.0 => 5.0,
        Some(_) => 0.0,
    };

    let concentration = candidate
        .holders
        .as_ref()
        .and_then(|h| h.top10_concentration_pct)
        .map(|pct| (pct.clamp(0.0, 100.0) * 0.35).min(35.0))
        .unwrap_or(35.0);

    let age: f64 = match candidate.listing_age_days {
        None => 30.0,
        Some(d) if d < 7 => 30.0,
        Some(d) if d < 30 => 20.0,
        Some(d) if d < 90 => 10.0,
        Some(_) => 0.0,
    };

    (volatility + concentration + age).clamp(0.0, 100.0)
}

fn momentum_score(market: &MarketSnapshot) -> f64 {
    let mut score: f64 = 50.0;
    if let Some(change) = market.price_change_24h_pct {
        score += match change {
            c if c > 10.0 => 20.0,
            c if c > 5.0 => 15.0,
            c if c > 0.0 => 10.0,
            c if c > -5.0 => -5.0,
            c if c > -10.0 => -10.0,
            _ => -20.0,
        };
    }
    if let Some(change) = market.price_change_7d_pct {
        score += match change {
            c if c > 50.0 => 30.0,
            c if c > 20.0 => 25.0,
            c if c > 10.0 => 20.0,
            c if c > 0.0 => 15.0,
            c if c > -10.0 => -10.0,
            c if c > -20.0 => -15.0,
            _ => -25.0,
        };
    }
    score.clamp(0.0, 100.0)
}

fn trend_score(market: &MarketSnapshot) -> f64 {
    let mut score: f64 = 50.0;
    if let Some(change) = market.price_change_30d_pct.filter(|c| *c != 0.0) {
        score += match change {
            c if c > 100.0 => 30.0,
            c if c > 50.0 => 25.0,
            c if c > 20.0 => 20.0,
            c if c > 0.0 => 15.0,
            c => -(c.abs() / 10.0),
        };
    }
    if let Some(ath) = market.ath_usd.filter(|a| *a > 0.0) {
        if market.price_usd > 0.0 {
            score += match market.price_usd / ath {
                r if r > 0.8 => 20.0,
                r if r > 0.5 => 15.0,
                r if r > 0.2 => 10.0,
                _ => 5.0,
            };
        }
    }
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::DiscoverySource;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn bare(id: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            symbol: id.to_uppercase(),
            name: id.to_string(),
            market: MarketSnapshot::default(),
            listing_age_days: None,
            social: None,
            developer: None,
            liquidity: None,
            holders: None,
            source: DiscoverySource::Trending,
            discovered_at: Utc::now(),
        }
    }

    fn healthy(id: &str) -> Candidate {
        Candidate {
            market: MarketSnapshot {
                price_usd: 0.6,
                market_cap_usd: 20_000_000.0,
                volume_24h_usd: 5_000_000.0,
                price_change_24h_pct: Some(3.0),
                price_change_7d_pct: Some(8.0),
                price_change_30d_pct: Some(25.0),
                circulating_supply: Some(90.0),
                total_supply: Some(100.0),
                ath_usd: Some(1.0),
                ..Default::default()
            },
            listing_age_days: Some(200),
            social: Some(SocialMetrics {
                twitter_followers: 100_000,
                reddit_subscribers: 10_000,
                reddit_active_48h: 500,
                telegram_users: 100_000,
                facebook_likes: 100_000,
            }),
            developer: Some(DeveloperMetrics {
                commits_4w: 120,
                stars: 10_000,
                forks: 10_000,
                closed_issues: 150,
                merged_pull_requests: 60,
            }),
            liquidity: Some(LiquidityMetrics {
                turnover_ratio: Some(0.25),
                depth_2pct_usd: Some(2_000_000.0),
                bid_ask_spread_pct: Some(0.3),
            }),
            holders: Some(HolderMetrics {
                holder_count: Some(100_000),
                top10_concentration_pct: Some(20.0),
            }),
            ..bare(id)
        }
    }

    #[test]
    fn test_composite_weighted_sum() {
        let weights = ScoreWeights::default();
        let scores = SubScores {
            social: 80.0,
            on_chain: 60.0,
            developer: 40.0,
            liquidity: 90.0,
            holder: 70.0,
        };
        assert_relative_eq!(weights.composite(&scores), 67.5, epsilon = 1e-9);
    }

    #[test]
    fn test_composite_bounded() {
        let weights = ScoreWeights::default();
        let max = SubScores {
            social: 100.0,
            on_chain: 100.0,
            developer: 100.0,
            liquidity: 100.0,
            holder: 100.0,
        };
        assert!(weights.composite(&max) <= 100.0);
        assert_eq!(weights.composite(&SubScores::default()), 0.0);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut weights = ScoreWeights::default();
        weights.social = 0.5;
        assert!(matches!(
            ScoreEngine::new(weights, 0.5),
            Err(ScoringError::InvalidWeights(_))
        ));

        let negative = ScoreWeights {
            social: 1.2,
            on_chain: -0.2,
            developer: 0.0,
            liquidity: 0.0,
            holder: 0.0,
        };
        assert!(matches!(negative.validate(), Err(ScoringError::InvalidWeights(_))));
        assert!(matches!(
            ScoreEngine::new(ScoreWeights::default(), 1.5),
            Err(ScoringError::InvalidPenalty(_))
        ));
    }

    #[test]
    fn test_weights_within_tolerance_accepted() {
        let weights = ScoreWeights {
            social: 0.3004,
            ..ScoreWeights::default()
        };
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_risk_adjusted_never_exceeds_composite() {
        let engine = ScoreEngine::default();
        for risk in [0.0, 10.0, 50.0, 99.0, 100.0, 250.0] {
            let adjusted = engine.risk_adjust(70.0, risk);
            assert!(adjusted <= 70.0);
            assert!(adjusted >= 0.0);
        }
        assert_eq!(engine.risk_adjust(70.0, 0.0), 70.0);
        assert_relative_eq!(engine.risk_adjust(80.0, 100.0), 40.0);
    }

    #[test]
    fn test_missing_slices_score_zero() {
        let engine = ScoreEngine::default();
        let result = engine.score(&bare("empty"));
        assert_eq!(result.sub_scores, SubScores::default());
        assert_eq!(result.composite, 0.0);
        // volatility 35 + concentration 35 + age 30
        assert_eq!(result.risk, 100.0);
        assert_eq!(result.recommendation, Recommendation::Avoid);
        assert_eq!(result.grade, Grade::F);
    }

    #[test]
    fn test_healthy_candidate_scores_high() {
        let engine = ScoreEngine::default();
        let result = engine.score(&healthy("good"));

        let subs = result.sub_scores;
        for value in [subs.social, subs.on_chain, subs.developer, subs.liquidity, subs.holder] {
            assert!((0.0..=100.0).contains(&value));
        }
        // 30 + 25 + 20 + 15 + 10
        assert_relative_eq!(subs.on_chain, 100.0);
        assert_relative_eq!(subs.liquidity, 95.0);
        // log10(1e5) * 8 = 40, (100 - 20) * 0.6 = 48
        assert_relative_eq!(subs.holder, 88.0, epsilon = 1e-9);
        // concentration 7 only
        assert_relative_eq!(result.risk, 7.0, epsilon = 1e-9);
        assert!(result.risk_adjusted <= result.composite);
        assert!(result.risk_adjusted > 75.0);
        assert!(matches!(
            result.recommendation,
            Recommendation::StrongBuy | Recommendation::Buy
        ));
    }

    #[test]
    fn test_social_log_scaling() {
        let social = SocialMetrics {
            twitter_followers: 100_000,
            reddit_subscribers: 100_000,
            reddit_active_48h: 0,
            telegram_users: 0,
            facebook_likes: 0,
        };
        // 40 + 20
        assert_relative_eq!(social_score(Some(&social)), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_recommendation_bands_inclusive() {
        assert_eq!(Recommendation::from_score(85.0), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_score(84.99), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(75.0), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(65.0), Recommendation::ModerateBuy);
        assert_eq!(Recommendation::from_score(55.0), Recommendation::HoldWatch);
        assert_eq!(Recommendation::from_score(45.0), Recommendation::WeakHold);
        assert_eq!(Recommendation::from_score(44.99), Recommendation::Avoid);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(Grade::from_score(90.0), Grade::APlus);
        assert_eq!(Grade::from_score(72.0), Grade::B);
        assert_eq!(Grade::from_score(40.0), Grade::D);
        assert_eq!(Grade::from_score(39.9), Grade::F);
        assert_eq!(Grade::BMinus.to_string(), "B-");
    }

    #[test]
    fn test_rank_orders_by_risk_adjusted_then_id() {
        let engine = ScoreEngine::default();
        let ranked = engine.rank(&[bare("zeta"), healthy("good"), bare("alpha")]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.token_id.as_str()).collect();
        assert_eq!(ids, vec!["good", "alpha", "zeta"]);
    }

    #[test]
    fn test_momentum_and_trend_neutral_without_data() {
        let market = MarketSnapshot::default();
        assert_eq!(momentum_score(&market), 50.0);
        assert_eq!(trend_score(&market), 50.0);

        let hot = MarketSnapshot {
            price_usd: 0.9,
            price_change_24h_pct: Some(12.0),
            price_change_7d_pct: Some(60.0),
            price_change_30d_pct: Some(150.0),
            ath_usd: Some(1.0),
            ..Default::default()
        };
        assert_eq!(momentum_score(&hot), 100.0);
        assert_eq!(trend_score(&hot), 100.0);
    }
}
