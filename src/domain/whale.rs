//! Whale Transfer Classification
//!
//! Turns raw token transfers into whale events: USD valuation, hard threshold
//! filter, exchange flow direction and a step-function risk level.
//! Pure logic, no I/O. The async tracker in `application` feeds it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::exchange_registry::ExchangeAddressRegistry;

/// Default minimum USD value for a transfer to count as whale activity
pub const DEFAULT_WHALE_THRESHOLD_USD: f64 = 100_000.0;

/// Risk level lower bounds in USD (inclusive)
pub const CRITICAL_USD: f64 = 1_000_000.0;
pub const HIGH_USD: f64 = 500_000.0;
pub const MEDIUM_USD: f64 = 250_000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Whale threshold must be a positive USD amount, got {0}")]
    InvalidThreshold(f64),

    #[error("Token price must be finite and >= 0, got {0}")]
    InvalidPrice(f64),
}

/// A single token transfer as reported by the chain explorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Transaction hash
    pub tx_hash: String,
    /// Source address
    pub from: String,
    /// Destination address
    pub to: String,
    /// Token contract address
    pub contract: String,
    /// Token symbol, when the explorer reports one
    pub token_symbol: Option<String>,
    /// Transferred amount in the token's smallest unit
    pub raw_amount: u128,
    /// Token decimals used to scale `raw_amount`
    pub decimals: u8,
    /// Block the transfer was mined in
    pub block_number: u64,
    /// Block timestamp
    pub timestamp: DateTime<Utc>,
}

impl TransferRecord {
    /// Amount in whole tokens
    pub fn amount(&self) -> f64 {
        self.raw_amount as f64 / 10f64.powi(self.decimals as i32)
    }
}

/// Risk level of a whale transfer, ordered LOW < MEDIUM < HIGH < CRITICAL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Step function over the fixed USD thresholds
    pub fn from_usd(usd_value: f64) -> Self {
        if usd_value >= CRITICAL_USD {
            RiskLevel::Critical
        } else if usd_value >= HIGH_USD {
            RiskLevel::High
        } else if usd_value >= MEDIUM_USD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of funds relative to known exchange wallets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowDirection {
    /// Destination is an exchange (deposit)
    In,
    /// Source is an exchange (withdrawal)
    Out,
    /// Neither side is an exchange, or both are
    None,
}

impl FlowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowDirection::In => "IN",
            FlowDirection::Out => "OUT",
            FlowDirection::None => "NONE",
        }
    }
}

impl std::fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transfer that passed the whale threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleEvent {
    pub transfer: TransferRecord,
    /// Token price used for valuation
    pub price_usd: f64,
    /// amount x price, never negative
    pub usd_value: f64,
    pub risk_level: RiskLevel,
    pub flow: FlowDirection,
    /// Exchange label of the source, if known
    pub from_exchange: Option<String>,
    /// Exchange label of the destination, if known
    pub to_exchange: Option<String>,
    /// Estimated price impact against a constant-product pool, in percent
    pub price_impact_pct: Option<f64>,
}

impl WhaleEvent {
    /// Attach a price impact estimate for a pool holding `liquidity_usd` in total
    /// (both sides). Uses x / (R + x) with R = liquidity / 2.
    pub fn with_price_impact(mut self, liquidity_usd: f64) -> Self {
        if liquidity_usd.is_finite() && liquidity_usd > 0.0 {
            let reserve = liquidity_usd / 2.0;
            self.price_impact_pct = Some(100.0 * self.usd_value / (reserve + self.usd_value));
        }
        self
    }
}

/// Threshold filter plus exchange-flow labelling
#[derive(Debug, Clone)]
pub struct WhaleClassifier {
    threshold_usd: f64,
    registry: ExchangeAddressRegistry,
}

impl WhaleClassifier {
    pub fn new(threshold_usd: f64, registry: ExchangeAddressRegistry) -> Result<Self, ClassifierError> {
        if !threshold_usd.is_finite() || threshold_usd <= 0.0 {
            return Err(ClassifierError::InvalidThreshold(threshold_usd));
        }
        Ok(Self { threshold_usd, registry })
    }

    pub fn threshold_usd(&self) -> f64 {
        self.threshold_usd
    }

    pub fn registry(&self) -> &ExchangeAddressRegistry {
        &self.registry
    }

    /// Flow direction for a source/destination pair.
    /// Exchange-to-exchange moves resolve to `None` so internal shuffles are not
    /// counted as both an inflow and an outflow.
    pub fn flow_direction(&self, from: &str, to: &str) -> FlowDirection {
        match (self.registry.is_exchange(from), self.registry.is_exchange(to)) {
            (true, false) => FlowDirection::Out,
            (false, true) => FlowDirection::In,
            _ => FlowDirection::None,
        }
    }

    /// Classify one transfer. `None` when it is below the threshold.
    pub fn classify(&self, transfer: &TransferRecord, price_usd: f64) -> Option<WhaleEvent> {
        let usd_value = (transfer.amount() * price_usd).max(0.0);
        if usd_value < self.threshold_usd {
            return None;
        }

        Some(WhaleEvent {
            transfer: transfer.clone(),
            price_usd,
            usd_value,
            risk_level: RiskLevel::from_usd(usd_value),
            flow: self.flow_direction(&transfer.from, &transfer.to),
            from_exchange: self.registry.lookup(&transfer.from).map(str::to_string),
            to_exchange: self.registry.lookup(&transfer.to).map(str::to_string),
            price_impact_pct: None,
        })
    }

    /// Classify a batch, preserving input order
    pub fn classify_batch(
        &self,
        transfers: &[TransferRecord],
        price_usd: f64,
    ) -> Result<Vec<WhaleEvent>, ClassifierError> {
        if !price_usd.is_finite() || price_usd < 0.0 {
            return Err(ClassifierError::InvalidPrice(price_usd));
        }

        Ok(transfers
            .iter()
            .filter_map(|t| self.classify(t, price_usd))
            .collect())
    }
}
