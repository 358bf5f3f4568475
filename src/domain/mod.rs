//! Domain Layer - Core scanning logic for TradeMind
//!
//! Pure types and rules with no I/O. Upstream data arrives through the
//! ports layer and is turned into whale events, candidates and scores here.
//!
//! - `whale`: transfer records, whale classification, risk bands
//! - `exchange_registry`: known exchange wallets
//! - `candidate`: gem candidate snapshots
//! - `discovery_filter`: conjunctive discovery bounds
//! - `scoring`: weighted, risk-adjusted gem scores

pub mod candidate;
pub mod discovery_filter;
pub mod exchange_registry;
pub mod scoring;
pub mod whale;

pub use candidate::{
    Candidate, DeveloperMetrics, DiscoverySource, HolderMetrics, LiquidityMetrics, MarketListing,
    MarketSnapshot, SocialMetrics,
};
pub use discovery_filter::{DiscoveryFilters, FilterError, FilterRejection};
pub use exchange_registry::{ExchangeAddressRegistry, DEFAULT_EXCHANGE_ADDRESSES};
pub use scoring::{
    Grade, Recommendation, ScoreEngine, ScoreResult, ScoreWeights, ScoringError, SubScores,
};
pub use whale::{
    ClassifierError, FlowDirection, RiskLevel, TransferRecord, WhaleClassifier, WhaleEvent,
};
