//! Application Layer - Scan use cases
//!
//! - `whale_tracker`: explorer transfers to whale events
//! - `gem_finder`: multi-strategy candidate discovery
//! - `blocking`: sequential facade over both

pub mod blocking;
pub mod gem_finder;
pub mod whale_tracker;

pub use blocking::BlockingScanner;
pub use gem_finder::{
    ComprehensiveScan, GemFinder, ScanSession, SkippedToken, StrategyFailure, StrategyScan,
    DEFAULT_PER_STRATEGY_LIMIT, SOCIAL_BUZZ_MIN_SIGNALS,
};
pub use whale_tracker::{WhaleTracker, WhaleTrackerError};
