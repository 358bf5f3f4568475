//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, parse_config, Config, ConfigError, DiscoverySection, ExchangesSection,
    ExplorerSection, HttpSection, LoggingSection, MarketSection, MonitoringSection,
    ScoringSection, BSC_USDT_CONTRACT,
};
