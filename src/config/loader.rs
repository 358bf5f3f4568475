//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.
//! Every section and field has a default, so an empty file is a valid config.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::bscscan::{BscScanConfig, DEFAULT_BSCSCAN_URL, MAX_RESULT_WINDOW};
use crate::adapters::coingecko::{CoinGeckoConfig, DEFAULT_COINGECKO_URL};
use crate::adapters::http::client::{
    RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS,
    DEFAULT_TIMEOUT_SECS,
};
use crate::adapters::http::rate_limiter::{
    DEFAULT_EXPLORER_CALLS_PER_SECOND, DEFAULT_MARKET_CALLS_PER_MINUTE,
};
use crate::application::DEFAULT_PER_STRATEGY_LIMIT;
use crate::domain::scoring::DEFAULT_RISK_PENALTY_FACTOR;
use crate::domain::whale::DEFAULT_WHALE_THRESHOLD_USD;
use crate::domain::{
    DiscoveryFilters, ExchangeAddressRegistry, ScoreEngine, ScoreWeights, ScoringError,
};

/// BSC-USD (Binance-Peg USDT)
pub const BSC_USDT_CONTRACT: &str = "0x55d398326f99059fF775485246999027B3197955";

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitoring: MonitoringSection,
    pub explorer: ExplorerSection,
    pub market: MarketSection,
    pub http: HttpSection,
    pub discovery: DiscoverySection,
    pub scoring: ScoringSection,
    pub exchanges: ExchangesSection,
    pub logging: LoggingSection,
}

/// Whale monitoring section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringSection {
    /// Minimum USD value of a whale transfer
    pub whale_threshold_usd: f64,
    /// Poll interval for `watch`
    pub check_interval_seconds: u64,
    /// Token contract scanned when the CLI gives none
    pub contract: String,
}

impl Default for MonitoringSection {
    fn default() -> Self {
        Self {
            whale_threshold_usd: DEFAULT_WHALE_THRESHOLD_USD,
            check_interval_seconds: DEFAULT_CHECK_INTERVAL_SECS,
            contract: BSC_USDT_CONTRACT.to_string(),
        }
    }
}

impl MonitoringSection {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }
}

/// Chain explorer (BscScan) section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExplorerSection {
    pub base_url: String,
    /// Leave empty to read BSCSCAN_API_KEY
    pub api_key: Option<String>,
    pub calls_per_second: u32,
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for ExplorerSection {
    fn default() -> Self {
        let defaults = BscScanConfig::default();
        Self {
            base_url: DEFAULT_BSCSCAN_URL.to_string(),
            api_key: None,
            calls_per_second: DEFAULT_EXPLORER_CALLS_PER_SECOND,
            page_size: defaults.page_size,
            max_pages: defaults.max_pages,
        }
    }
}

impl ExplorerSection {
    /// API key with environment variable fallback
    /// Checks BSCSCAN_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        key_or_env(self.api_key.as_deref(), "BSCSCAN_API_KEY")
    }

    pub fn client_config(&self) -> BscScanConfig {
        BscScanConfig {
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }
}

/// Market data (CoinGecko) section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketSection {
    pub base_url: String,
    /// Leave empty to read COINGECKO_API_KEY
    pub api_key: Option<String>,
    pub calls_per_minute: u32,
    pub vs_currency: String,
    pub max_pages: u32,
}

impl Default for MarketSection {
    fn default() -> Self {
        let defaults = CoinGeckoConfig::default();
        Self {
            base_url: DEFAULT_COINGECKO_URL.to_string(),
            api_key: None,
            calls_per_minute: DEFAULT_MARKET_CALLS_PER_MINUTE,
            vs_currency: defaults.vs_currency,
            max_pages: defaults.max_pages,
        }
    }
}

impl MarketSection {
    /// API key with environment variable fallback
    /// Checks COINGECKO_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        key_or_env(self.api_key.as_deref(), "COINGECKO_API_KEY")
    }

    pub fn client_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            vs_currency: self.vs_currency.clone(),
            max_pages: self.max_pages,
        }
    }
}

/// Shared HTTP behaviour for both upstreams
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            user_agent: concat!("trademind/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            ..RetryPolicy::default()
        }
    }
}

/// Discovery bounds plus the per-strategy lookup cap
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    #[serde(flatten)]
    pub filters: DiscoveryFilters,
    pub per_strategy_limit: usize,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            filters: DiscoveryFilters::default(),
            per_strategy_limit: DEFAULT_PER_STRATEGY_LIMIT,
        }
    }
}

/// Score weights and risk penalty
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    pub weights: ScoreWeights,
    pub risk_penalty_factor: f64,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            risk_penalty_factor: DEFAULT_RISK_PENALTY_FACTOR,
        }
    }
}

impl ScoringSection {
    pub fn engine(&self) -> Result<ScoreEngine, ScoringError> {
        ScoreEngine::new(self.weights, self.risk_penalty_factor)
    }
}

/// Address -> exchange label table. Empty means the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ExchangesSection {
    pub addresses: BTreeMap<String, String>,
}

impl ExchangesSection {
    pub fn registry(&self) -> ExchangeAddressRegistry {
        if self.addresses.is_empty() {
            return ExchangeAddressRegistry::with_defaults();
        }
        self.addresses
            .iter()
            .map(|(addr, label)| (addr.clone(), label.clone()))
            .collect()
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file (`~` is expanded)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let raw = path.as_ref().to_string_lossy();
    let expanded = shellexpand::tilde(&raw).to_string();
    let content = std::fs::read_to_string(expanded)?;
    parse_config(&content)
}

/// Parse and validate configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.monitoring.whale_threshold_usd;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(invalid(format!(
                "whale_threshold_usd must be > 0, got {}",
                threshold
            )));
        }
        if self.monitoring.check_interval_seconds == 0 {
            return Err(invalid("check_interval_seconds must be > 0"));
        }
        if !is_evm_address(&self.monitoring.contract) {
            return Err(invalid(format!(
                "monitoring.contract is not a 0x-prefixed 20-byte address: {}",
                self.monitoring.contract
            )));
        }

        if self.explorer.base_url.is_empty() {
            return Err(invalid("explorer.base_url cannot be empty"));
        }
        if self.explorer.calls_per_second == 0 {
            return Err(invalid("explorer.calls_per_second must be > 0"));
        }
        if self.explorer.page_size == 0 || self.explorer.page_size > MAX_RESULT_WINDOW {
            return Err(invalid(format!(
                "explorer.page_size must be 1-{}, got {}",
                MAX_RESULT_WINDOW, self.explorer.page_size
            )));
        }
        if self.explorer.max_pages == 0 {
            return Err(invalid("explorer.max_pages must be > 0"));
        }
        let window = u64::from(self.explorer.page_size) * u64::from(self.explorer.max_pages);
        if window > u64::from(MAX_RESULT_WINDOW) {
            return Err(invalid(format!(
                "explorer.page_size * max_pages ({}) exceeds the {} row result window",
                window, MAX_RESULT_WINDOW
            )));
        }

        if self.market.base_url.is_empty() {
            return Err(invalid("market.base_url cannot be empty"));
        }
        if self.market.calls_per_minute == 0 {
            return Err(invalid("market.calls_per_minute must be > 0"));
        }
        if self.market.max_pages == 0 {
            return Err(invalid("market.max_pages must be > 0"));
        }

        if self.http.timeout_seconds == 0 {
            return Err(invalid("http.timeout_seconds must be > 0"));
        }
        if self.http.max_attempts == 0 {
            return Err(invalid("http.max_attempts must be >= 1"));
        }
        if self.http.retry_base_delay_ms > self.http.retry_max_delay_ms {
            return Err(invalid(format!(
                "http.retry_base_delay_ms ({}) exceeds retry_max_delay_ms ({})",
                self.http.retry_base_delay_ms, self.http.retry_max_delay_ms
            )));
        }

        self.discovery
            .filters
            .validate()
            .map_err(|e| invalid(format!("discovery: {}", e)))?;
        if self.discovery.per_strategy_limit == 0 {
            return Err(invalid("discovery.per_strategy_limit must be > 0"));
        }

        self.scoring
            .engine()
            .map_err(|e| invalid(format!("scoring: {}", e)))?;

        if let Some(addr) = self.exchanges.addresses.keys().find(|a| !is_evm_address(a)) {
            return Err(invalid(format!("exchanges: invalid address {}", addr)));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(invalid(format!("logging.level unknown: {}", other))),
        }
    }
}

fn key_or_env(configured: Option<&str>, var: &str) -> Option<String> {
    if let Some(key) = configured.filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }
    std::env::var(var).ok().filter(|k| !k.is_empty())
}

fn is_evm_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map_or(false, |hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}
