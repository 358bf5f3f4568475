//! CLI Command Definitions
//!
//! Argument parsing for the TradeMind scanner. Handlers live in `main.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::domain::DiscoverySource;

/// TradeMind - Whale tracker and gem scanner for BSC tokens
#[derive(Parser, Debug)]
#[command(
    name = "trademind",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Whale tracker and gem scanner for BSC tokens",
    long_about = "TradeMind watches explorer transfer feeds for whale-sized moves and \
                  exchange flows, and scans market-data listings for low-cap tokens \
                  scored across social, on-chain, developer, liquidity and holder dimensions."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a token contract for whale transfers
    Whales(WhalesCmd),

    /// Discover and rank gem candidates across all strategies
    Gems(GemsCmd),

    /// Score a single token by id
    Score(ScoreCmd),

    /// Poll a token contract and print new whale alerts
    Watch(WatchCmd),
}

/// Whale scan
#[derive(Parser, Debug)]
pub struct WhalesCmd {
    /// Token contract address (defaults to the configured contract)
    #[arg(long, value_name = "ADDRESS")]
    pub contract: Option<String>,

    /// Token price in USD
    #[arg(short, long, value_name = "USD", default_value = "1.0")]
    pub price: f64,

    /// First block to include
    #[arg(long, value_name = "BLOCK")]
    pub since_block: Option<u64>,

    /// Pool liquidity in USD, enables price impact estimates
    #[arg(long, value_name = "USD")]
    pub liquidity: Option<f64>,

    /// Also print native balances of the exchange wallets involved
    #[arg(long)]
    pub balances: bool,

    /// Run on the sequential blocking scanner
    #[arg(long)]
    pub blocking: bool,
}

/// Gem discovery
#[derive(Parser, Debug)]
pub struct GemsCmd {
    /// Number of ranked candidates to print
    #[arg(short, long, value_name = "N", default_value = "10")]
    pub top: usize,

    /// Run a single strategy instead of the comprehensive scan
    #[arg(short, long, value_enum, value_name = "STRATEGY")]
    pub strategy: Option<StrategyArg>,

    /// Run on the sequential blocking scanner
    #[arg(long)]
    pub blocking: bool,
}

/// Single token score
#[derive(Parser, Debug)]
pub struct ScoreCmd {
    /// Market-data token id (e.g., pancakeswap-token)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Strategy the snapshot is attributed to in the report
    #[arg(short, long, value_enum, value_name = "STRATEGY", default_value = "trending")]
    pub source: StrategyArg,
}

/// Periodic whale watch
#[derive(Parser, Debug)]
pub struct WatchCmd {
    /// Token contract address (defaults to the configured contract)
    #[arg(long, value_name = "ADDRESS")]
    pub contract: Option<String>,

    /// Token price in USD
    #[arg(short, long, value_name = "USD", default_value = "1.0")]
    pub price: f64,

    /// Override the configured check interval
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// First block to watch from (defaults to the current chain head)
    #[arg(long, value_name = "BLOCK")]
    pub since_block: Option<u64>,

    /// Stop after N polls (runs until Ctrl+C when omitted)
    #[arg(short = 'n', long, value_name = "N")]
    pub iterations: Option<u64>,
}

/// Discovery strategy selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Trending,
    NewListings,
    Volume,
    MarketCap,
    SocialBuzz,
}

impl From<StrategyArg> for DiscoverySource {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Trending => DiscoverySource::Trending,
            StrategyArg::NewListings => DiscoverySource::NewListing,
            StrategyArg::Volume => DiscoverySource::Volume,
            StrategyArg::MarketCap => DiscoverySource::MarketCap,
            StrategyArg::SocialBuzz => DiscoverySource::SocialBuzz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_app_parse_whales() {
        let args = vec!["trademind", "whales", "--contract", "0xabc", "--price", "2.5"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Whales(cmd) => {
                assert_eq!(cmd.contract.as_deref(), Some("0xabc"));
                assert_eq!(cmd.price, 2.5);
                assert!(cmd.since_block.is_none());
                assert!(cmd.liquidity.is_none());
                assert!(!cmd.blocking);
            }
            _ => panic!("Expected Whales command"),
        }
    }

    #[test]
    fn test_cli_app_parse_whales_with_options() {
        let args = vec![
            "trademind", "whales",
            "--since-block", "34120000",
            "--liquidity", "2000000",
            "--balances",
            "--blocking",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Whales(cmd) => {
                assert!(cmd.contract.is_none());
                assert_eq!(cmd.price, 1.0);
                assert_eq!(cmd.since_block, Some(34_120_000));
                assert_eq!(cmd.liquidity, Some(2_000_000.0));
                assert!(cmd.balances);
                assert!(cmd.blocking);
            }
            _ => panic!("Expected Whales command"),
        }
    }

    #[test]
    fn test_cli_app_parse_gems() {
        let args = vec!["trademind", "gems", "--top", "5", "--strategy", "social-buzz"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Gems(cmd) => {
                assert_eq!(cmd.top, 5);
                assert_eq!(cmd.strategy, Some(StrategyArg::SocialBuzz));
                assert_eq!(
                    DiscoverySource::from(StrategyArg::SocialBuzz),
                    DiscoverySource::SocialBuzz
                );
            }
            _ => panic!("Expected Gems command"),
        }
    }

    #[test]
    fn test_cli_app_parse_score() {
        let args = vec!["trademind", "score", "pancakeswap-token"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Score(cmd) => {
                assert_eq!(cmd.id, "pancakeswap-token");
                assert_eq!(cmd.source, StrategyArg::Trending);
            }
            _ => panic!("Expected Score command"),
        }
    }

    #[test]
    fn test_cli_app_parse_watch() {
        let args = vec!["trademind", "watch", "-i", "30", "-n", "3"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Watch(cmd) => {
                assert_eq!(cmd.interval, Some(30));
                assert_eq!(cmd.iterations, Some(3));
                assert!(cmd.since_block.is_none());
            }
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["trademind", "-v", "--debug", "gems", "--config", "custom.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.verbose);
        assert!(app.debug);
        assert_eq!(app.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_default_config_path() {
        let app = CliApp::try_parse_from(vec!["trademind", "score", "bonk"]).unwrap();
        assert_eq!(app.config, PathBuf::from("config/default.toml"));
    }

    #[test]
    fn test_score_requires_id() {
        assert!(CliApp::try_parse_from(vec!["trademind", "score"]).is_err());
    }
}
