//! TradeMind - Whale tracker and gem scanner library
//!
//! Flags whale-sized token transfers and exchange flows from a BscScan-style
//! explorer, and discovers and scores low-cap tokens from a CoinGecko-style
//! market data feed.
//!
//! # Modules
//!
//! - `domain`: Core scanning logic (WhaleClassifier, DiscoveryFilters, ScoreEngine)
//! - `ports`: Trait abstractions (ChainExplorerPort, MarketDataPort, AlertRenderer)
//! - `adapters`: External implementations (HTTP client, BscScan, CoinGecko, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: WhaleTracker, GemFinder and the blocking scanner

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
