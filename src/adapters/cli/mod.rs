//! CLI Adapter
//!
//! Command-line interface for the TradeMind scanner.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, GemsCmd, ScoreCmd, StrategyArg, WatchCmd, WhalesCmd};
