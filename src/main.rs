//! TradeMind - Whale tracker and gem scanner
//!
//! Wires the BscScan and CoinGecko clients into the scanners and runs one CLI command.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use trademind::adapters::cli::{CliApp, Command, GemsCmd, ScoreCmd, WatchCmd, WhalesCmd};
use trademind::adapters::http::{ApiClient, HttpTransport, RateLimiter, ReqwestTransport};
use trademind::adapters::{
    bscscan, coingecko, BscScanClient, CoinGeckoClient, PlainTextAlertRenderer,
};
use trademind::application::{BlockingScanner, ComprehensiveScan, GemFinder, WhaleTracker};
use trademind::config::{load_config, Config};
use trademind::domain::{DiscoverySource, ScoreEngine, WhaleClassifier, WhaleEvent};
use trademind::ports::{AlertRenderer, MarketDataPort};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API keys go here, not in the config file)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    let services = Services::build(&config)?;
    let clients = services.clients.clone();

    let result = match app.command {
        Command::Whales(cmd) => whales_command(cmd, &config, services).await,
        Command::Gems(cmd) => gems_command(cmd, services).await,
        Command::Score(cmd) => score_command(cmd, services).await,
        Command::Watch(cmd) => watch_command(cmd, &config, services).await,
    };

    clients.log_stats();
    result
}

fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    let directive = log_directive(verbose, debug, std::env::var("RUST_LOG").ok(), configured);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter {:?}", directive))?;

    fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

/// `--debug` and `--verbose` win over `RUST_LOG`, which wins over the config file
fn log_directive(verbose: bool, debug: bool, env: Option<String>, configured: &str) -> String {
    if debug {
        return "debug".to_string();
    }
    if verbose {
        return "info".to_string();
    }
    env.filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}

/// Upstream clients, kept for stats reporting
#[derive(Clone)]
struct Clients {
    explorer: Arc<BscScanClient>,
    market: Arc<CoinGeckoClient>,
}

impl Clients {
    fn log_stats(&self) {
        let explorer = self.explorer.api().stats();
        let market = self.market.api().stats();
        tracing::info!(
            "bscscan: {} requests, {} retries, {} failures, {} rows quarantined",
            explorer.requests,
            explorer.retries,
            explorer.failures,
            self.explorer.quarantined()
        );
        tracing::info!(
            "coingecko: {} requests, {} retries, {} failures, {} rows quarantined",
            market.requests,
            market.retries,
            market.failures,
            self.market.quarantined()
        );
    }
}

/// Fully wired scanners for one process
struct Services {
    clients: Clients,
    tracker: WhaleTracker,
    finder: GemFinder,
    engine: ScoreEngine,
    renderer: Arc<PlainTextAlertRenderer>,
}

impl Services {
    fn build(config: &Config) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(
            ReqwestTransport::new(&config.http.user_agent)
                .context("Failed to create HTTP client")?,
        );

        let explorer_limiter = RateLimiter::per_second(config.explorer.calls_per_second)
            .context("Invalid explorer rate limit")?;
        let explorer_key = config.explorer.get_api_key();
        if explorer_key.is_none() {
            tracing::warn!("No BscScan API key configured, requests use the keyless quota");
        }
        let explorer_api = ApiClient::new(
            bscscan::api_client_config(&config.explorer.base_url, explorer_key.as_deref())
                .with_timeout(config.http.timeout())
                .with_retry(config.http.retry_policy()),
            transport.clone(),
            Arc::new(explorer_limiter),
        );
        let explorer = Arc::new(BscScanClient::new(
            Arc::new(explorer_api),
            config.explorer.client_config(),
        ));

        let market_limiter = RateLimiter::per_minute(config.market.calls_per_minute)
            .context("Invalid market data rate limit")?;
        let market_key = config.market.get_api_key();
        let market_api = ApiClient::new(
            coingecko::api_client_config(&config.market.base_url, market_key.as_deref())
                .with_timeout(config.http.timeout())
                .with_retry(config.http.retry_policy()),
            transport,
            Arc::new(market_limiter),
        );
        let market = Arc::new(CoinGeckoClient::new(
            Arc::new(market_api),
            config.market.client_config(),
        ));

        let classifier = WhaleClassifier::new(
            config.monitoring.whale_threshold_usd,
            config.exchanges.registry(),
        )
        .context("Invalid whale threshold")?;
        let renderer = Arc::new(PlainTextAlertRenderer::new());
        let tracker = WhaleTracker::new(explorer.clone(), classifier, renderer.clone());

        let finder = GemFinder::new(
            market.clone(),
            config.discovery.filters.clone(),
            config.discovery.per_strategy_limit,
        )
        .context("Invalid discovery filters")?;
        let engine = config.scoring.engine().context("Invalid scoring weights")?;

        Ok(Self {
            clients: Clients { explorer, market },
            tracker,
            finder,
            engine,
            renderer,
        })
    }
}

/// Whale events plus any exchange balances looked up for them
type WhaleReport = (Vec<WhaleEvent>, Vec<(String, f64)>);

async fn whales_command(cmd: WhalesCmd, config: &Config, services: Services) -> Result<()> {
    let contract = cmd
        .contract
        .clone()
        .unwrap_or_else(|| config.monitoring.contract.clone());
    tracing::info!("Scanning {} for whale transfers at ${}", contract, cmd.price);

    let renderer = services.renderer.clone();
    let (events, balances) = if cmd.blocking {
        // the blocking scanner owns its runtime, so keep it off the async workers
        let Services { tracker, finder, .. } = services;
        tokio::task::spawn_blocking(move || -> Result<WhaleReport> {
            let scanner = BlockingScanner::new(tracker, finder)?;
            let events = match cmd.liquidity {
                Some(liquidity) => scanner.scan_whales_with_liquidity(
                    &contract,
                    cmd.price,
                    cmd.since_block,
                    liquidity,
                )?,
                None => scanner.scan_whales(&contract, cmd.price, cmd.since_block)?,
            };
            let mut balances = Vec::new();
            if cmd.balances {
                for address in exchange_addresses(&events) {
                    let balance = scanner.exchange_balance(&address)?;
                    balances.push((address, balance));
                }
            }
            Ok((events, balances))
        })
        .await
        .context("Blocking scanner task failed")??
    } else {
        let tracker = &services.tracker;
        let events = match cmd.liquidity {
            Some(liquidity) => {
                tracker
                    .scan_with_liquidity(&contract, cmd.price, cmd.since_block, liquidity)
                    .await?
            }
            None => tracker.scan(&contract, cmd.price, cmd.since_block).await?,
        };
        let mut balances = Vec::new();
        if cmd.balances {
            for address in exchange_addresses(&events) {
                let balance = tracker.exchange_balance(&address).await?;
                balances.push((address, balance));
            }
        }
        (events, balances)
    };

    if events.is_empty() {
        println!("No whale transfers found");
    }
    for event in &events {
        println!("{}\n", renderer.render_whale(event));
    }
    for (address, balance) in &balances {
        println!("Balance {}: {:.4} BNB", address, balance);
    }
    Ok(())
}

async fn gems_command(cmd: GemsCmd, services: Services) -> Result<()> {
    let Services {
        finder,
        tracker,
        engine,
        renderer,
        ..
    } = services;

    let scan: ComprehensiveScan = match (cmd.strategy, cmd.blocking) {
        (Some(strategy), false) => finder.scan(strategy.into()).await?.into(),
        (None, false) => finder.comprehensive_scan().await,
        (strategy, true) => {
            tokio::task::spawn_blocking(move || -> Result<ComprehensiveScan> {
                let scanner = BlockingScanner::new(tracker, finder)?;
                Ok(match strategy {
                    Some(strategy) => scanner.scan_strategy(strategy.into())?.into(),
                    None => scanner.comprehensive_scan(),
                })
            })
            .await
            .context("Blocking scanner task failed")??
        }
    };

    for failure in &scan.failures {
        eprintln!("Strategy {} failed: {}", failure.strategy, failure.error);
    }
    for skip in &scan.skipped {
        eprintln!("Skipped {} in {}: {}", skip.id, skip.strategy, skip.error);
    }
    if scan.candidates.is_empty() {
        if scan.is_complete() {
            println!("No candidates passed the discovery filters");
            return Ok(());
        }
        bail!("Every discovery strategy failed");
    }

    let ranked = engine.rank(&scan.candidates);
    println!(
        "{} candidates, top {}:\n",
        scan.candidates.len(),
        cmd.top.min(ranked.len())
    );
    for result in ranked.iter().take(cmd.top) {
        if let Some(candidate) = scan.candidates.iter().find(|c| c.id == result.token_id) {
            println!("{}\n", renderer.render_score(candidate, result));
        }
    }
    Ok(())
}

async fn score_command(cmd: ScoreCmd, services: Services) -> Result<()> {
    let source: DiscoverySource = cmd.source.into();
    let candidate = services
        .clients
        .market
        .candidate(&cmd.id, source)
        .await
        .with_context(|| format!("Failed to fetch {}", cmd.id))?;

    let result = services.engine.score(&candidate);
    let passes = services.finder.filters().check(&candidate);

    println!("{}", services.renderer.render_score(&candidate, &result));
    match passes {
        Ok(()) => println!("Discovery filters: pass"),
        Err(rejection) => println!("Discovery filters: fail ({:?})", rejection),
    }
    Ok(())
}

async fn watch_command(cmd: WatchCmd, config: &Config, services: Services) -> Result<()> {
    let contract = cmd
        .contract
        .clone()
        .unwrap_or_else(|| config.monitoring.contract.clone());
    let interval = cmd
        .interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.monitoring.check_interval());
    if interval.is_zero() {
        bail!("Watch interval must be > 0");
    }

    tracing::info!(
        "Watching {} every {:?} (threshold ${:.0})",
        contract,
        interval,
        services.tracker.classifier().threshold_usd()
    );

    // the first poll starts at the head so history is not replayed as alerts
    let mut since_block = cmd.since_block;
    if since_block.is_none() {
        let head = services
            .tracker
            .start_from_latest()
            .await
            .context("Failed to read the latest block")?;
        tracing::info!("Starting at block {}", head);
    }

    let mut ticker = tokio::time::interval(interval);
    let mut polls = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }

        match services
            .tracker
            .scan_unseen(&contract, cmd.price, since_block)
            .await
        {
            Ok(events) => {
                // later polls follow the tracker cursor once it has one
                if services.tracker.cursor().is_some() {
                    since_block = None;
                }
                for event in &events {
                    println!("{}\n", services.tracker.render_alert(event));
                }
            }
            // keep the loop alive across upstream outages
            Err(e) => tracing::error!("Whale poll failed: {}", e),
        }

        polls += 1;
        if cmd.iterations.map_or(false, |max| polls >= max) {
            break;
        }
    }

    tracing::info!("Watch stopped after {} polls", polls);
    Ok(())
}

/// Distinct exchange-side addresses of the events, for balance context
fn exchange_addresses(events: &[WhaleEvent]) -> BTreeSet<String> {
    let mut addresses = BTreeSet::new();
    for event in events {
        if event.from_exchange.is_some() {
            addresses.insert(event.transfer.from.clone());
        }
        if event.to_exchange.is_some() {
            addresses.insert(event.transfer.to.clone());
        }
    }
    addresses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_rust_log() {
        let env = || Some("warn,trademind=trace".to_string());
        assert_eq!(log_directive(false, true, env(), "warn"), "debug");
        assert_eq!(log_directive(true, false, env(), "warn"), "info");
        assert_eq!(log_directive(false, false, env(), "warn"), "warn,trademind=trace");
    }

    #[test]
    fn test_config_level_without_env() {
        assert_eq!(log_directive(false, false, None, "error"), "error");
        assert_eq!(log_directive(false, false, Some("  ".to_string()), "error"), "error");
    }
}
