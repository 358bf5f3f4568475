//! Plain-text alert rendering for terminals and log sinks

use crate::domain::{Candidate, FlowDirection, ScoreResult, WhaleEvent};
use crate::ports::AlertRenderer;

#[derive(Debug, Clone, Default)]
pub struct PlainTextAlertRenderer;

impl PlainTextAlertRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl AlertRenderer for PlainTextAlertRenderer {
    fn render_whale(&self, event: &WhaleEvent) -> String {
        let transfer = &event.transfer;
        let symbol = transfer.token_symbol.as_deref().unwrap_or("tokens");
        let direction = match event.flow {
            FlowDirection::In => "Exchange inflow",
            FlowDirection::Out => "Exchange outflow",
            FlowDirection::None => "Wallet transfer",
        };

        let mut lines = vec![
            format!("WHALE ALERT [{}]", event.risk_level),
            format!(
                "Value: ${} ({} {})",
                group_thousands(event.usd_value, 0),
                group_thousands(transfer.amount(), 2),
                symbol
            ),
            format!("Flow: {}", direction),
            format!("From: {}", short_address(&transfer.from)),
            format!("To: {}", short_address(&transfer.to)),
        ];
        if let Some(label) = &event.from_exchange {
            lines.push(format!("From exchange: {}", label));
        }
        if let Some(label) = &event.to_exchange {
            lines.push(format!("To exchange: {}", label));
        }
        if let Some(impact) = event.price_impact_pct {
            lines.push(format!("Est. price impact: {:.2}%", impact));
        }
        lines.push(format!(
            "Block {} at {}",
            transfer.block_number,
            transfer.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(format!("Tx: {}", transfer.tx_hash));
        lines.join("\n")
    }

    fn render_score(&self, candidate: &Candidate, result: &ScoreResult) -> String {
        let s = &result.sub_scores;
        [
            format!("{} ({}) via {}", candidate.name, candidate.symbol, candidate.source),
            format!(
                "Score: {:.1}/100 (grade {}), raw {:.1}",
                result.risk_adjusted, result.grade, result.composite
            ),
            format!("Recommendation: {}", result.recommendation),
            format!(
                "Social {:.1} | On-chain {:.1} | Dev {:.1} | Liquidity {:.1} | Holders {:.1}",
                s.social, s.on_chain, s.developer, s.liquidity, s.holder
            ),
            format!(
                "Momentum {:.1} | Trend {:.1} | Risk {:.1}",
                result.momentum, result.trend, result.risk
            ),
            format!(
                "Market cap ${} | 24h volume ${}",
                group_thousands(candidate.market.market_cap_usd, 0),
                group_thousands(candidate.market.volume_24h_usd, 0)
            ),
        ]
        .join("\n")
    }
}

/// `0x3f5ce5fb...36f0be`
fn short_address(address: &str) -> String {
    if address.len() <= 16 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..10], &address[address.len() - 6..])
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DiscoverySource, ExchangeAddressRegistry, MarketSnapshot, ScoreEngine, TransferRecord,
        WhaleClassifier,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(1_234_567.0, 0), "1,234,567");
        assert_eq!(group_thousands(125_000.0, 2), "125,000.00");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(-4_500.5, 1), "-4,500.5");
    }

    #[test]
    fn test_whale_alert_lists_exchange() {
        let classifier =
            WhaleClassifier::new(100_000.0, ExchangeAddressRegistry::with_defaults()).unwrap();
        let record = TransferRecord {
            tx_hash: "0xfeed".to_string(),
            from: "0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be".to_string(),
            to: "0x1111111111111111111111111111111111111111".to_string(),
            contract: "0xcake".to_string(),
            token_symbol: Some("CAKE".to_string()),
            raw_amount: 50_000_000_000,
            decimals: 6,
            block_number: 42,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        let event = classifier.classify(&record, 2.5).unwrap();

        let text = PlainTextAlertRenderer::new().render_whale(&event);

        assert!(text.starts_with("WHALE ALERT [LOW]"));
        assert!(text.contains("Value: $125,000 (50,000.00 CAKE)"));
        assert!(text.contains("Flow: Exchange outflow"));
        assert!(text.contains("From: 0x3f5ce5fb...36f0be"));
        assert!(text.contains("From exchange: Binance"));
        assert!(text.contains("2024-01-02 03:04:05 UTC"));
    }

    #[test]
    fn test_score_report_mentions_recommendation() {
        let candidate = Candidate {
            id: "gem".to_string(),
            symbol: "GEM".to_string(),
            name: "Gem".to_string(),
            market: MarketSnapshot {
                market_cap_usd: 2_000_000.0,
                volume_24h_usd: 150_000.0,
                ..Default::default()
            },
            listing_age_days: None,
            social: None,
            developer: None,
            liquidity: None,
            holders: None,
            source: DiscoverySource::Trending,
            discovered_at: Utc::now(),
        };
        let result = ScoreEngine::default().score(&candidate);

        let text = PlainTextAlertRenderer::new().render_score(&candidate, &result);

        assert!(text.starts_with("Gem (GEM) via trending"));
        assert!(text.contains("Recommendation: AVOID"));
        assert!(text.contains("Market cap $2,000,000"));
    }
}
