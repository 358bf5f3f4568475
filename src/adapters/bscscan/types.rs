//! BscScan wire schema, version `bscscan.tokentx.v1`
//!
//! Every response is an envelope `{status, message, result}` of strings.
//! `status == "1"` carries data; `status == "0"` carries an error message
//! in `message` / `result`, except for the empty-history case.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::TransferRecord;
use crate::ports::ApiError;

pub const TOKENTX_SCHEMA: &str = "bscscan.tokentx.v1";
pub const BALANCE_SCHEMA: &str = "bscscan.balance.v1";
pub const BLOCK_NUMBER_SCHEMA: &str = "bscscan.eth_blockNumber.v1";

const NO_TRANSACTIONS: &str = "No transactions found";
const NATIVE_DECIMALS: i32 = 18;

#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: String,
    pub message: String,
    pub result: Value,
}

impl Envelope {
    pub fn parse(body: &str, schema: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body)
            .map_err(|e| ApiError::Decode(format!("{} envelope: {}", schema, e)))
    }

    fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// Error for a `status == "0"` envelope
    fn upstream_error(&self) -> ApiError {
        let detail = match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if detail.to_ascii_lowercase().contains("rate limit")
            || self.message.to_ascii_lowercase().contains("rate limit")
        {
            ApiError::RateLimited(detail)
        } else {
            ApiError::Upstream(format!("{}: {}", self.message, detail))
        }
    }
}

/// One `tokentx` row as sent by the upstream (all strings)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTxRow {
    pub block_number: String,
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub contract_address: String,
    pub value: String,
    #[serde(default)]
    pub token_symbol: Option<String>,
    pub token_decimal: String,
}

impl TokenTxRow {
    /// Check field formats and build the domain record
    pub fn validate(self) -> Result<TransferRecord, String> {
        if !self.hash.starts_with("0x") || self.hash.len() < 3 {
            return Err(format!("bad hash {:?}", self.hash));
        }
        for (field, address) in [
            ("from", &self.from),
            ("to", &self.to),
            ("contractAddress", &self.contract_address),
        ] {
            if !is_address(address) {
                return Err(format!("bad {} address {:?}", field, address));
            }
        }
        let raw_amount: u128 = self
            .value
            .parse()
            .map_err(|_| format!("bad value {:?}", self.value))?;
        let decimals: u8 = self
            .token_decimal
            .parse()
            .map_err(|_| format!("bad tokenDecimal {:?}", self.token_decimal))?;
        let block_number: u64 = self
            .block_number
            .parse()
            .map_err(|_| format!("bad blockNumber {:?}", self.block_number))?;
        let timestamp = self
            .time_stamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| format!("bad timeStamp {:?}", self.time_stamp))?;

        Ok(TransferRecord {
            tx_hash: self.hash,
            from: self.from.to_ascii_lowercase(),
            to: self.to.to_ascii_lowercase(),
            contract: self.contract_address.to_ascii_lowercase(),
            token_symbol: self.token_symbol.filter(|s| !s.is_empty()),
            raw_amount,
            decimals,
            block_number,
            timestamp,
        })
    }
}

fn is_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Decoded `tokentx` page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferPage {
    pub records: Vec<TransferRecord>,
    /// Rows received, valid or not (drives pagination)
    pub row_count: usize,
    pub quarantined: usize,
}

pub fn decode_tokentx(body: &str) -> Result<TransferPage, ApiError> {
    let envelope = Envelope::parse(body, TOKENTX_SCHEMA)?;

    if !envelope.is_ok() {
        let empty_result = matches!(&envelope.result, Value::Array(rows) if rows.is_empty());
        if envelope.message.starts_with(NO_TRANSACTIONS) || empty_result {
            return Ok(TransferPage::default());
        }
        return Err(envelope.upstream_error());
    }

    let Value::Array(rows) = envelope.result else {
        return Err(ApiError::Decode(format!(
            "{}: result is not an array",
            TOKENTX_SCHEMA
        )));
    };

    let mut page = TransferPage {
        row_count: rows.len(),
        ..Default::default()
    };
    for row in rows {
        let hash = row
            .get("hash")
            .and_then(Value::as_str)
            .unwrap_or("<none>")
            .to_string();
        let parsed = serde_json::from_value::<TokenTxRow>(row)
            .map_err(|e| e.to_string())
            .and_then(TokenTxRow::validate);
        match parsed {
            Ok(record) => page.records.push(record),
            Err(reason) => {
                page.quarantined += 1;
                warn!("Quarantined {} row {}: {}", TOKENTX_SCHEMA, hash, reason);
            }
        }
    }
    Ok(page)
}

/// Native balance in whole coins (wei / 1e18)
pub fn decode_balance(body: &str) -> Result<f64, ApiError> {
    let envelope = Envelope::parse(body, BALANCE_SCHEMA)?;
    if !envelope.is_ok() {
        return Err(envelope.upstream_error());
    }
    let wei: u128 = envelope
        .result
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            ApiError::Decode(format!("{}: result is not an integer string", BALANCE_SCHEMA))
        })?;
    Ok(wei as f64 / 10f64.powi(NATIVE_DECIMALS))
}

/// Latest block from the JSON-RPC proxy (`{"jsonrpc","id","result":"0x.."}`).
/// Quota errors still arrive in the account-style envelope.
pub fn decode_block_number(body: &str) -> Result<u64, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Decode(format!("{}: {}", BLOCK_NUMBER_SCHEMA, e)))?;

    if value.get("status").is_some() {
        let envelope = Envelope::parse(body, BLOCK_NUMBER_SCHEMA)?;
        return Err(envelope.upstream_error());
    }
    if let Some(error) = value.get("error") {
        return Err(ApiError::Upstream(error.to_string()));
    }

    value
        .get("result")
        .and_then(Value::as_str)
        .and_then(|hex| hex.strip_prefix("0x"))
        .and_then(|hex| u64::from_str_radix(hex, 16).ok())
        .ok_or_else(|| {
            ApiError::Decode(format!("{}: result is not a hex quantity", BLOCK_NUMBER_SCHEMA))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"{
        "blockNumber": "100",
        "timeStamp": "1700000000",
        "hash": "0xaaa",
        "from": "0x3f5CE5FBFe3E9af3971dD833D26bA9b5C936f0bE",
        "to": "0x0000000000000000000000000000000000000001",
        "contractAddress": "0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82",
        "value": "125000000000000000000000",
        "tokenName": "Token",
        "tokenSymbol": "TKN",
        "tokenDecimal": "18"
    }"#;

    #[test]
    fn test_valid_row_normalized() {
        let row: TokenTxRow = serde_json::from_str(ROW).unwrap();
        let record = row.validate().unwrap();
        assert_eq!(record.from, "0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be");
        assert_eq!(record.raw_amount, 125_000_000_000_000_000_000_000);
        assert_eq!(record.decimals, 18);
        assert_eq!(record.block_number, 100);
        assert_eq!(record.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(record.token_symbol.as_deref(), Some("TKN"));
    }

    #[test]
    fn test_bad_value_rejected() {
        let mut row: TokenTxRow = serde_json::from_str(ROW).unwrap();
        row.value = "-5".to_string();
        assert!(row.validate().unwrap_err().contains("bad value"));
    }

    #[test]
    fn test_no_transactions_is_empty_page() {
        let body = r#"{"status":"0","message":"No transactions found","result":[]}"#;
        assert_eq!(decode_tokentx(body).unwrap(), TransferPage::default());
    }

    #[test]
    fn test_rate_limit_message_is_transient() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#;
        let err = decode_tokentx(body).unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_other_upstream_error_is_terminal() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        let err = decode_tokentx(body).unwrap_err();
        assert!(matches!(err, ApiError::Upstream(ref m) if m.contains("Invalid API Key")));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_envelope_failure_is_decode_error() {
        assert!(matches!(decode_tokentx("[1,2,3]"), Err(ApiError::Decode(_))));
        assert!(matches!(
            decode_tokentx(r#"{"status":"1","message":"OK","result":"oops"}"#),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_block_number_hex() {
        let body = r#"{"jsonrpc":"2.0","id":83,"result":"0x208a3f1"}"#;
        assert_eq!(decode_block_number(body).unwrap(), 34_120_689);

        let limited = r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#;
        assert!(matches!(decode_block_number(limited), Err(ApiError::RateLimited(_))));
        assert!(matches!(
            decode_block_number(r#"{"jsonrpc":"2.0","id":83,"result":"latest"}"#),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_balance_in_whole_coins() {
        let body = r#"{"status":"1","message":"OK","result":"2500000000000000000"}"#;
        assert_eq!(decode_balance(body).unwrap(), 2.5);
    }
}
