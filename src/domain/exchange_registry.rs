//! Known Exchange Addresses
//!
//! Read-only lookup from chain address to exchange label. The classifier
//! queries this to decide whether a transfer moves funds into or out of an
//! exchange. Addresses are matched case-insensitively.

use std::collections::HashMap;

/// Built-in BSC hot wallets used when the config provides no `[exchanges]` table
pub const DEFAULT_EXCHANGE_ADDRESSES: &[(&str, &str)] = &[
    // Binance hot wallets
    ("0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be", "Binance"),
    ("0xd551234ae421e3bcba99a0da6d736074f22192ff", "Binance"),
    ("0x564286362092d8e7936f0549571a803b203aaced", "Binance"),
    // Other majors
    ("0x6cc5f688a315f3dc28a7781717a9a798a59fda7b", "OKEx"),
    ("0x46705dfff24256421a05d056c29e81bdc09723b8", "Huobi"),
];

/// Owned address -> exchange label table
#[derive(Debug, Clone, Default)]
pub struct ExchangeAddressRegistry {
    labels: HashMap<String, String>,
}

impl ExchangeAddressRegistry {
    /// Empty registry (every lookup misses)
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with [`DEFAULT_EXCHANGE_ADDRESSES`]
    pub fn with_defaults() -> Self {
        DEFAULT_EXCHANGE_ADDRESSES
            .iter()
            .map(|(addr, label)| (addr.to_string(), label.to_string()))
            .collect()
    }

    /// Add or replace an entry
    pub fn insert(&mut self, address: impl AsRef<str>, label: impl Into<String>) {
        self.labels
            .insert(normalize(address.as_ref()), label.into());
    }

    /// Exchange label for an address, if it is a known exchange wallet
    pub fn lookup(&self, address: &str) -> Option<&str> {
        self.labels.get(&normalize(address)).map(String::as_str)
    }

    pub fn is_exchange(&self, address: &str) -> bool {
        self.lookup(address).is_some()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ExchangeAddressRegistry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (address, label) in iter {
            registry.insert(address, label);
        }
        registry
    }
}

fn normalize(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}
