//! Quote snapshot and the provider abstraction used by the fetch stage

use crate::core::error::UpstreamError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One exchange rate snapshot for a currency pair.
///
/// Every field is kept exactly as the rate source sent it. Numeric looking
/// values stay as text, nothing is parsed or rounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

impl Quote {
    /// Decodes a rate source body of the form `{"USDBRL": {...}}`.
    ///
    /// Fails unless the object under `pair_key` carries every quote field.
    pub fn from_response(body: &[u8], pair_key: &str) -> Result<Self, UpstreamError> {
        let mut root: Value = serde_json::from_slice(body)
            .map_err(|e| UpstreamError::Decode(format!("invalid JSON: {e}")))?;

        let entry = root
            .get_mut(pair_key)
            .map(Value::take)
            .ok_or_else(|| UpstreamError::Decode(format!("missing key {pair_key}")))?;

        serde_json::from_value(entry)
            .map_err(|e| UpstreamError::Decode(format!("unexpected {pair_key} shape: {e}")))
    }
}

/// Response key used by the rate source for a pair, `USD-BRL` becomes `USDBRL`.
pub fn pair_key(pair: &str) -> String {
    pair.chars().filter(|c| *c != '-').collect()
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self) -> Result<Quote, UpstreamError>;
}
