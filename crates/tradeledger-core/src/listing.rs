//! JSON documents published by the remote feed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the market listing.
///
/// The listing carries many more fields per market; only these three drive
/// synchronization and the rest are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketListing {
    pub symbol: String,
    pub currency: String,
    /// Most recent trade time the remote knows of (Unix seconds).
    pub latest_trade: i64,
}

/// Weighted average prices for one currency over trailing windows.
///
/// Values are kept as the text the feed sent; a window is absent when the
/// currency had no trades in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedPrice {
    #[serde(rename = "24h", default)]
    pub day: Option<String>,
    #[serde(rename = "7d", default)]
    pub week: Option<String>,
    #[serde(rename = "30d", default)]
    pub month: Option<String>,
}

/// Weighted price snapshot keyed by currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedPrices {
    /// Snapshot time, when the feed includes one.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub currencies: BTreeMap<String, WeightedPrice>,
}

impl WeightedPrices {
    pub fn get(&self, currency: &str) -> Option<&WeightedPrice> {
        self.currencies.get(currency)
    }
}
