//! Exchange: one tracked market and its sync checkpoint.
//!
//! The rules here are the single-row semantics of the exchange registry.
//! Stores apply them to every row in scope; the in-memory store calls
//! these methods directly.

use serde::{Deserialize, Serialize};

use crate::listing::MarketListing;

/// Registry row for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub symbol: String,
    pub currency: String,
    /// Latest trade time reported by the market listing.
    pub latest_trade_known: i64,
    /// Sync checkpoint. `None` = not watched, `Some(0)` = never synced.
    pub latest_trade_stored: Option<i64>,
}

impl Exchange {
    /// A new, unwatched exchange seen for the first time in the listing.
    pub fn from_listing(listing: &MarketListing) -> Self {
        Self {
            symbol: listing.symbol.clone(),
            currency: listing.currency.clone(),
            latest_trade_known: listing.latest_trade,
            latest_trade_stored: None,
        }
    }

    /// Apply a fresh listing entry.
    ///
    /// Currency and `latest_trade_known` change only when the listed latest
    /// trade differs from the one already known. Returns whether the row
    /// changed.
    pub fn apply_listing(&mut self, listing: &MarketListing) -> bool {
        if self.latest_trade_known == listing.latest_trade {
            return false;
        }
        self.currency = listing.currency.clone();
        self.latest_trade_known = listing.latest_trade;
        true
    }

    /// Start watching. An exchange already being synced keeps its checkpoint.
    pub fn watch(&mut self) -> bool {
        if self.latest_trade_stored.is_some() {
            return false;
        }
        self.latest_trade_stored = Some(0);
        true
    }

    /// Stop watching, dropping the checkpoint.
    pub fn unwatch(&mut self) -> bool {
        self.latest_trade_stored.take().is_some()
    }

    pub fn is_watched(&self) -> bool {
        self.latest_trade_stored.is_some()
    }

    /// Watched and behind the listing.
    pub fn needs_sync(&self) -> bool {
        matches!(self.latest_trade_stored, Some(stored) if stored < self.latest_trade_known)
    }

    /// Move the checkpoint forward to `time`. Never moves it backwards.
    pub fn advance_checkpoint(&mut self, time: i64) -> bool {
        match self.latest_trade_stored {
            Some(stored) if stored >= time => false,
            _ => {
                self.latest_trade_stored = Some(time);
                true
            }
        }
    }
}

/// Which exchanges a registry operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    All,
    Currency(String),
    Symbol(String),
}

impl WatchScope {
    pub fn matches(&self, exchange: &Exchange) -> bool {
        match self {
            WatchScope::All => true,
            WatchScope::Currency(currency) => &exchange.currency == currency,
            WatchScope::Symbol(symbol) => &exchange.symbol == symbol,
        }
    }
}
