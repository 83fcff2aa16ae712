//! Test fixtures and helpers.
//!
//! Common setup code for sync and integration tests.

use std::sync::Arc;

use tradeledger_core::{MarketListing, TradeQuery, TradeRow, WatchScope};
use tradeledger_feed::MemoryFeed;
use tradeledger_store::{MemoryStore, Store, StoreExt};

/// Build a feed row. Panics on invalid input.
pub fn row(time: i64, price: &str, volume: &str) -> TradeRow {
    let time = time.to_string();
    TradeRow::from_fields([time.as_str(), price, volume]).expect("valid fixture row")
}

/// Build several feed rows.
pub fn rows(fields: &[(i64, &str, &str)]) -> Vec<TradeRow> {
    fields.iter().map(|(t, p, v)| row(*t, p, v)).collect()
}

pub fn listing(symbol: &str, currency: &str, latest_trade: i64) -> MarketListing {
    MarketListing {
        symbol: symbol.to_owned(),
        currency: currency.to_owned(),
        latest_trade,
    }
}

/// A memory store and a memory feed, shared so tests can inspect both
/// while an engine holds them.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub feed: Arc<MemoryFeed>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            feed: Arc::new(MemoryFeed::new()),
        }
    }

    /// Publish a consistent market: archive and delta both serve `rows`, and
    /// the listing claims the last row's time as the latest trade.
    pub async fn publish(&self, symbol: &str, currency: &str, rows: &[TradeRow]) {
        let latest = rows.iter().map(|r| r.time).max().unwrap_or(0);
        self.publish_parts(symbol, currency, latest, rows, rows.to_vec())
            .await;
    }

    /// Publish a market whose archive, delta and listing may disagree.
    pub async fn publish_parts(
        &self,
        symbol: &str,
        currency: &str,
        latest_known: i64,
        history: &[TradeRow],
        delta: Vec<TradeRow>,
    ) {
        self.feed
            .upsert_market(listing(symbol, currency, latest_known))
            .await;
        self.feed
            .set_history(symbol, history)
            .await
            .expect("gzip into memory");
        self.feed.set_trades(symbol, delta).await;
    }

    /// Apply the feed's current listing to the store and watch everything.
    pub async fn register_and_watch(&self) {
        let markets = self.feed.markets_snapshot().await;
        self.store
            .refresh_listing(&markets)
            .await
            .expect("refresh listing");
        self.store
            .set_watched(&WatchScope::All, true)
            .await
            .expect("watch all");
    }

    /// Every ledger row of `symbol` in ledger order.
    pub async fn ledger(&self, symbol: &str) -> Vec<TradeRow> {
        let mut scan = self.store.scan(TradeQuery::symbol(symbol), 256);
        let mut out = Vec::new();
        while let Some(trade) = scan.next().await.expect("scan ledger") {
            out.push(trade.row());
        }
        out
    }

    /// Checkpoint of `symbol`, if the exchange exists and is watched.
    pub async fn checkpoint(&self, symbol: &str) -> Option<i64> {
        self.store
            .get_exchange(symbol)
            .await
            .expect("get exchange")
            .and_then(|ex| ex.latest_trade_stored)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
