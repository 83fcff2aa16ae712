//! Store trait: the abstract interface for ledger and registry persistence.
//!
//! This trait allows the sync engine to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::collections::VecDeque;

use async_trait::async_trait;
use tradeledger_core::{
    Exchange, MarketListing, Trade, TradeCursor, TradeQuery, TradeRow, WatchScope,
};

use crate::error::Result;

/// Outcome of applying a market listing to the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Symbols seen for the first time.
    pub inserted: usize,
    /// Known symbols whose latest trade moved.
    pub updated: usize,
    /// Known symbols left as they were.
    pub unchanged: usize,
}

/// The Store trait: async interface for ledger and registry persistence.
///
/// All methods are async to support both blocking (SQLite) and async
/// backends. For SQLite, each call runs on `spawn_blocking`.
///
/// # Design Notes
///
/// - **Upsert-only registry**: exchanges are inserted or updated, never deleted.
/// - **Monotonic checkpoints**: [`Store::advance_checkpoint`] never moves a
///   checkpoint backwards.
/// - **Exact matching**: price and volume are compared as text.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Exchange Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a market listing: insert unseen symbols, update known ones whose
    /// latest trade changed. Applied atomically.
    async fn refresh_listing(&self, listings: &[MarketListing]) -> Result<RefreshStats>;

    /// Get one exchange by symbol.
    async fn get_exchange(&self, symbol: &str) -> Result<Option<Exchange>>;

    /// Enable or disable watching for every exchange in `scope`.
    ///
    /// Enabling only touches exchanges that are not watched yet; disabling
    /// clears the checkpoint. Returns the number of exchanges changed.
    async fn set_watched(&self, scope: &WatchScope, enabled: bool) -> Result<usize>;

    /// Symbols that are watched and behind the listing, ordered by symbol.
    async fn symbols_needing_sync(&self) -> Result<Vec<String>>;

    /// Raise the checkpoint of `symbol` to `time` if it is lower or absent.
    ///
    /// Returns whether the checkpoint moved.
    async fn advance_checkpoint(&self, symbol: &str, time: i64) -> Result<bool>;

    /// Consecutive rebootstraps of `symbol` that made no progress, 0 if unknown.
    async fn rebootstrap_attempts(&self, symbol: &str) -> Result<u32>;

    /// Record the consecutive rebootstrap count of a registered symbol.
    async fn set_rebootstrap_attempts(&self, symbol: &str, attempts: u32) -> Result<()>;

    /// Distinct currencies in the registry, sorted.
    async fn currencies(&self) -> Result<Vec<String>>;

    /// Symbols in the registry, optionally restricted to one currency, sorted.
    async fn symbols(&self, currency: Option<&str>) -> Result<Vec<String>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Trade Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Greatest trade time stored for `symbol`, if any.
    async fn latest_trade_time(&self, symbol: &str) -> Result<Option<i64>>;

    /// Whether a trade with exactly this `(time, price, volume)` exists for `symbol`.
    async fn contains_trade(&self, symbol: &str, row: &TradeRow) -> Result<bool>;

    /// Append rows for `symbol` in order, as one atomic batch.
    ///
    /// The symbol must be in the registry. Returns the number of rows written.
    async fn append_trades(&self, symbol: &str, rows: Vec<TradeRow>) -> Result<usize>;

    /// Delete every trade of `symbol`. Returns the number of rows removed.
    async fn delete_trades(&self, symbol: &str) -> Result<usize>;

    /// Number of trades stored for `symbol`.
    async fn count_trades(&self, symbol: &str) -> Result<u64>;

    /// One page of a range query, strictly after `after` in the query's order.
    async fn trades_page(
        &self,
        query: &TradeQuery,
        after: Option<TradeCursor>,
        limit: usize,
    ) -> Result<Vec<Trade>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Walk a range query lazily, `page_size` rows at a time.
    fn scan(&self, query: TradeQuery, page_size: usize) -> TradeScan<'_, Self> {
        TradeScan::new(self, query, page_size)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// A forward-only cursor over a ledger range.
///
/// Pages are fetched on demand with keyset pagination on `(time, id)`, so
/// memory use is bounded by the page size regardless of the range.
pub struct TradeScan<'a, S: Store + ?Sized> {
    store: &'a S,
    query: TradeQuery,
    page_size: usize,
    buffer: VecDeque<Trade>,
    after: Option<TradeCursor>,
    exhausted: bool,
}

impl<'a, S: Store + ?Sized> TradeScan<'a, S> {
    pub fn new(store: &'a S, query: TradeQuery, page_size: usize) -> Self {
        Self {
            store,
            query,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            after: None,
            exhausted: false,
        }
    }

    /// Next trade in query order, or `None` once the range is consumed.
    pub async fn next(&mut self) -> Result<Option<Trade>> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = self
                .store
                .trades_page(&self.query, self.after, self.page_size)
                .await?;
            if page.len() < self.page_size {
                self.exhausted = true;
            }
            if let Some(last) = page.last() {
                self.after = Some(last.cursor());
            }
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }

    /// Consume the rest of the range, returning how many trades remained.
    pub async fn count_remaining(&mut self) -> Result<u64> {
        let mut count = 0;
        while self.next().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}
