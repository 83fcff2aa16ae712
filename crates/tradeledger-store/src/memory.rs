//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use tradeledger_core::{
    Exchange, MarketListing, SortOrder, Trade, TradeCursor, TradeQuery, TradeRow, TradeScope,
    WatchScope,
};

use crate::error::{Result, StoreError};
use crate::traits::{RefreshStats, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Exchanges indexed by symbol.
    exchanges: BTreeMap<String, Exchange>,

    /// Trades in insertion order (ascending id).
    trades: Vec<Trade>,

    /// Next id to hand out; never rewinds, even after deletes.
    next_id: i64,

    /// Rebootstrap attempts by symbol; absent means 0.
    rebootstraps: BTreeMap<String, u32>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                exchanges: BTreeMap::new(),
                trades: Vec::new(),
                next_id: 1,
                rebootstraps: BTreeMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn in_scope(&self, scope: &TradeScope, trade: &Trade) -> bool {
        match scope {
            TradeScope::All => true,
            TradeScope::Symbol(symbol) => &trade.symbol == symbol,
            TradeScope::Currency(currency) => self
                .exchanges
                .get(&trade.symbol)
                .is_some_and(|ex| &ex.currency == currency),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn refresh_listing(&self, listings: &[MarketListing]) -> Result<RefreshStats> {
        let mut inner = self.write()?;
        let mut stats = RefreshStats::default();

        for listing in listings {
            match inner.exchanges.entry(listing.symbol.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(Exchange::from_listing(listing));
                    stats.inserted += 1;
                }
                Entry::Occupied(mut slot) => {
                    if slot.get_mut().apply_listing(listing) {
                        stats.updated += 1;
                    } else {
                        stats.unchanged += 1;
                    }
                }
            }
        }

        Ok(stats)
    }

    async fn get_exchange(&self, symbol: &str) -> Result<Option<Exchange>> {
        Ok(self.read()?.exchanges.get(symbol).cloned())
    }

    async fn set_watched(&self, scope: &WatchScope, enabled: bool) -> Result<usize> {
        let mut inner = self.write()?;
        let changed = inner
            .exchanges
            .values_mut()
            .filter(|ex| scope.matches(ex))
            .map(|ex| if enabled { ex.watch() } else { ex.unwatch() })
            .filter(|changed| *changed)
            .count();
        Ok(changed)
    }

    async fn symbols_needing_sync(&self) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .exchanges
            .values()
            .filter(|ex| ex.needs_sync())
            .map(|ex| ex.symbol.clone())
            .collect())
    }

    async fn advance_checkpoint(&self, symbol: &str, time: i64) -> Result<bool> {
        Ok(self
            .write()?
            .exchanges
            .get_mut(symbol)
            .is_some_and(|ex| ex.advance_checkpoint(time)))
    }

    async fn rebootstrap_attempts(&self, symbol: &str) -> Result<u32> {
        Ok(self.read()?.rebootstraps.get(symbol).copied().unwrap_or(0))
    }

    async fn set_rebootstrap_attempts(&self, symbol: &str, attempts: u32) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.exchanges.contains_key(symbol) {
            return Err(StoreError::UnknownSymbol(symbol.to_owned()));
        }
        inner.rebootstraps.insert(symbol.to_owned(), attempts);
        Ok(())
    }

    async fn currencies(&self) -> Result<Vec<String>> {
        let mut currencies: Vec<String> = self
            .read()?
            .exchanges
            .values()
            .map(|ex| ex.currency.clone())
            .collect();
        currencies.sort();
        currencies.dedup();
        Ok(currencies)
    }

    async fn symbols(&self, currency: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .exchanges
            .values()
            .filter(|ex| currency.map_or(true, |c| ex.currency == c))
            .map(|ex| ex.symbol.clone())
            .collect())
    }

    async fn latest_trade_time(&self, symbol: &str) -> Result<Option<i64>> {
        Ok(self
            .read()?
            .trades
            .iter()
            .filter(|t| t.symbol == symbol)
            .map(|t| t.time)
            .max())
    }

    async fn contains_trade(&self, symbol: &str, row: &TradeRow) -> Result<bool> {
        Ok(self
            .read()?
            .trades
            .iter()
            .any(|t| t.symbol == symbol && t.matches(row)))
    }

    async fn append_trades(&self, symbol: &str, rows: Vec<TradeRow>) -> Result<usize> {
        let mut inner = self.write()?;
        if rows.is_empty() {
            return Ok(0);
        }
        if !inner.exchanges.contains_key(symbol) {
            return Err(StoreError::UnknownSymbol(symbol.to_owned()));
        }

        let written = rows.len();
        for row in rows {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.trades.push(Trade {
                id,
                symbol: symbol.to_owned(),
                time: row.time,
                price: row.price,
                volume: row.volume,
            });
        }
        Ok(written)
    }

    async fn delete_trades(&self, symbol: &str) -> Result<usize> {
        let mut inner = self.write()?;
        let before = inner.trades.len();
        inner.trades.retain(|t| t.symbol != symbol);
        Ok(before - inner.trades.len())
    }

    async fn count_trades(&self, symbol: &str) -> Result<u64> {
        Ok(self
            .read()?
            .trades
            .iter()
            .filter(|t| t.symbol == symbol)
            .count() as u64)
    }

    async fn trades_page(
        &self,
        query: &TradeQuery,
        after: Option<TradeCursor>,
        limit: usize,
    ) -> Result<Vec<Trade>> {
        let inner = self.read()?;

        let mut selected: Vec<&Trade> = inner
            .trades
            .iter()
            .filter(|t| inner.in_scope(&query.scope, t))
            .filter(|t| t.time >= query.start && t.time <= query.end)
            .filter(|t| after.map_or(true, |a| query.is_past(t.cursor(), a)))
            .collect();

        selected.sort_by_key(|t| t.cursor());
        if query.order == SortOrder::Descending {
            selected.reverse();
        }

        Ok(selected.into_iter().take(limit).cloned().collect())
    }
}
