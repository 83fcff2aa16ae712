//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use tradeledger_core::{
    DecimalText, Exchange, MarketListing, SortOrder, Trade, TradeCursor, TradeQuery, TradeRow,
    TradeScope, WatchScope,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{RefreshStats, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file (and missing parent directories) and runs migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(format!("sqlite connection: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::TaskFailed(format!("spawn_blocking failed: {}", e)))?
    }
}

// Helper to convert a row to Trade
fn row_to_trade(row: &rusqlite::Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get("id")?,
        symbol: row.get("symbol")?,
        time: row.get("time")?,
        price: DecimalText::from_trusted(row.get("price")?),
        volume: DecimalText::from_trusted(row.get("volume")?),
    })
}

// Helper to convert a row to Exchange
fn row_to_exchange(row: &rusqlite::Row<'_>) -> rusqlite::Result<Exchange> {
    Ok(Exchange {
        symbol: row.get("symbol")?,
        currency: row.get("currency")?,
        latest_trade_known: row.get("latest_trade_known")?,
        latest_trade_stored: row.get("latest_trade_stored")?,
    })
}

fn exchange_exists(conn: &Connection, symbol: &str) -> Result<bool> {
    Ok(conn
        .prepare_cached("SELECT 1 FROM exchanges WHERE symbol = ?1")?
        .exists(params![symbol])?)
}

/// SQL predicate and its bound value for a watch scope.
fn scope_clause(scope: &WatchScope) -> (&'static str, Vec<Value>) {
    match scope {
        WatchScope::All => ("1 = 1", vec![]),
        WatchScope::Currency(currency) => ("currency = ?", vec![Value::Text(currency.clone())]),
        WatchScope::Symbol(symbol) => ("symbol = ?", vec![Value::Text(symbol.clone())]),
    }
}

/// Build the SELECT for one keyset page of a range query.
fn page_sql(query: &TradeQuery, after: Option<TradeCursor>, limit: usize) -> (String, Vec<Value>) {
    let mut sql = String::from("SELECT id, time, price, volume, symbol FROM trades WHERE ");
    let mut binds = Vec::new();

    match &query.scope {
        TradeScope::All => sql.push_str("1 = 1"),
        TradeScope::Symbol(symbol) => {
            sql.push_str("symbol = ?");
            binds.push(Value::Text(symbol.clone()));
        }
        TradeScope::Currency(currency) => {
            sql.push_str("symbol IN (SELECT symbol FROM exchanges WHERE currency = ?)");
            binds.push(Value::Text(currency.clone()));
        }
    }

    sql.push_str(" AND time BETWEEN ? AND ?");
    binds.push(Value::Integer(query.start));
    binds.push(Value::Integer(query.end));

    let (cmp, dir) = match query.order {
        SortOrder::Ascending => (">", "ASC"),
        SortOrder::Descending => ("<", "DESC"),
    };

    if let Some(cursor) = after {
        sql.push_str(&format!(" AND (time {cmp} ? OR (time = ? AND id {cmp} ?))"));
        binds.push(Value::Integer(cursor.time));
        binds.push(Value::Integer(cursor.time));
        binds.push(Value::Integer(cursor.id));
    }

    sql.push_str(&format!(" ORDER BY time {dir}, id {dir} LIMIT ?"));
    binds.push(Value::Integer(limit as i64));

    (sql, binds)
}

#[async_trait]
impl Store for SqliteStore {
    async fn refresh_listing(&self, listings: &[MarketListing]) -> Result<RefreshStats> {
        let listings = listings.to_vec();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let mut stats = RefreshStats::default();

            {
                let mut select =
                    tx.prepare_cached("SELECT latest_trade_known FROM exchanges WHERE symbol = ?1")?;
                let mut insert = tx.prepare_cached(
                    "INSERT INTO exchanges (symbol, currency, latest_trade_known) VALUES (?1, ?2, ?3)",
                )?;
                let mut update = tx.prepare_cached(
                    "UPDATE exchanges SET currency = ?2, latest_trade_known = ?3 WHERE symbol = ?1",
                )?;

                for listing in &listings {
                    let known: Option<i64> = select
                        .query_row(params![listing.symbol], |row| row.get(0))
                        .optional()?;

                    match known {
                        None => {
                            insert.execute(params![
                                listing.symbol,
                                listing.currency,
                                listing.latest_trade
                            ])?;
                            stats.inserted += 1;
                        }
                        Some(known) if known != listing.latest_trade => {
                            update.execute(params![
                                listing.symbol,
                                listing.currency,
                                listing.latest_trade
                            ])?;
                            stats.updated += 1;
                        }
                        Some(_) => stats.unchanged += 1,
                    }
                }
            }

            tx.commit()?;
            Ok(stats)
        })
        .await
    }

    async fn get_exchange(&self, symbol: &str) -> Result<Option<Exchange>> {
        let symbol = symbol.to_owned();

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT symbol, currency, latest_trade_known, latest_trade_stored
                 FROM exchanges WHERE symbol = ?1",
                params![symbol],
                row_to_exchange,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn set_watched(&self, scope: &WatchScope, enabled: bool) -> Result<usize> {
        let (clause, binds) = scope_clause(scope);

        self.blocking(move |conn| {
            let sql = if enabled {
                format!(
                    "UPDATE exchanges SET latest_trade_stored = 0
                     WHERE latest_trade_stored IS NULL AND {clause}"
                )
            } else {
                format!(
                    "UPDATE exchanges SET latest_trade_stored = NULL
                     WHERE latest_trade_stored IS NOT NULL AND {clause}"
                )
            };
            Ok(conn.execute(&sql, params_from_iter(binds))?)
        })
        .await
    }

    async fn symbols_needing_sync(&self) -> Result<Vec<String>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(
                "SELECT symbol FROM exchanges
                 WHERE latest_trade_stored IS NOT NULL AND latest_trade_stored < latest_trade_known
                 ORDER BY symbol",
            )?;
            let symbols = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(symbols)
        })
        .await
    }

    async fn advance_checkpoint(&self, symbol: &str, time: i64) -> Result<bool> {
        let symbol = symbol.to_owned();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE exchanges SET latest_trade_stored = ?2
                 WHERE symbol = ?1 AND (latest_trade_stored IS NULL OR latest_trade_stored < ?2)",
                params![symbol, time],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn rebootstrap_attempts(&self, symbol: &str) -> Result<u32> {
        let symbol = symbol.to_owned();

        self.blocking(move |conn| {
            let attempts: Option<u32> = conn
                .query_row(
                    "SELECT rebootstrap_attempts FROM exchanges WHERE symbol = ?1",
                    params![symbol],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(attempts.unwrap_or(0))
        })
        .await
    }

    async fn set_rebootstrap_attempts(&self, symbol: &str, attempts: u32) -> Result<()> {
        let symbol = symbol.to_owned();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE exchanges SET rebootstrap_attempts = ?2 WHERE symbol = ?1",
                params![symbol, attempts],
            )?;
            if changed == 0 {
                return Err(StoreError::UnknownSymbol(symbol));
            }
            Ok(())
        })
        .await
    }

    async fn currencies(&self) -> Result<Vec<String>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT currency FROM exchanges ORDER BY currency")?;
            let currencies = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(currencies)
        })
        .await
    }

    async fn symbols(&self, currency: Option<&str>) -> Result<Vec<String>> {
        let currency = currency.map(str::to_owned);

        self.blocking(move |conn| {
            let symbols = match currency {
                Some(currency) => {
                    let mut stmt = conn.prepare(
                        "SELECT symbol FROM exchanges WHERE currency = ?1 ORDER BY symbol",
                    )?;
                    let rows = stmt
                        .query_map(params![currency], |row| row.get(0))?
                        .collect::<rusqlite::Result<Vec<String>>>()?;
                    rows
                }
                None => {
                    let mut stmt = conn.prepare("SELECT symbol FROM exchanges ORDER BY symbol")?;
                    let rows = stmt
                        .query_map([], |row| row.get(0))?
                        .collect::<rusqlite::Result<Vec<String>>>()?;
                    rows
                }
            };
            Ok(symbols)
        })
        .await
    }

    async fn latest_trade_time(&self, symbol: &str) -> Result<Option<i64>> {
        let symbol = symbol.to_owned();

        self.blocking(move |conn| {
            let latest: Option<i64> = conn.query_row(
                "SELECT MAX(time) FROM trades WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )?;
            Ok(latest)
        })
        .await
    }

    async fn contains_trade(&self, symbol: &str, row: &TradeRow) -> Result<bool> {
        let symbol = symbol.to_owned();
        let row = row.clone();

        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .prepare_cached(
                    "SELECT id FROM trades
                     WHERE symbol = ?1 AND time = ?2 AND price = ?3 AND volume = ?4
                     LIMIT 1",
                )?
                .query_row(
                    params![symbol, row.time, row.price.as_str(), row.volume.as_str()],
                    |r| r.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn append_trades(&self, symbol: &str, rows: Vec<TradeRow>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let symbol = symbol.to_owned();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            if !exchange_exists(&tx, &symbol)? {
                return Err(StoreError::UnknownSymbol(symbol));
            }
            {
                let mut insert = tx.prepare_cached(
                    "INSERT INTO trades (time, price, volume, symbol) VALUES (?1, ?2, ?3, ?4)",
                )?;
                for row in &rows {
                    insert.execute(params![
                        row.time,
                        row.price.as_str(),
                        row.volume.as_str(),
                        symbol
                    ])?;
                }
            }
            tx.commit()?;
            Ok(rows.len())
        })
        .await
    }

    async fn delete_trades(&self, symbol: &str) -> Result<usize> {
        let symbol = symbol.to_owned();

        self.blocking(move |conn| {
            Ok(conn.execute("DELETE FROM trades WHERE symbol = ?1", params![symbol])?)
        })
        .await
    }

    async fn count_trades(&self, symbol: &str) -> Result<u64> {
        let symbol = symbol.to_owned();

        self.blocking(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM trades WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )?;
            u64::try_from(count)
                .map_err(|_| StoreError::Corrupt(format!("negative trade count {}", count)))
        })
        .await
    }

    async fn trades_page(
        &self,
        query: &TradeQuery,
        after: Option<TradeCursor>,
        limit: usize,
    ) -> Result<Vec<Trade>> {
        let (sql, binds) = page_sql(query, after, limit);

        self.blocking(move |conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let trades = stmt
                .query_map(params_from_iter(binds), row_to_trade)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(trades)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use proptest::prelude::*;

    fn listing(symbol: &str, currency: &str, latest: i64) -> MarketListing {
        MarketListing {
            symbol: symbol.into(),
            currency: currency.into(),
            latest_trade: latest,
        }
    }

    fn row(time: i64, price: &str, volume: &str) -> TradeRow {
        TradeRow::from_fields([time.to_string().as_str(), price, volume]).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_listing_upserts() {
        let store = SqliteStore::open_memory().unwrap();

        let stats = store
            .refresh_listing(&[listing("a", "USD", 10), listing("b", "EUR", 20)])
            .await
            .unwrap();
        assert_eq!(stats, RefreshStats { inserted: 2, updated: 0, unchanged: 0 });

        let stats = store
            .refresh_listing(&[listing("a", "USD", 10), listing("b", "GBP", 30)])
            .await
            .unwrap();
        assert_eq!(stats, RefreshStats { inserted: 0, updated: 1, unchanged: 1 });

        let b = store.get_exchange("b").await.unwrap().unwrap();
        assert_eq!(b.currency, "GBP");
        assert_eq!(b.latest_trade_known, 30);
        assert_eq!(b.latest_trade_stored, None);
    }

    #[tokio::test]
    async fn test_watch_scopes() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .refresh_listing(&[
                listing("a", "USD", 10),
                listing("b", "USD", 20),
                listing("c", "EUR", 30),
            ])
            .await
            .unwrap();

        assert_eq!(
            store
                .set_watched(&WatchScope::Currency("USD".into()), true)
                .await
                .unwrap(),
            2
        );
        assert_eq!(store.symbols_needing_sync().await.unwrap(), vec!["a", "b"]);

        // Enabling again does not reset progress.
        store.advance_checkpoint("a", 10).await.unwrap();
        store.set_watched(&WatchScope::All, true).await.unwrap();
        assert_eq!(
            store.get_exchange("a").await.unwrap().unwrap().latest_trade_stored,
            Some(10)
        );
        assert_eq!(store.symbols_needing_sync().await.unwrap(), vec!["b", "c"]);

        store
            .set_watched(&WatchScope::Symbol("b".into()), false)
            .await
            .unwrap();
        assert_eq!(store.symbols_needing_sync().await.unwrap(), vec!["c"]);
        assert_eq!(
            store.get_exchange("b").await.unwrap().unwrap().latest_trade_stored,
            None
        );
    }

    #[tokio::test]
    async fn test_checkpoint_never_moves_back() {
        let store = SqliteStore::open_memory().unwrap();
        store.refresh_listing(&[listing("a", "USD", 100)]).await.unwrap();
        store.set_watched(&WatchScope::All, true).await.unwrap();

        assert!(store.advance_checkpoint("a", 50).await.unwrap());
        assert!(!store.advance_checkpoint("a", 40).await.unwrap());
        assert!(!store.advance_checkpoint("a", 50).await.unwrap());
        assert_eq!(
            store.get_exchange("a").await.unwrap().unwrap().latest_trade_stored,
            Some(50)
        );
    }

    #[tokio::test]
    async fn test_append_and_lookup_trades() {
        let store = SqliteStore::open_memory().unwrap();
        store.refresh_listing(&[listing("X", "USD", 200)]).await.unwrap();

        assert_eq!(store.latest_trade_time("X").await.unwrap(), None);

        let written = store
            .append_trades("X", vec![row(100, "1", "2"), row(200, "1", "3")])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.latest_trade_time("X").await.unwrap(), Some(200));
        assert_eq!(store.count_trades("X").await.unwrap(), 2);

        assert!(store.contains_trade("X", &row(200, "1", "3")).await.unwrap());
        assert!(!store.contains_trade("X", &row(200, "1.0", "3")).await.unwrap());
        assert!(!store.contains_trade("Y", &row(200, "1", "3")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_keeps_ids_increasing() {
        let store = SqliteStore::open_memory().unwrap();
        store.refresh_listing(&[listing("X", "USD", 2)]).await.unwrap();
        store.append_trades("X", vec![row(1, "1", "1"), row(2, "1", "1")]).await.unwrap();
        assert_eq!(store.delete_trades("X").await.unwrap(), 2);
        assert_eq!(store.count_trades("X").await.unwrap(), 0);

        store.append_trades("X", vec![row(1, "1", "1")]).await.unwrap();
        let page = store
            .trades_page(&TradeQuery::symbol("X"), None, 10)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert!(page[0].id > 2);
    }

    #[tokio::test]
    async fn test_scan_orders_by_time_then_id() {
        let store = SqliteStore::open_memory().unwrap();
        store.refresh_listing(&[listing("X", "USD", 300)]).await.unwrap();
        store
            .append_trades(
                "X",
                vec![row(300, "1", "1"), row(100, "2", "1"), row(100, "3", "1"), row(200, "4", "1")],
            )
            .await
            .unwrap();

        let mut scan = store.scan(TradeQuery::symbol("X"), 2);
        let mut prices = Vec::new();
        while let Some(trade) = scan.next().await.unwrap() {
            prices.push(trade.price.into_string());
        }
        assert_eq!(prices, vec!["2", "3", "4", "1"]);

        let mut scan = store.scan(TradeQuery::symbol("X").descending(), 3);
        let mut prices = Vec::new();
        while let Some(trade) = scan.next().await.unwrap() {
            prices.push(trade.price.into_string());
        }
        assert_eq!(prices, vec!["1", "4", "3", "2"]);
    }

    #[tokio::test]
    async fn test_scan_by_currency_and_range() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .refresh_listing(&[listing("a", "USD", 1), listing("b", "USD", 1), listing("c", "EUR", 1)])
            .await
            .unwrap();
        store.append_trades("a", vec![row(10, "1", "1"), row(30, "1", "1")]).await.unwrap();
        store.append_trades("b", vec![row(20, "1", "1")]).await.unwrap();
        store.append_trades("c", vec![row(15, "1", "1")]).await.unwrap();

        let mut scan = store.scan(TradeQuery::currency("USD").between(10, 25), 1);
        let mut seen = Vec::new();
        while let Some(trade) = scan.next().await.unwrap() {
            seen.push((trade.symbol, trade.time));
        }
        assert_eq!(seen, vec![("a".to_string(), 10), ("b".to_string(), 20)]);

        let mut scan = store.scan(TradeQuery::all(), 100);
        assert_eq!(scan.count_remaining().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_currencies_and_symbols() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .refresh_listing(&[listing("b", "USD", 1), listing("a", "USD", 1), listing("c", "EUR", 1)])
            .await
            .unwrap();

        assert_eq!(store.currencies().await.unwrap(), vec!["EUR", "USD"]);
        assert_eq!(store.symbols(None).await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.symbols(Some("USD")).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.sqlite");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.refresh_listing(&[listing("X", "USD", 100)]).await.unwrap();
            store.append_trades("X", vec![row(100, "1", "2")]).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.latest_trade_time("X").await.unwrap(), Some(100));
        assert!(store.get_exchange("X").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_append_to_unlisted_symbol_is_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .append_trades("ghost", vec![row(1, "1", "1")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownSymbol(s) if s == "ghost"));
        assert_eq!(store.count_trades("ghost").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rebootstrap_attempts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.sqlite");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.refresh_listing(&[listing("X", "USD", 100)]).await.unwrap();
            assert_eq!(store.rebootstrap_attempts("X").await.unwrap(), 0);
            store.set_rebootstrap_attempts("X", 2).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.rebootstrap_attempts("X").await.unwrap(), 2);
        assert_eq!(store.rebootstrap_attempts("ghost").await.unwrap(), 0);
        assert!(matches!(
            store.set_rebootstrap_attempts("ghost", 1).await,
            Err(StoreError::UnknownSymbol(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Keyset paging yields the same sequence as one big page, whatever
        /// the page size, direction or range.
        #[test]
        fn prop_paging_matches_single_page(
            times in prop::collection::vec(0i64..20, 0..40),
            page_size in 1usize..7,
            bounds in (0i64..20, 0i64..20),
            descending in any::<bool>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let store = SqliteStore::open_memory().unwrap();
                store.refresh_listing(&[listing("X", "USD", 20)]).await.unwrap();
                let rows: Vec<TradeRow> = times.iter().map(|t| row(*t, "1", "1")).collect();
                store.append_trades("X", rows).await.unwrap();

                let (lo, hi) = (bounds.0.min(bounds.1), bounds.0.max(bounds.1));
                let mut query = TradeQuery::symbol("X").between(lo, hi);
                if descending {
                    query = query.descending();
                }

                let whole = store.trades_page(&query, None, 1000).await.unwrap();
                let mut scan = store.scan(query, page_size);
                let mut paged = Vec::new();
                while let Some(trade) = scan.next().await.unwrap() {
                    paged.push(trade);
                }

                assert_eq!(paged, whole);
                assert_eq!(whole.len(), times.iter().filter(|t| (lo..=hi).contains(*t)).count());
                let keys: Vec<_> = whole.iter().map(|t| t.cursor()).collect();
                let mut sorted = keys.clone();
                sorted.sort();
                if descending {
                    sorted.reverse();
                }
                assert_eq!(keys, sorted);
            });
        }
    }
}
