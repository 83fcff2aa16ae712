//! # tradeledger store
//!
//! Storage abstraction for the trade ledger and the exchange registry.
//!
//! ## Overview
//!
//! Synchronization talks to storage only through the [`Store`] trait, so the
//! engine is storage-agnostic. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for tests.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`TradeScan`] - Lazy, paged walk over a ledger range
//! - [`RefreshStats`] - Outcome of applying a market listing
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tradeledger_core::TradeQuery;
//! use tradeledger_store::{SqliteStore, Store, StoreExt};
//!
//! async fn example() -> tradeledger_store::Result<()> {
//!     let store = SqliteStore::open("trades.sqlite")?;
//!
//!     let mut scan = store.scan(TradeQuery::symbol("bitstampUSD").between(0, 1_400_000_000), 4096);
//!     while let Some(trade) = scan.next().await? {
//!         println!("{} {} {}", trade.time, trade.price, trade.volume);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Append-only trades**: the only mutation besides appends is
//!   [`Store::delete_trades`], used when a symbol's history is rebuilt.
//! - **Stable order**: trades are ordered by `(time, id)`; ids are never
//!   reused, even after deletion.
//! - **Batch commits**: [`Store::append_trades`] writes one batch atomically.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{RefreshStats, Store, StoreExt, TradeScan};
