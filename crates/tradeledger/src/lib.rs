//! # tradeledger
//!
//! A local, append-only mirror of a remote trade-history feed.
//!
//! ## Overview
//!
//! The remote feed (bitcoincharts-style) publishes a market listing, a
//! per-market trade delta and a gzip-compressed archive of every trade.
//! The mirror keeps a SQLite ledger of the markets you follow and keeps it
//! current without re-downloading whole archives:
//!
//! - **Bootstrap**: an empty market downloads its archive once
//! - **Incremental**: afterwards only the delta past the last stored trade
//! - **Self-healing**: a stored archive found to be an incomplete prefix is
//!   rebuilt, a bounded number of times
//! - **Verification**: the ledger can be compared row by row with the archive
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tradeledger::{Mirror, MirrorConfig, TradeQuery, WatchScope};
//!
//! async fn example() -> tradeledger::Result<()> {
//!     let mut mirror = Mirror::open("bitcoincharts.sqlite", MirrorConfig::default())?;
//!
//!     mirror.refresh_listing().await?;
//!     mirror.set_watched(&WatchScope::Currency("USD".into()), true).await?;
//!     let report = mirror.update().await?;
//!     println!("{} new trades", report.inserted());
//!
//!     let mut trades = mirror.trades(TradeQuery::symbol("bitstampUSD").descending());
//!     while let Some(trade) = trades.next().await? {
//!         println!("{} {} {}", trade.time, trade.price, trade.volume);
//!     }
//!
//!     println!("{}", mirror.verify("bitstampUSD").await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `tradeledger::core` - Data model (Exchange, Trade, TradeQuery, ...)
//! - `tradeledger::store` - Storage abstraction and SQLite
//! - `tradeledger::feed` - Remote feed client and stream decoder
//! - `tradeledger::sync` - Sync engine and verification

pub mod error;
pub mod mirror;

// Re-export component crates
pub use tradeledger_core as core;
pub use tradeledger_feed as feed;
pub use tradeledger_store as store;
pub use tradeledger_sync as sync;

// Re-export main types for convenience
pub use error::{MirrorError, Result};
pub use mirror::{Mirror, MirrorConfig};

// Re-export commonly used types
pub use tradeledger_core::{
    DecimalText, Exchange, MarketListing, SortOrder, Trade, TradeQuery, TradeRow, TradeScope,
    WatchScope, WeightedPrices,
};
pub use tradeledger_sync::{SymbolReport, SyncConfig, UpdateReport, VerifyReport};
