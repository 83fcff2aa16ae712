//! # tradeledger core
//!
//! Pure data model for mirroring a remote trade-history feed into a local
//! append-only ledger.
//!
//! This crate contains no I/O, no storage, no networking. Decoding, storage
//! and synchronization live in their own crates and exchange these types.
//!
//! ## Key Types
//!
//! - [`Exchange`] - One tracked market and its checkpoint
//! - [`Trade`] - A stored ledger row with its insertion sequence id
//! - [`TradeRow`] - A `(time, price, volume)` triple as received from the feed
//! - [`DecimalText`] - An exact decimal kept in its textual form
//! - [`MarketListing`] - One entry of the remote market listing
//! - [`WatchScope`] / [`TradeQuery`] - Selection of exchanges and ledger ranges
//!
//! ## Checkpoints
//!
//! `Exchange::latest_trade_stored` is the sync checkpoint:
//!
//! - `None`: the symbol is not watched
//! - `Some(0)`: watched but never synchronized
//! - `Some(t)`: every trade up to `t` is confirmed in the ledger

pub mod error;
pub mod exchange;
pub mod listing;
pub mod query;
pub mod trade;

pub use error::{RecordError, Result};
pub use exchange::{Exchange, WatchScope};
pub use listing::{MarketListing, WeightedPrice, WeightedPrices};
pub use query::{SortOrder, TradeCursor, TradeQuery, TradeScope, MAX_TRADE_TIME};
pub use trade::{DecimalText, Trade, TradeRow};
