//! # tradeledger sync
//!
//! Keeps the local ledger in step with the remote feed, and checks it.
//!
//! ## Overview
//!
//! - [`ExchangeRegistry`] applies the market listing and tracks which
//!   symbols are watched and behind.
//! - [`SyncEngine`] brings symbols up to date: a full bootstrap for an empty
//!   ledger, otherwise a delta with overlap skipping, and delete-and-rebootstrap
//!   recovery when the stored archive turns out to be an incomplete prefix.
//! - [`verify_symbol`] compares a ledger with a fresh archive download.
//!
//! ## Key Properties
//!
//! - **Idempotent**: a second update with no new remote data changes nothing
//! - **Exact**: prices and volumes are compared as text, never as floats
//! - **Bounded recovery**: a symbol that keeps coming back incomplete fails
//!   with [`SyncError::IncompleteArchive`] instead of downloading forever
//! - **Bounded memory**: rows are streamed in and committed in batches
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tradeledger_feed::{FeedConfig, HttpFeed};
//! use tradeledger_store::SqliteStore;
//! use tradeledger_sync::{SyncConfig, SyncEngine};
//! use tradeledger_core::WatchScope;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("trades.db")?);
//!     let feed = Arc::new(HttpFeed::new(FeedConfig::default())?);
//!     let mut engine = SyncEngine::new(store, feed, SyncConfig::default());
//!
//!     engine.update().await?;
//!     engine
//!         .registry()
//!         .set_watched(&WatchScope::Currency("USD".into()), true)
//!         .await?;
//!     let report = engine.update().await?;
//!     println!("{} new trades", report.inserted());
//!     Ok(())
//! }
//! ```
//!
//! ## Update Flow
//!
//! ```text
//! update_symbol(X)
//!   ledger empty?  ── yes ──> history(X) ──> append in batches ──> checkpoint := max time
//!        │ no
//!        v
//!   trades(X, last - 1) ──> skip rows already stored ──> append the rest
//!        │
//!   inserted > 0 or last == listing ──> checkpoint := last
//!        │ otherwise
//!        v
//!   delete X's rows and start over (bounded)
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod report;
pub mod verify;

pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use registry::ExchangeRegistry;
pub use report::{SymbolFailure, SymbolReport, SyncMode, UpdateReport};
pub use verify::{verify_symbol, VerifyReport};
