//! # tradeledger testkit
//!
//! Testing utilities for tradeledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a memory store paired with a memory feed, plus row and
//!   listing builders
//! - **Generators**: Proptest strategies for time-ordered trade histories
//!
//! ## Test Fixtures
//!
//! ```rust
//! use tradeledger_testkit::fixtures::{row, TestFixture};
//!
//! # async fn example() {
//! let fixture = TestFixture::new();
//! fixture
//!     .publish("bitstampUSD", "USD", &[row(100, "1.5", "2"), row(200, "1.6", "1")])
//!     .await;
//! fixture.register_and_watch().await;
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use tradeledger_testkit::generators::history;
//!
//! proptest! {
//!     #[test]
//!     fn history_is_time_ordered(rows in history(50)) {
//!         prop_assert!(rows.windows(2).all(|w| w[0].time <= w[1].time));
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{listing, row, rows, TestFixture};
