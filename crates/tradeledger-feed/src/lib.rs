//! # tradeledger feed
//!
//! Client side of the remote trade-history feed.
//!
//! ## Overview
//!
//! The feed publishes four documents: a market listing, a weighted price
//! snapshot, a trade delta (CSV, filtered by symbol and start time) and the
//! full history of one symbol (gzip-compressed CSV). The two CSV documents
//! are consumed as byte streams through a [`RecordStream`], which turns
//! arbitrary network chunks into records one at a time.
//!
//! ## Decode Pipeline
//!
//! ```text
//! ByteSource ──chunks──> GzipStage? ──bytes──> LineAssembler ──lines──> UTF-8 ──> csv ──> record
//! ```
//!
//! - Chunk boundaries may fall anywhere, including inside a gzip header, a
//!   multi-byte character or a `\r\n` pair.
//! - At most one partial line is buffered between chunks.
//! - Any decode failure is a [`FeedError::MalformedRecord`] and ends the stream.
//!
//! ## Connection Release
//!
//! A [`RecordStream`] owns its [`ByteSource`] (for HTTP, the response and
//! its connection). The source is dropped as soon as the stream is
//! exhausted, fails, is [closed](RecordStream::close), or is itself dropped.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tradeledger_feed::{FeedConfig, HttpFeed, RemoteFeed};
//!
//! async fn example() -> tradeledger_feed::Result<()> {
//!     let feed = HttpFeed::new(FeedConfig::default())?;
//!
//!     let mut history = feed.history("bitstampUSD").await?;
//!     while let Some(row) = history.next_trade().await? {
//!         println!("{:?}", row);
//!         if row.time > 1_300_000_000 {
//!             break; // dropping `history` closes the connection
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod memory;
pub mod remote;
pub mod source;

pub use config::FeedConfig;
pub use decode::{Encoding, FieldSplitter, GzipStage, LineAssembler, RecordStream};
pub use error::{FeedError, Result};
pub use http::HttpFeed;
pub use memory::{FeedRequest, MemoryFeed};
pub use remote::RemoteFeed;
pub use source::{ByteSource, ChunkSource, ReleaseGuard};
