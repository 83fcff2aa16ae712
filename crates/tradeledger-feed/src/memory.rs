//! In-memory feed for tests.
//!
//! Serves canned documents through the same [`RecordStream`] machinery as
//! the HTTP feed, split into configurable chunks. Every request is logged
//! and every stream holds a [`ReleaseGuard`], so tests can assert what was
//! asked for and that connections were given back.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::sync::RwLock;

use tradeledger_core::{MarketListing, TradeRow, WeightedPrices};

use crate::decode::{Encoding, RecordStream};
use crate::error::{FeedError, Result};
use crate::remote::RemoteFeed;
use crate::source::{ChunkSource, ReleaseGuard};

/// Chunk size used unless overridden, matching a typical socket read.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// A request received by a [`MemoryFeed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    Markets,
    WeightedPrices,
    Trades { symbol: String, start: i64 },
    History { symbol: String },
}

/// In-memory feed implementation.
pub struct MemoryFeed {
    state: RwLock<FeedState>,
    open: Arc<AtomicUsize>,
}

#[derive(Default)]
struct FeedState {
    markets: Vec<MarketListing>,
    weighted: WeightedPrices,
    /// Served as-is, normally gzip-compressed CSV.
    history: HashMap<String, Vec<u8>>,
    /// Filtered by start time on each request.
    trades: HashMap<String, Vec<TradeRow>>,
    /// Served as-is regardless of start time; takes precedence over `trades`.
    trades_raw: HashMap<String, Vec<u8>>,
    chunk_size: usize,
    requests: Vec<FeedRequest>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(FeedState {
                chunk_size: DEFAULT_CHUNK_SIZE,
                ..FeedState::default()
            }),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn set_markets(&self, markets: Vec<MarketListing>) {
        self.state.write().await.markets = markets;
    }

    /// Add `listing` to the market listing, replacing any entry with its symbol.
    pub async fn upsert_market(&self, listing: MarketListing) {
        let mut state = self.state.write().await;
        match state.markets.iter_mut().find(|m| m.symbol == listing.symbol) {
            Some(existing) => *existing = listing,
            None => state.markets.push(listing),
        }
    }

    pub async fn set_weighted_prices(&self, prices: WeightedPrices) {
        self.state.write().await.weighted = prices;
    }

    /// Publish `rows` as the gzip-compressed archive of `symbol`.
    pub async fn set_history(&self, symbol: &str, rows: &[TradeRow]) -> io::Result<()> {
        let body = gzip(&render_csv(rows)?)?;
        self.set_history_body(symbol, body).await;
        Ok(())
    }

    /// Publish raw bytes as the archive of `symbol`.
    pub async fn set_history_body(&self, symbol: &str, body: Vec<u8>) {
        self.state
            .write()
            .await
            .history
            .insert(symbol.to_owned(), body);
    }

    /// Publish `rows` as the trade delta of `symbol`.
    pub async fn set_trades(&self, symbol: &str, rows: Vec<TradeRow>) {
        let mut state = self.state.write().await;
        state.trades_raw.remove(symbol);
        state.trades.insert(symbol.to_owned(), rows);
    }

    /// Publish raw bytes as the trade delta of `symbol`, for any start time.
    pub async fn set_trades_body(&self, symbol: &str, body: Vec<u8>) {
        self.state
            .write()
            .await
            .trades_raw
            .insert(symbol.to_owned(), body);
    }

    pub async fn set_chunk_size(&self, chunk_size: usize) {
        self.state.write().await.chunk_size = chunk_size.max(1);
    }

    /// The current market listing, without logging a request.
    pub async fn markets_snapshot(&self) -> Vec<MarketListing> {
        self.state.read().await.markets.clone()
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<FeedRequest> {
        self.state.read().await.requests.clone()
    }

    pub async fn clear_requests(&self) {
        self.state.write().await.requests.clear();
    }

    /// Streams handed out and not yet released.
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn stream(&self, label: String, body: &[u8], chunk_size: usize, encoding: Encoding) -> RecordStream {
        let source = ChunkSource::split(body, chunk_size).tracked(ReleaseGuard::acquire(&self.open));
        RecordStream::new(label, Box::new(source), encoding)
    }
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteFeed for MemoryFeed {
    async fn markets(&self) -> Result<Vec<MarketListing>> {
        let mut state = self.state.write().await;
        state.requests.push(FeedRequest::Markets);
        Ok(state.markets.clone())
    }

    async fn weighted_prices(&self) -> Result<WeightedPrices> {
        let mut state = self.state.write().await;
        state.requests.push(FeedRequest::WeightedPrices);
        Ok(state.weighted.clone())
    }

    async fn trades(&self, symbol: &str, start: i64) -> Result<RecordStream> {
        let mut state = self.state.write().await;
        state.requests.push(FeedRequest::Trades {
            symbol: symbol.to_owned(),
            start,
        });

        let body = match state.trades_raw.get(symbol) {
            Some(raw) => raw.clone(),
            None => {
                let rows: Vec<TradeRow> = state
                    .trades
                    .get(symbol)
                    .map(|rows| rows.iter().filter(|r| r.time >= start).cloned().collect())
                    .unwrap_or_default();
                render_csv(&rows)?
            }
        };
        Ok(self.stream(
            format!("trades {symbol}"),
            &body,
            state.chunk_size,
            Encoding::Plain,
        ))
    }

    async fn history(&self, symbol: &str) -> Result<RecordStream> {
        let mut state = self.state.write().await;
        state.requests.push(FeedRequest::History {
            symbol: symbol.to_owned(),
        });

        let body = state
            .history
            .get(symbol)
            .ok_or_else(|| FeedError::NotFound(format!("{symbol}.csv.gz")))?;
        Ok(self.stream(
            format!("history {symbol}"),
            body,
            state.chunk_size,
            Encoding::Gzip,
        ))
    }
}

/// Render rows as feed CSV: `time,price,volume` per line.
pub fn render_csv(rows: &[TradeRow]) -> io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        let time = row.time.to_string();
        writer.write_record([time.as_str(), row.price.as_str(), row.volume.as_str()])?;
    }
    writer.into_inner().map_err(|e| e.into_error())
}

/// Gzip-compress `data` the way the archive endpoint serves it.
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
