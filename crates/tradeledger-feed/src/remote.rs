//! RemoteFeed trait: the abstract interface to the trade-history publisher.

use async_trait::async_trait;
use tradeledger_core::{MarketListing, WeightedPrices};

use crate::decode::RecordStream;
use crate::error::Result;

/// Read access to the remote feed.
///
/// Implementations include [`crate::HttpFeed`] for the real service and
/// [`crate::MemoryFeed`] for tests.
#[async_trait]
pub trait RemoteFeed: Send + Sync {
    /// Every market the feed knows about, with its latest trade time.
    async fn markets(&self) -> Result<Vec<MarketListing>>;

    /// Weighted average prices per currency.
    async fn weighted_prices(&self) -> Result<WeightedPrices>;

    /// Trades of `symbol` with time at or after `start`, oldest first.
    async fn trades(&self, symbol: &str, start: i64) -> Result<RecordStream>;

    /// The complete archive of `symbol`, oldest first.
    async fn history(&self, symbol: &str) -> Result<RecordStream>;
}
