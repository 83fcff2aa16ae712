//! The Mirror: one handle over the ledger, the registry and the remote feed.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use tradeledger_core::{Exchange, TradeQuery, WatchScope, WeightedPrices};
use tradeledger_feed::{FeedConfig, HttpFeed, RemoteFeed};
use tradeledger_store::{RefreshStats, SqliteStore, Store, StoreExt, TradeScan};
use tradeledger_sync::{SymbolReport, SyncConfig, SyncEngine, UpdateReport, VerifyReport};

use crate::error::Result;

/// Configuration for the Mirror.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Remote endpoints and timeouts.
    pub feed: FeedConfig,
    /// Sync engine configuration.
    pub sync: SyncConfig,
    /// Rows fetched per page by [`Mirror::trades`].
    pub query_page_size: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            sync: SyncConfig::default(),
            query_page_size: 4096,
        }
    }
}

/// The main Mirror struct.
///
/// Provides a unified API for:
/// - Choosing which markets to follow
/// - Synchronizing them with the remote feed
/// - Verifying stored history against the remote archive
/// - Querying stored trades
pub struct Mirror<S: Store, F: RemoteFeed> {
    engine: SyncEngine<S, F>,
    query_page_size: usize,
}

impl Mirror<SqliteStore, HttpFeed> {
    /// Open (or create) a SQLite ledger at `path`, synchronized over HTTP.
    pub fn open(path: impl AsRef<Path>, config: MirrorConfig) -> Result<Self> {
        let path = path.as_ref();
        let store = SqliteStore::open(path)?;
        let feed = HttpFeed::new(config.feed)?;
        info!(path = %path.display(), "opened mirror");
        Ok(Self::new(
            Arc::new(store),
            Arc::new(feed),
            config.sync,
            config.query_page_size,
        ))
    }
}

impl<S: Store, F: RemoteFeed> Mirror<S, F> {
    /// Create a mirror over any store and feed.
    pub fn new(store: Arc<S>, feed: Arc<F>, sync: SyncConfig, query_page_size: usize) -> Self {
        Self {
            engine: SyncEngine::new(store, feed, sync),
            query_page_size: query_page_size.max(1),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        self.engine.store()
    }

    /// Get the feed reference.
    pub fn feed(&self) -> &F {
        self.engine.feed()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the market listing and apply it, without synchronizing.
    pub async fn refresh_listing(&self) -> Result<RefreshStats> {
        Ok(self.engine.refresh_listing().await?)
    }

    /// Start or stop following every market in `scope`.
    ///
    /// Only markets already in the registry are affected; call
    /// [`Mirror::refresh_listing`] or [`Mirror::update`] first on a new ledger.
    pub async fn set_watched(&self, scope: &WatchScope, enabled: bool) -> Result<usize> {
        Ok(self.engine.registry().set_watched(scope, enabled).await?)
    }

    pub async fn exchange(&self, symbol: &str) -> Result<Option<Exchange>> {
        Ok(self.engine.registry().get(symbol).await?)
    }

    /// Distinct currencies in the registry.
    pub async fn currencies(&self) -> Result<Vec<String>> {
        Ok(self.store().currencies().await?)
    }

    /// Symbols in the registry, optionally only those of `currency`.
    pub async fn symbols(&self, currency: Option<&str>) -> Result<Vec<String>> {
        Ok(self.store().symbols(currency).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────

    /// Refresh the registry and synchronize every watched market behind it.
    pub async fn update(&mut self) -> Result<UpdateReport> {
        Ok(self.engine.update().await?)
    }

    /// Synchronize one market.
    pub async fn update_symbol(&mut self, symbol: &str) -> Result<SymbolReport> {
        Ok(self.engine.update_symbol(symbol).await?)
    }

    /// Refresh the registry and synchronize every market of `currency`.
    pub async fn update_currency(&mut self, currency: &str) -> Result<UpdateReport> {
        Ok(self.engine.update_currency(currency).await?)
    }

    /// Compare one market's ledger with the remote archive.
    pub async fn verify(&self, symbol: &str) -> Result<VerifyReport> {
        Ok(self.engine.verify(symbol).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Stored trades matching `query`, fetched lazily page by page.
    pub fn trades(&self, query: TradeQuery) -> TradeScan<'_, S> {
        self.store().scan(query, self.query_page_size)
    }

    /// Current weighted prices from the remote feed.
    pub async fn weighted_prices(&self) -> Result<WeightedPrices> {
        Ok(self.feed().weighted_prices().await?)
    }
}
