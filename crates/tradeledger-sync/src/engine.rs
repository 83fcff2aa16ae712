//! Sync engine: brings watched symbols up to the remote listing.
//!
//! Per symbol the engine either bootstraps the full archive into an empty
//! ledger, or fetches a delta starting one second before the ledger's latest
//! trade and appends whatever follows the overlap. A delta that adds nothing
//! while the listing claims newer trades means the stored archive was an
//! incomplete prefix: the symbol's rows are deleted and bootstrapped again.

use std::sync::Arc;

use tracing::{debug, info, warn};

use tradeledger_core::TradeRow;
use tradeledger_feed::RemoteFeed;
use tradeledger_store::{RefreshStats, Store};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::registry::ExchangeRegistry;
use crate::report::{SymbolFailure, SymbolReport, SyncMode, UpdateReport};
use crate::verify::{verify_symbol, VerifyReport};

/// Orchestrates registry refresh, bootstrap, delta application and recovery.
///
/// Operations take `&mut self`: one symbol is synchronized at a time and
/// every stream is consumed or dropped before the next request.
pub struct SyncEngine<S: Store, F: RemoteFeed> {
    store: Arc<S>,
    feed: Arc<F>,
    config: SyncConfig,
}

/// Outcome of one bootstrap or delta pass.
#[derive(Debug, Default)]
struct Pass {
    inserted: u64,
    skipped: u64,
    last_time: Option<i64>,
}

impl Pass {
    fn observe(&mut self, time: i64) {
        self.last_time = Some(self.last_time.map_or(time, |t| t.max(time)));
    }
}

impl<S: Store, F: RemoteFeed> SyncEngine<S, F> {
    pub fn new(store: Arc<S>, feed: Arc<F>, config: SyncConfig) -> Self {
        Self {
            store,
            feed,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn registry(&self) -> ExchangeRegistry<'_, S> {
        ExchangeRegistry::new(&*self.store)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Multi-symbol runs
    // ─────────────────────────────────────────────────────────────────────────

    /// Refresh the registry from the listing, then synchronize every watched
    /// symbol that is behind it.
    ///
    /// A malformed record or an exhausted rebootstrap budget only skips its
    /// symbol; it is logged and collected in the report. Store and transport
    /// errors end the run.
    pub async fn update(&mut self) -> Result<UpdateReport> {
        let mut report = UpdateReport {
            listing: self.refresh_listing().await?,
            ..UpdateReport::default()
        };

        let symbols = self.registry().watched_symbols_needing_sync().await?;
        info!(count = symbols.len(), "symbols need sync");
        self.run_symbols(symbols, &mut report).await?;
        Ok(report)
    }

    /// Refresh the registry, then synchronize every symbol listed in
    /// `currency`, watched or not.
    pub async fn update_currency(&mut self, currency: &str) -> Result<UpdateReport> {
        let mut report = UpdateReport {
            listing: self.refresh_listing().await?,
            ..UpdateReport::default()
        };

        let symbols = self.store.symbols(Some(currency)).await?;
        info!(currency, count = symbols.len(), "updating currency");
        self.run_symbols(symbols, &mut report).await?;
        Ok(report)
    }

    /// Fetch the market listing and apply it to the registry.
    pub async fn refresh_listing(&self) -> Result<RefreshStats> {
        let listing = self.feed.markets().await?;
        self.registry().refresh_from_listing(&listing).await
    }

    async fn run_symbols(&mut self, symbols: Vec<String>, report: &mut UpdateReport) -> Result<()> {
        for symbol in symbols {
            match self.update_symbol(&symbol).await {
                Ok(done) => report.symbols.push(done),
                Err(e) if e.is_symbol_local() => {
                    warn!(symbol = %symbol, error = %e, "skipping symbol");
                    report.failures.push(SymbolFailure {
                        symbol,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Single symbol
    // ─────────────────────────────────────────────────────────────────────────

    /// Bring one symbol's ledger up to date with the remote.
    pub async fn update_symbol(&mut self, symbol: &str) -> Result<SymbolReport> {
        let exchange = self
            .store
            .get_exchange(symbol)
            .await?
            .ok_or_else(|| SyncError::UnknownSymbol(symbol.to_owned()))?;
        let mut report = SymbolReport::new(symbol);

        loop {
            let Some(resume) = self.store.latest_trade_time(symbol).await? else {
                report.mode = SyncMode::Bootstrap;
                let pass = self.bootstrap(symbol).await?;
                report.inserted += pass.inserted;
                report.last_time = pass.last_time;
                match pass.last_time {
                    Some(last) => {
                        self.store.advance_checkpoint(symbol, last).await?;
                    }
                    None => info!(symbol, "remote archive is empty"),
                }
                break;
            };

            report.mode = SyncMode::Incremental;
            let pass = self.incremental(symbol, resume).await?;
            report.inserted += pass.inserted;
            report.skipped_overlap += pass.skipped;
            let last = pass.last_time.unwrap_or(resume);
            report.last_time = Some(last);

            let attempts = self.store.rebootstrap_attempts(symbol).await?;
            if pass.inserted > 0 || last == exchange.latest_trade_known {
                if attempts > 0 {
                    self.store.set_rebootstrap_attempts(symbol, 0).await?;
                }
                self.store.advance_checkpoint(symbol, last).await?;
                break;
            }

            if attempts >= self.config.max_rebootstraps {
                warn!(
                    symbol,
                    attempts,
                    last_time = last,
                    latest_known = exchange.latest_trade_known,
                    "archive still incomplete, giving up"
                );
                return Err(SyncError::IncompleteArchive {
                    symbol: symbol.to_owned(),
                    attempts,
                });
            }

            warn!(
                symbol,
                last_time = last,
                latest_known = exchange.latest_trade_known,
                "appears to be an incomplete historical archive, rebootstrapping"
            );
            report.deleted += self.store.delete_trades(symbol).await? as u64;
            report.rebootstraps += 1;
            self.store
                .set_rebootstrap_attempts(symbol, attempts + 1)
                .await?;
        }

        report.checkpoint = self
            .store
            .get_exchange(symbol)
            .await?
            .and_then(|ex| ex.latest_trade_stored);
        Ok(report)
    }

    /// Compare `symbol`'s ledger against a fresh download of its archive.
    pub async fn verify(&self, symbol: &str) -> Result<VerifyReport> {
        verify_symbol(&*self.store, &*self.feed, symbol, &self.config).await
    }

    async fn bootstrap(&self, symbol: &str) -> Result<Pass> {
        info!(symbol, "downloading entire history");
        let mut stream = self.feed.history(symbol).await?;
        let mut writer = BatchWriter::new(&*self.store, symbol, &self.config);
        let mut pass = Pass::default();

        while let Some(row) = stream.next_trade().await? {
            pass.observe(row.time);
            writer.push(row).await?;
        }

        pass.inserted = writer.finish().await?;
        info!(symbol, inserted = pass.inserted, "new trades");
        Ok(pass)
    }

    async fn incremental(&self, symbol: &str, resume: i64) -> Result<Pass> {
        let mut stream = self.feed.trades(symbol, resume.saturating_sub(1)).await?;
        let mut writer = BatchWriter::new(&*self.store, symbol, &self.config);
        let mut pass = Pass {
            last_time: Some(resume),
            ..Pass::default()
        };
        let mut overlapping = true;

        while let Some(row) = stream.next_trade().await? {
            pass.observe(row.time);
            if overlapping {
                if self.store.contains_trade(symbol, &row).await? {
                    pass.skipped += 1;
                    continue;
                }
                overlapping = false;
            }
            writer.push(row).await?;
        }

        pass.inserted = writer.finish().await?;
        if pass.inserted > 0 {
            info!(symbol, inserted = pass.inserted, "more trades");
        } else {
            debug!(symbol, skipped = pass.skipped, "no new trades");
        }
        Ok(pass)
    }
}

/// Buffers rows and appends them in transactions of `commit_batch_rows`.
struct BatchWriter<'a, S: Store + ?Sized> {
    store: &'a S,
    symbol: &'a str,
    pending: Vec<TradeRow>,
    limit: usize,
    progress_interval: u64,
    written: u64,
}

impl<'a, S: Store + ?Sized> BatchWriter<'a, S> {
    fn new(store: &'a S, symbol: &'a str, config: &SyncConfig) -> Self {
        let limit = config.commit_batch_rows.max(1);
        Self {
            store,
            symbol,
            pending: Vec::with_capacity(limit.min(8192)),
            limit,
            progress_interval: config.progress_interval.max(1),
            written: 0,
        }
    }

    async fn push(&mut self, row: TradeRow) -> Result<()> {
        self.pending.push(row);
        if self.pending.len() >= self.limit {
            self.commit().await?;
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let before = self.written;
        let batch = std::mem::take(&mut self.pending);
        self.written += self.store.append_trades(self.symbol, batch).await? as u64;
        debug!(symbol = self.symbol, rows = self.written, "committed batch");

        if self.written / self.progress_interval > before / self.progress_interval {
            info!(symbol = self.symbol, rows = self.written, "progress");
        }
        Ok(())
    }

    async fn finish(mut self) -> Result<u64> {
        self.commit().await?;
        Ok(self.written)
    }
}
