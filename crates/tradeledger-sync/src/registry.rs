//! Exchange registry: which symbols exist, which are watched, which are behind.

use tracing::{debug, info};

use tradeledger_core::{Exchange, MarketListing, WatchScope};
use tradeledger_store::{RefreshStats, Store};

use crate::error::Result;

/// A view of the registry held in a [`Store`].
pub struct ExchangeRegistry<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> ExchangeRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Upsert every listed market. Known symbols change only when their
    /// latest trade moved; nothing is ever removed.
    pub async fn refresh_from_listing(&self, listing: &[MarketListing]) -> Result<RefreshStats> {
        let stats = self.store.refresh_listing(listing).await?;
        info!(
            markets = listing.len(),
            inserted = stats.inserted,
            updated = stats.updated,
            "refreshed market listing"
        );
        Ok(stats)
    }

    /// Turn watching on or off for every exchange in `scope`.
    pub async fn set_watched(&self, scope: &WatchScope, enabled: bool) -> Result<usize> {
        let changed = self.store.set_watched(scope, enabled).await?;
        debug!(?scope, enabled, changed, "set watched");
        Ok(changed)
    }

    /// Watched symbols whose checkpoint is behind the listing, by symbol.
    pub async fn watched_symbols_needing_sync(&self) -> Result<Vec<String>> {
        Ok(self.store.symbols_needing_sync().await?)
    }

    pub async fn get(&self, symbol: &str) -> Result<Option<Exchange>> {
        Ok(self.store.get_exchange(symbol).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeledger_store::MemoryStore;
    use tradeledger_testkit::listing;

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let store = MemoryStore::new();
        let registry = ExchangeRegistry::new(&store);
        let markets = vec![listing("a", "USD", 10), listing("b", "EUR", 20)];

        let first = registry.refresh_from_listing(&markets).await.unwrap();
        assert_eq!(first.inserted, 2);
        let second = registry.refresh_from_listing(&markets).await.unwrap();
        assert_eq!(second.unchanged, 2);
        assert_eq!(second.inserted + second.updated, 0);
    }

    #[tokio::test]
    async fn test_watch_by_currency_then_needing_sync() {
        let store = MemoryStore::new();
        let registry = ExchangeRegistry::new(&store);
        registry
            .refresh_from_listing(&[
                listing("a", "USD", 10),
                listing("b", "EUR", 20),
                listing("c", "USD", 0),
            ])
            .await
            .unwrap();

        registry
            .set_watched(&WatchScope::Currency("USD".into()), true)
            .await
            .unwrap();
        // c is watched but its listing has no trades beyond checkpoint 0.
        assert_eq!(
            registry.watched_symbols_needing_sync().await.unwrap(),
            vec!["a"]
        );

        registry
            .set_watched(&WatchScope::Symbol("a".into()), false)
            .await
            .unwrap();
        assert!(registry.watched_symbols_needing_sync().await.unwrap().is_empty());
        assert_eq!(registry.get("a").await.unwrap().unwrap().latest_trade_stored, None);
    }
}
