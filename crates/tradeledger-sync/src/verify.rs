//! Verification of a symbol's ledger against the remote archive.
//!
//! The ledger, walked in `(time, id)` order a page at a time, is paired
//! positionally with a fresh decode of the full archive. Neither side is
//! ever held in memory as a whole.

use std::fmt;

use tracing::{info, warn};

use tradeledger_core::{TradeQuery, TradeRow};
use tradeledger_feed::RemoteFeed;
use tradeledger_store::{Store, StoreExt};

use crate::config::SyncConfig;
use crate::error::Result;

/// Outcome of a verification.
///
/// Positions are 1-based ordinals in ledger order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyReport {
    /// Both sides ended together.
    ExactMatch { count: u64 },

    /// The archive ended first; the extra local rows are newer trades the
    /// archive does not carry yet.
    LocalAhead { matched: u64, extra: u64 },

    /// The row at `position` differs.
    Mismatch {
        position: u64,
        local: TradeRow,
        remote: TradeRow,
    },

    /// The ledger ended first; `remote` is the first row it lacks.
    RemoteAhead { position: u64, remote: TradeRow },
}

impl VerifyReport {
    /// Whether the ledger agrees with the archive.
    pub fn passed(&self) -> bool {
        matches!(
            self,
            VerifyReport::ExactMatch { .. } | VerifyReport::LocalAhead { .. }
        )
    }

    /// Rows that matched before the outcome was decided.
    pub fn matched(&self) -> u64 {
        match self {
            VerifyReport::ExactMatch { count } => *count,
            VerifyReport::LocalAhead { matched, .. } => *matched,
            VerifyReport::Mismatch { position, .. } | VerifyReport::RemoteAhead { position, .. } => {
                position - 1
            }
        }
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyReport::ExactMatch { count } => write!(f, "correct with {count} trades"),
            VerifyReport::LocalAhead { matched, extra } => write!(
                f,
                "correct for {matched} trades, {extra} new trades not in remote archive yet"
            ),
            VerifyReport::Mismatch {
                position,
                local,
                remote,
            } => write!(
                f,
                "failed verification at trade {position}; local={local:?} remote={remote:?}"
            ),
            VerifyReport::RemoteAhead { position, remote } => write!(
                f,
                "correct for {} but not updated; next trade is {remote:?}",
                position - 1
            ),
        }
    }
}

/// Verify `symbol`'s ledger against the remote archive.
///
/// A failed comparison is a report, not an error. Errors are reserved for
/// transport, store and decode failures.
pub async fn verify_symbol<S, F>(
    store: &S,
    feed: &F,
    symbol: &str,
    config: &SyncConfig,
) -> Result<VerifyReport>
where
    S: Store + ?Sized,
    F: RemoteFeed + ?Sized,
{
    let mut remote = feed.history(symbol).await?;
    let mut local = store.scan(TradeQuery::symbol(symbol), config.verify_page_size);
    let interval = config.verify_progress_interval.max(1);
    let mut matched: u64 = 0;

    while let Some(remote_row) = remote.next_trade().await? {
        let position = matched + 1;
        let Some(stored) = local.next().await? else {
            let report = VerifyReport::RemoteAhead {
                position,
                remote: remote_row,
            };
            warn!(symbol, "{}", report);
            return Ok(report);
        };

        let stored = stored.row();
        if stored != remote_row {
            let report = VerifyReport::Mismatch {
                position,
                local: stored,
                remote: remote_row,
            };
            warn!(symbol, "{}", report);
            return Ok(report);
        }

        matched = position;
        if matched % interval == 0 {
            info!(symbol, matched, "verified");
        }
    }

    let extra = local.count_remaining().await?;
    let report = if extra > 0 {
        VerifyReport::LocalAhead { matched, extra }
    } else {
        VerifyReport::ExactMatch { count: matched }
    };
    info!(symbol, "{}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeledger_feed::MemoryFeed;
    use tradeledger_store::MemoryStore;
    use tradeledger_testkit::{row, rows, TestFixture};

    async fn fixture(local: &[TradeRow], remote: &[TradeRow]) -> TestFixture {
        let fixture = TestFixture::new();
        fixture.publish("X", "USD", remote).await;
        fixture.register_and_watch().await;
        fixture.store.append_trades("X", local.to_vec()).await.unwrap();
        fixture
    }

    async fn verify(fixture: &TestFixture) -> VerifyReport {
        let config = SyncConfig {
            verify_page_size: 1,
            verify_progress_interval: 1,
            ..SyncConfig::default()
        };
        verify_symbol::<MemoryStore, MemoryFeed>(&fixture.store, &fixture.feed, "X", &config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_exact_match() {
        let data = rows(&[(100, "1", "2"), (200, "1", "3")]);
        let fixture = fixture(&data, &data).await;

        let report = verify(&fixture).await;
        assert_eq!(report, VerifyReport::ExactMatch { count: 2 });
        assert!(report.passed());
    }

    #[tokio::test]
    async fn test_local_ahead_passes() {
        let local = rows(&[(100, "1", "2"), (200, "1", "3")]);
        let fixture = fixture(&local, &local[..1]).await;

        let report = verify(&fixture).await;
        assert_eq!(report, VerifyReport::LocalAhead { matched: 1, extra: 1 });
        assert!(report.passed());
        assert_eq!(
            report.to_string(),
            "correct for 1 trades, 1 new trades not in remote archive yet"
        );
    }

    #[tokio::test]
    async fn test_mismatch_reports_both_rows() {
        let local = rows(&[(100, "1", "2"), (200, "1.0", "3")]);
        let remote = rows(&[(100, "1", "2"), (200, "1", "3")]);
        let fixture = fixture(&local, &remote).await;

        let report = verify(&fixture).await;
        assert_eq!(
            report,
            VerifyReport::Mismatch {
                position: 2,
                local: row(200, "1.0", "3"),
                remote: row(200, "1", "3"),
            }
        );
        assert!(!report.passed());
        assert_eq!(report.matched(), 1);
        assert_eq!(fixture.feed.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_remote_ahead_fails() {
        let remote = rows(&[(100, "1", "2"), (200, "1", "3")]);
        let fixture = fixture(&remote[..1], &remote).await;

        let report = verify(&fixture).await;
        assert_eq!(
            report,
            VerifyReport::RemoteAhead {
                position: 2,
                remote: row(200, "1", "3"),
            }
        );
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn test_empty_on_both_sides() {
        let fixture = fixture(&[], &[]).await;
        assert_eq!(verify(&fixture).await, VerifyReport::ExactMatch { count: 0 });
    }
}
