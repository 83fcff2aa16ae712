//! Error types for the sync module.

use thiserror::Error;

use tradeledger_feed::FeedError;
use tradeledger_store::StoreError;

/// Errors that can occur during sync and verify operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Remote feed failed or sent undecodable data.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// No exchange row exists for the symbol.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// The remote archive kept stopping short of the listing after repeated
    /// rebootstraps.
    #[error("{symbol}: remote archive still incomplete after {attempts} rebootstraps")]
    IncompleteArchive { symbol: String, attempts: u32 },
}

impl SyncError {
    /// Whether this is a decode failure confined to one symbol.
    pub fn is_malformed(&self) -> bool {
        matches!(self, SyncError::Feed(e) if e.is_malformed())
    }

    /// Whether a multi-symbol run can record this failure and move on to the
    /// next symbol. Store and transport failures are not.
    pub fn is_symbol_local(&self) -> bool {
        self.is_malformed() || matches!(self, SyncError::IncompleteArchive { .. })
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
