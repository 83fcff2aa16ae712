//! Error types for the mirror.

use thiserror::Error;

use tradeledger_feed::FeedError;
use tradeledger_store::StoreError;
use tradeledger_sync::SyncError;

/// Errors that can occur during mirror operations.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Remote feed error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Sync or verify error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Result type for mirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;
