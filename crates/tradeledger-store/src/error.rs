//! Store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Database(#[from] rusqlite::Error),

    /// The ledger file was written by a newer release.
    #[error("ledger schema v{found} is newer than supported v{supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// Trades or recovery state for a symbol the registry has never listed.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// A stored value violates an invariant of the ledger.
    #[error("corrupt ledger: {0}")]
    Corrupt(String),

    /// A writer panicked while holding the store lock.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// The blocking task running a query was cancelled or panicked.
    #[error("storage task failed: {0}")]
    TaskFailed(String),

    #[error("ledger directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
