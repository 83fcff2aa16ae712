//! What a sync run did.

use tradeledger_store::RefreshStats;

/// How a symbol was brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Full archive download into an empty ledger.
    Bootstrap,
    /// Delta fetched from the ledger's latest trade.
    Incremental,
}

/// Result of one [`crate::SyncEngine::update_symbol`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolReport {
    pub symbol: String,
    /// Mode of the final pass.
    pub mode: SyncMode,
    /// Rows appended across all passes.
    pub inserted: u64,
    /// Delta rows skipped because the ledger already held them.
    pub skipped_overlap: u64,
    /// Rows removed by rebootstraps.
    pub deleted: u64,
    pub rebootstraps: u32,
    /// Latest trade time seen by the final pass.
    pub last_time: Option<i64>,
    /// Checkpoint after the call.
    pub checkpoint: Option<i64>,
}

impl SymbolReport {
    pub(crate) fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_owned(),
            mode: SyncMode::Incremental,
            inserted: 0,
            skipped_overlap: 0,
            deleted: 0,
            rebootstraps: 0,
            last_time: None,
            checkpoint: None,
        }
    }
}

/// A symbol skipped after a malformed record or an exhausted rebootstrap
/// budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
}

/// Result of a multi-symbol run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Registry changes from the listing refresh.
    pub listing: RefreshStats,
    /// Symbols synchronized, in the order they ran.
    pub symbols: Vec<SymbolReport>,
    /// Symbols that failed on their own; the run went on without them.
    pub failures: Vec<SymbolFailure>,
}

impl UpdateReport {
    /// Rows appended across all symbols.
    pub fn inserted(&self) -> u64 {
        self.symbols.iter().map(|s| s.inserted).sum()
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }

    /// Whether every symbol synchronized.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
