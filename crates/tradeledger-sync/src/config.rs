//! Sync engine configuration.

/// Configuration for [`crate::SyncEngine`] and [`crate::verify_symbol`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Rows per ledger transaction while appending.
    pub commit_batch_rows: usize,

    /// Consecutive rebootstraps of one symbol without progress before
    /// giving up with [`crate::SyncError::IncompleteArchive`].
    pub max_rebootstraps: u32,

    /// Ledger rows fetched per page while verifying.
    pub verify_page_size: usize,

    /// Log a progress line every this many appended rows.
    pub progress_interval: u64,

    /// Log a progress line every this many verified rows.
    pub verify_progress_interval: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            commit_batch_rows: 1 << 20,
            max_rebootstraps: 3,
            verify_page_size: 4096,
            progress_interval: 1 << 20,
            verify_progress_interval: 1 << 19,
        }
    }
}
