//! Byte sources: where a [`crate::RecordStream`] pulls its chunks from.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A pull-based producer of body chunks.
///
/// Chunks arrive in order and may split the content at any byte. `None`
/// marks the end of the body. Dropping the source releases whatever
/// connection backs it.
#[async_trait]
pub trait ByteSource: Send {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// A source backed by chunks already in memory.
pub struct ChunkSource {
    chunks: VecDeque<Bytes>,
    _release: Option<ReleaseGuard>,
}

impl ChunkSource {
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
            _release: None,
        }
    }

    /// Split `body` into chunks of at most `chunk_size` bytes.
    pub fn split(body: &[u8], chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self::new(
            body.chunks(chunk_size)
                .map(Bytes::copy_from_slice)
                .collect::<Vec<_>>(),
        )
    }

    /// Hold `guard` for as long as this source lives.
    pub fn tracked(mut self, guard: ReleaseGuard) -> Self {
        self._release = Some(guard);
        self
    }
}

#[async_trait]
impl ByteSource for ChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }
}

/// Counts a live connection until dropped.
#[derive(Debug)]
pub struct ReleaseGuard {
    open: Arc<AtomicUsize>,
}

impl ReleaseGuard {
    pub fn acquire(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self { open: Arc::clone(open) }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
