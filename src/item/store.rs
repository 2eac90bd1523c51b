//! Append-only candidate store organised in fixed-size chunks.
//!
//! A single reader thread appends lines while any number of ranking workers
//! scan snapshots. Only the trailing partial chunk is mutable; once it reaches
//! [`CHUNK_SIZE`] it is frozen into an `Arc<Chunk>` and published to the sealed
//! list. Scanners never lock chunks: they work on a [`Snapshot`] holding `Arc`
//! handles, so a chunk observed in a snapshot is always fully populated.
//!
//! Lock order is partial -> sealed; both are held only for the duration of a
//! push at the seal boundary or while a snapshot copies handles.

use crate::item::candidate::Candidate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Number of candidates per chunk
pub const CHUNK_SIZE: usize = 100;

/// Builds a candidate from a raw line and its index. Returning `None` drops
/// the line.
pub type CandidateBuilder = Box<dyn Fn(u32, &[u8]) -> Option<Candidate> + Send + Sync>;

/// Immutable batch of candidates
#[derive(Debug, Default)]
pub struct Chunk {
    items: Vec<Candidate>,
}

impl Chunk {
    #[inline]
    pub fn items(&self) -> &[Candidate] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == CHUNK_SIZE
    }
}

/// Point-in-time view of the store.
///
/// Every chunk but the last is full, so candidate `i` lives in chunk
/// `i / CHUNK_SIZE`.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    chunks: Arc<[Arc<Chunk>]>,
    count: usize,
    sealed: usize,
}

impl Snapshot {
    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    /// Total number of candidates
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of sealed (full) chunks at the time of the snapshot
    pub fn sealed_count(&self) -> usize {
        self.sealed
    }

    pub fn get(&self, idx: usize) -> Option<&Candidate> {
        self.chunks
            .get(idx / CHUNK_SIZE)
            .and_then(|chunk| chunk.items().get(idx % CHUNK_SIZE))
    }

    /// Visit every candidate of the chunks in `range` in order.
    pub fn scan(&self, range: std::ops::Range<usize>, mut visitor: impl FnMut(&Candidate)) {
        let end = range.end.min(self.chunks.len());
        let start = range.start.min(end);
        for chunk in &self.chunks[start..end] {
            chunk.items().iter().for_each(&mut visitor);
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Candidate> {
        self.chunks.iter().flat_map(|c| c.items().iter())
    }
}

/// Chunked candidate list shared between the reader and the ranker.
pub struct CandidateStore {
    sealed: RwLock<Vec<Arc<Chunk>>>,
    partial: Mutex<Vec<Candidate>>,
    count: AtomicUsize,
    finished: AtomicBool,
    builder: CandidateBuilder,
}

impl CandidateStore {
    pub fn new(builder: CandidateBuilder) -> Self {
        Self {
            sealed: RwLock::new(Vec::new()),
            partial: Mutex::new(Vec::with_capacity(CHUNK_SIZE)),
            count: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
            builder,
        }
    }

    /// Store whose candidates display their raw line unchanged
    pub fn plain() -> Self {
        Self::new(Box::new(|index: u32, data: &[u8]| {
            Some(Candidate::from_raw(index, Arc::from(data)))
        }))
    }

    /// Append one line. Returns `false` when the builder rejected it or the
    /// store has already been finished.
    pub fn push(&self, data: &[u8]) -> bool {
        if self.finished.load(Ordering::Acquire) {
            return false;
        }

        let mut partial = self.partial.lock().unwrap_or_else(|e| e.into_inner());
        let index = self.count.load(Ordering::Relaxed) as u32;
        let Some(candidate) = (self.builder)(index, data) else {
            return false;
        };
        partial.push(candidate);

        if partial.len() == CHUNK_SIZE {
            let items = std::mem::replace(&mut *partial, Vec::with_capacity(CHUNK_SIZE));
            let mut sealed = self.sealed.write().unwrap_or_else(|e| e.into_inner());
            sealed.push(Arc::new(Chunk { items }));
        }
        self.count.fetch_add(1, Ordering::Release);
        true
    }

    /// Mark end of input. The candidate count is frozen afterwards.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
        debug!(count = self.count(), "candidate store finished");
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Number of sealed chunks
    pub fn sealed_count(&self) -> usize {
        self.sealed.read().map(|s| s.len()).unwrap_or_else(|e| e.into_inner().len())
    }

    /// Consistent view of everything pushed so far. The partial chunk is
    /// copied so the snapshot never changes under the caller.
    pub fn snapshot(&self) -> Snapshot {
        let partial = self.partial.lock().unwrap_or_else(|e| e.into_inner());
        let sealed = self.sealed.read().unwrap_or_else(|e| e.into_inner());

        let mut chunks: Vec<Arc<Chunk>> = Vec::with_capacity(sealed.len() + 1);
        chunks.extend(sealed.iter().cloned());
        let sealed_len = chunks.len();
        if !partial.is_empty() {
            chunks.push(Arc::new(Chunk {
                items: partial.clone(),
            }));
        }

        let count = sealed_len * CHUNK_SIZE + partial.len();
        Snapshot {
            chunks: chunks.into(),
            count,
            sealed: sealed_len,
        }
    }
}
