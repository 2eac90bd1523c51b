//! Ranking passes
//!
//! A pass matches a compiled [`Pattern`] against a store [`Snapshot`] on the
//! rayon pool. Chunks are split into one partition per worker; each worker
//! owns a [`Slab`] and checks the pass's cancellation flag between chunks, so
//! a superseded pass stops within one chunk's worth of work.
//!
//! The [`Ranker`] runs passes on a coordinator thread. Requests queue up while
//! a pass is running and only the newest one is executed afterwards; every
//! submit also flags the previous request as cancelled.

use crate::item::store::Snapshot;
use crate::matching::algo::Slab;
use crate::matching::merger::Merger;
use crate::matching::pattern::Pattern;
use crate::matching::result::{MatchResult, Tiebreak};
use lru::LruCache;
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, trace};

/// Default `--sort` cap
pub const DEFAULT_SORT_CAP: usize = 1000;

/// Passes running longer than this report progress
const PROGRESS_DELAY_MS: u64 = 200;
const PROGRESS_INTERVAL_MS: u64 = 100;

/// Mergers larger than this are not cached
const MERGER_CACHE_MAX: usize = 100_000;
const MERGER_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// Ranking options fixed for the session
#[derive(Debug, Clone)]
pub struct RankOptions {
    /// `None` starts the session unsorted. Sorting turned on later with
    /// `toggle-sort` uses [`DEFAULT_SORT_CAP`].
    pub sort_cap: Option<usize>,
    pub tac: bool,
    pub tiebreak: Tiebreak,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            sort_cap: Some(DEFAULT_SORT_CAP),
            tac: false,
            tiebreak: Tiebreak::default(),
        }
    }
}

/// One pass to run
#[derive(Debug, Clone)]
pub struct RankRequest {
    pub generation: u64,
    pub pattern: Arc<Pattern>,
    pub snapshot: Snapshot,
    /// Toggled at runtime with `toggle-sort`
    pub sort: bool,
}

/// Notifications from the coordinator thread
#[derive(Debug, Clone)]
pub enum RankEvent {
    Progress { generation: u64, percent: u8 },
    /// `pattern` is the one that produced `merger`
    Done {
        generation: u64,
        pattern: Arc<Pattern>,
        merger: Arc<Merger>,
    },
}

/// Rate-limits progress callbacks from worker threads
struct ProgressGate {
    start: Instant,
    next_ms: AtomicU64,
    done: AtomicUsize,
    total: usize,
}

impl ProgressGate {
    fn new(total: usize) -> Self {
        Self {
            start: Instant::now(),
            next_ms: AtomicU64::new(PROGRESS_DELAY_MS),
            done: AtomicUsize::new(0),
            total,
        }
    }

    /// Count one chunk; returns the percentage when a report is due
    fn tick(&self) -> Option<u8> {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let elapsed = self.start.elapsed().as_millis() as u64;
        let next = self.next_ms.load(Ordering::Relaxed);
        if elapsed < next {
            return None;
        }
        self.next_ms
            .compare_exchange(next, elapsed + PROGRESS_INTERVAL_MS, Ordering::Relaxed, Ordering::Relaxed)
            .ok()
            .map(|_| (done * 100 / self.total.max(1)) as u8)
    }
}

/// Run one pass synchronously. Returns `None` when cancelled.
pub fn rank(
    pattern: &Pattern,
    snapshot: &Snapshot,
    options: &RankOptions,
    sort: bool,
    cancel: &AtomicBool,
    progress: &(dyn Fn(u8) + Sync),
) -> Option<Merger> {
    if pattern.is_empty() {
        return Some(Merger::pass(snapshot.clone(), options.tac));
    }

    let chunks = snapshot.chunks();
    let partitions = rayon::current_num_threads().clamp(1, chunks.len().max(1));
    let per_partition = chunks.len().div_ceil(partitions).max(1);
    let gate = ProgressGate::new(chunks.len());

    let parts: Vec<Option<Vec<MatchResult>>> = chunks
        .par_chunks(per_partition)
        .map_init(Slab::default, |slab, partition| {
            let mut out = Vec::new();
            for chunk in partition {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                for item in chunk.items() {
                    if let Some(m) = pattern.match_item(item, false, slab) {
                        out.push(MatchResult::new(item.clone(), m, &options.tiebreak));
                    }
                }
                if let Some(percent) = gate.tick() {
                    progress(percent);
                }
            }
            Some(out)
        })
        .collect();

    if cancel.load(Ordering::Relaxed) {
        return None;
    }
    let mut results = Vec::with_capacity(parts.iter().flatten().map(Vec::len).sum());
    for part in parts {
        results.extend(part?);
    }

    let merger = if sort && pattern.is_sortable() {
        let cap = options.sort_cap.unwrap_or(DEFAULT_SORT_CAP);
        Merger::sorted(results, cap, options.tac)
    } else {
        Merger::unsorted(results, options.tac)
    };
    Some(merger)
}

struct Job {
    request: RankRequest,
    cancel: Arc<AtomicBool>,
}

/// Background ranking coordinator.
pub struct Ranker {
    tx: Option<Sender<Job>>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ranker {
    pub fn spawn<F>(options: RankOptions, notify: F) -> Self
    where
        F: Fn(RankEvent) + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job>();
        let thread = thread::Builder::new()
            .name("fzx-ranker".into())
            .spawn(move || coordinate(rx, options, notify))
            .ok();
        Self {
            tx: Some(tx),
            cancel: Arc::new(AtomicBool::new(false)),
            thread,
        }
    }

    /// Queue a pass, cancelling the one before it.
    pub fn submit(&mut self, request: RankRequest) {
        self.cancel.store(true, Ordering::Release);
        self.cancel = Arc::new(AtomicBool::new(false));
        trace!(generation = request.generation, query = request.pattern.as_str(), "rank request");
        if let Some(tx) = &self.tx {
            let _ = tx.send(Job {
                request,
                cancel: Arc::clone(&self.cancel),
            });
        }
    }
}

impl Drop for Ranker {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        self.tx.take();
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

fn coordinate<F>(rx: Receiver<Job>, options: RankOptions, notify: F)
where
    F: Fn(RankEvent) + Send + Sync + 'static,
{
    let mut cache: LruCache<(String, bool), Arc<Merger>> = LruCache::new(MERGER_CACHE_SIZE);
    let mut cache_count = 0;

    while let Ok(mut job) = rx.recv() {
        // Only the newest request matters
        while let Ok(newer) = rx.try_recv() {
            job = newer;
        }
        if job.cancel.load(Ordering::Acquire) {
            continue;
        }

        let RankRequest {
            generation,
            pattern,
            snapshot,
            sort,
        } = job.request;

        if snapshot.count() != cache_count {
            cache.clear();
            cache_count = snapshot.count();
        }
        let key = (pattern.as_str().to_string(), sort);
        if let Some(merger) = cache.get(&key) {
            debug!(generation, "merger cache hit");
            notify(RankEvent::Done {
                generation,
                pattern,
                merger: Arc::clone(merger),
            });
            continue;
        }

        let start = Instant::now();
        let report = |percent| notify(RankEvent::Progress { generation, percent });
        match rank(&pattern, &snapshot, &options, sort, &job.cancel, &report) {
            Some(merger) => {
                debug!(
                    generation,
                    matches = merger.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "rank pass done"
                );
                let merger = Arc::new(merger);
                if merger.len() <= MERGER_CACHE_MAX {
                    cache.put(key, Arc::clone(&merger));
                }
                notify(RankEvent::Done {
                    generation,
                    pattern,
                    merger,
                });
            }
            None => trace!(generation, "rank pass cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::store::CandidateStore;
    use crate::matching::pattern::{PatternBuilder, PatternOptions};
    use std::time::Duration;

    fn store(lines: &[&str]) -> CandidateStore {
        let store = CandidateStore::plain();
        for l in lines {
            store.push(l.as_bytes());
        }
        store.finish();
        store
    }

    fn run(query: &str, lines: &[&str], options: &RankOptions) -> Vec<String> {
        let mut builder = PatternBuilder::new(PatternOptions::default());
        let pattern = builder.build(query);
        let snap = store(lines).snapshot();
        let cancel = AtomicBool::new(false);
        rank(&pattern, &snap, options, options.sort_cap.is_some(), &cancel, &|_| {})
            .unwrap()
            .iter()
            .map(|r| r.item.as_str().into_owned())
            .collect()
    }

    #[test]
    fn test_fuzzy_ranking_order() {
        let out = run("app", &["apple", "apply", "snapple"], &RankOptions::default());
        assert_eq!(out, vec!["apple", "apply", "snapple"]);
    }

    #[test]
    fn test_no_sort_keeps_input_order() {
        let options = RankOptions {
            sort_cap: None,
            ..RankOptions::default()
        };
        assert_eq!(run("", &["3", "1", "2"], &options), vec!["3", "1", "2"]);
        assert_eq!(run("a", &["xa", "a", "aaa"], &options), vec!["xa", "a", "aaa"]);

        let tac = RankOptions { tac: true, ..options };
        assert_eq!(run("a", &["xa", "a", "aaa"], &tac), vec!["aaa", "a", "xa"]);
    }

    #[test]
    fn test_sort_turned_on_without_cap() {
        let options = RankOptions {
            sort_cap: None,
            ..RankOptions::default()
        };
        let mut builder = PatternBuilder::new(PatternOptions::default());
        let pattern = builder.build("a");
        let snap = store(&["xa", "a", "aaa"]).snapshot();
        let merger = rank(&pattern, &snap, &options, true, &AtomicBool::new(false), &|_| {}).unwrap();
        let out: Vec<String> = merger.iter().map(|r| r.item.as_str().into_owned()).collect();
        assert_eq!(out, vec!["a", "aaa", "xa"]);
        assert_eq!(merger.sorted_len(), 3);
    }

    #[test]
    fn test_inverse_only_is_unsorted() {
        let out = run("!zzz", &["ccc", "a", "bb"], &RankOptions::default());
        assert_eq!(out, vec!["ccc", "a", "bb"]);
    }

    #[test]
    fn test_sort_cap_reports_full_count() {
        let lines: Vec<String> = (0..1500).map(|i| format!("line {}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut builder = PatternBuilder::new(PatternOptions::default());
        let pattern = builder.build("l");
        let snap = store(&refs).snapshot();
        let merger = rank(&pattern, &snap, &RankOptions::default(), true, &AtomicBool::new(false), &|_| {}).unwrap();
        assert_eq!(merger.len(), 1500);
        assert_eq!(merger.sorted_len(), 1000);
    }

    #[test]
    fn test_cancelled_pass_returns_nothing() {
        let mut builder = PatternBuilder::new(PatternOptions::default());
        let pattern = builder.build("a");
        let snap = store(&["a", "b"]).snapshot();
        let cancel = AtomicBool::new(true);
        assert!(rank(&pattern, &snap, &RankOptions::default(), true, &cancel, &|_| {}).is_none());
    }

    #[test]
    fn test_deterministic() {
        let lines: Vec<String> = (0..3000).map(|i| format!("{}/src/file_{}.rs", i % 7, i % 13)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let first = run("srcfile", &refs, &RankOptions::default());
        for _ in 0..3 {
            assert_eq!(run("srcfile", &refs, &RankOptions::default()), first);
        }
    }

    #[test]
    fn test_ranker_delivers_latest_generation() {
        let (tx, rx) = mpsc::channel();
        let mut ranker = Ranker::spawn(RankOptions::default(), move |ev| {
            let _ = tx.send(ev);
        });
        let snap = store(&["alpha", "beta", "gamma"]).snapshot();
        let mut builder = PatternBuilder::new(PatternOptions::default());
        for (generation, q) in ["a", "al", "alp"].iter().enumerate() {
            ranker.submit(RankRequest {
                generation: generation as u64,
                pattern: builder.build(q),
                snapshot: snap.clone(),
                sort: true,
            });
        }

        let mut last_done = None;
        while let Ok(ev) = rx.recv_timeout(Duration::from_secs(5)) {
            if let RankEvent::Done { generation, pattern, merger } = ev {
                assert_eq!(pattern.as_str(), ["a", "al", "alp"][generation as usize]);
                if let Some(prev) = last_done {
                    assert!(generation > prev);
                }
                last_done = Some(generation);
                if generation == 2 {
                    assert_eq!(merger.len(), 1);
                    break;
                }
            }
        }
        assert_eq!(last_done, Some(2));
    }
}
