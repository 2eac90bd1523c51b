//! Final result list of one ranking pass.

use crate::item::store::Snapshot;
use crate::matching::result::{MatchResult, compare};
use std::cmp::Ordering;

/// Ordered results handed to the UI.
///
/// An empty query yields [`Merger::Pass`], a view over the whole snapshot that
/// never copies candidates.
#[derive(Debug, Clone)]
pub enum Merger {
    Pass {
        snapshot: Snapshot,
        tac: bool,
    },
    Matched {
        results: Vec<MatchResult>,
        /// Length of the fully sorted prefix
        sorted_len: usize,
    },
}

impl Default for Merger {
    fn default() -> Self {
        Merger::Matched {
            results: Vec::new(),
            sorted_len: 0,
        }
    }
}

impl Merger {
    pub fn pass(snapshot: Snapshot, tac: bool) -> Self {
        Merger::Pass { snapshot, tac }
    }

    /// Results kept in input order (reversed with `tac`).
    pub fn unsorted(mut results: Vec<MatchResult>, tac: bool) -> Self {
        results.sort_unstable_by_key(|r| r.index());
        if tac {
            results.reverse();
        }
        Merger::Matched {
            results,
            sorted_len: 0,
        }
    }

    /// Rank `results`. When there are more than `cap` of them only the best
    /// `cap` are sorted; the rest follow in input order.
    pub fn sorted(mut results: Vec<MatchResult>, cap: usize, tac: bool) -> Self {
        let cmp = |a: &MatchResult, b: &MatchResult| compare(a, b, tac);
        let cap = cap.max(1);

        if results.len() > cap {
            results.select_nth_unstable_by(cap - 1, cmp);
            let (head, tail) = results.split_at_mut(cap);
            head.sort_unstable_by(cmp);
            tail.sort_unstable_by(|a, b| by_input_order(a, b, tac));
            Merger::Matched {
                results,
                sorted_len: cap,
            }
        } else {
            results.sort_unstable_by(cmp);
            let sorted_len = results.len();
            Merger::Matched { results, sorted_len }
        }
    }

    /// Number of matches, including any beyond the sort cap
    pub fn len(&self) -> usize {
        match self {
            Merger::Pass { snapshot, .. } => snapshot.count(),
            Merger::Matched { results, .. } => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many leading results are in rank order
    pub fn sorted_len(&self) -> usize {
        match self {
            Merger::Pass { .. } => 0,
            Merger::Matched { sorted_len, .. } => *sorted_len,
        }
    }

    pub fn get(&self, idx: usize) -> Option<MatchResult> {
        match self {
            Merger::Pass { snapshot, tac } => {
                let count = snapshot.count();
                if idx >= count {
                    return None;
                }
                let idx = if *tac { count - idx - 1 } else { idx };
                snapshot.get(idx).cloned().map(MatchResult::unranked)
            }
            Merger::Matched { results, .. } => results.get(idx).cloned(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = MatchResult> + '_ {
        (0..self.len()).map_while(move |i| self.get(i))
    }
}

fn by_input_order(a: &MatchResult, b: &MatchResult, tac: bool) -> Ordering {
    if tac {
        b.index().cmp(&a.index())
    } else {
        a.index().cmp(&b.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::candidate::Candidate;
    use crate::item::store::CandidateStore;
    use crate::matching::pattern::PatternMatch;
    use crate::matching::result::Tiebreak;
    use std::sync::Arc;

    fn results(scores: &[i32]) -> Vec<MatchResult> {
        let t = Tiebreak::default();
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let item = Candidate::from_raw(i as u32, Arc::from(&b"item"[..]));
                MatchResult::new(
                    item,
                    PatternMatch {
                        score: s,
                        offsets: vec![(0, 1)],
                        positions: Vec::new(),
                    },
                    &t,
                )
            })
            .collect()
    }

    fn indexes(m: &Merger) -> Vec<u32> {
        m.iter().map(|r| r.index()).collect()
    }

    #[test]
    fn test_pass_preserves_input_order() {
        let store = CandidateStore::plain();
        for s in ["3", "1", "2"] {
            store.push(s.as_bytes());
        }
        let m = Merger::pass(store.snapshot(), false);
        let texts: Vec<String> = m.iter().map(|r| r.item.as_str().into_owned()).collect();
        assert_eq!(texts, vec!["3", "1", "2"]);

        let m = Merger::pass(store.snapshot(), true);
        assert_eq!(indexes(&m), vec![2, 1, 0]);
    }

    #[test]
    fn test_sorted() {
        let m = Merger::sorted(results(&[10, 30, 20, 30]), 1000, false);
        assert_eq!(indexes(&m), vec![1, 3, 2, 0]);
        assert_eq!(m.sorted_len(), 4);

        let m = Merger::sorted(results(&[10, 30, 20, 30]), 1000, true);
        assert_eq!(indexes(&m), vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_unsorted_keeps_input_order() {
        let mut r = results(&[10, 30, 20]);
        r.reverse();
        let m = Merger::unsorted(r, false);
        assert_eq!(indexes(&m), vec![0, 1, 2]);
        assert_eq!(m.sorted_len(), 0);
        let m = Merger::unsorted(results(&[10, 30, 20]), true);
        assert_eq!(indexes(&m), vec![2, 1, 0]);
    }

    #[test]
    fn test_sort_cap() {
        let scores: Vec<i32> = (0..1500).map(|i| (i % 97) as i32).collect();
        let m = Merger::sorted(results(&scores), 1000, false);
        assert_eq!(m.len(), 1500);
        assert_eq!(m.sorted_len(), 1000);

        let all: Vec<MatchResult> = m.iter().collect();
        // The sorted head is in rank order
        assert!(all[..1000].windows(2).all(|w| compare(&w[0], &w[1], false) != Ordering::Greater));
        // and every result in it ranks at least as well as everything after it
        let worst_head = &all[999];
        assert!(all[1000..].iter().all(|r| compare(worst_head, r, false) != Ordering::Greater));
        // The tail follows input order
        assert!(all[1000..].windows(2).all(|w| w[0].index() < w[1].index()));
    }
}
