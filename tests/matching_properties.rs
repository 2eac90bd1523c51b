//! Property tests for the match algorithms and ranking passes.

use fzx::item::{CandidateStore, Chars};
use fzx::matching::algo::{
    AlgoFn, exact_match_naive, fuzzy_match_v1, fuzzy_match_v2, prefix_match, suffix_match,
};
use fzx::matching::{PatternBuilder, PatternOptions, RankOptions, ScoringWeights, Slab, rank};
use proptest::prelude::*;
use std::sync::atomic::AtomicBool;

fn run(algo: AlgoFn, text: &str, pattern: &str, with_pos: bool) -> Option<fzx::matching::algo::AlgoMatch> {
    let chars = Chars::from_text(text);
    let pattern: Vec<char> = pattern.chars().collect();
    let mut slab = Slab::default();
    algo(true, false, true, &chars, &pattern, with_pos, &mut slab, &ScoringWeights::default())
}

fn is_subsequence(pattern: &str, text: &str) -> bool {
    let mut it = text.chars();
    pattern.chars().all(|p| it.any(|c| c == p))
}

proptest! {
    #[test]
    fn exact_match_implies_fuzzy_match(text in "[a-z_/.]{1,40}", start in 0usize..40, len in 1usize..8) {
        let start = start % text.len();
        let end = (start + len).min(text.len());
        let needle = &text[start..end];
        prop_assert!(run(exact_match_naive, &text, needle, false).is_some());
        prop_assert!(run(fuzzy_match_v1, &text, needle, false).is_some());
        prop_assert!(run(fuzzy_match_v2, &text, needle, false).is_some());
    }

    #[test]
    fn prefix_and_suffix_imply_fuzzy_match(text in "[a-z_/.]{1,40}", len in 1usize..8) {
        let len = len.min(text.len());
        let prefix = &text[..len];
        let suffix = &text[text.len() - len..];
        prop_assert!(run(prefix_match, &text, prefix, false).is_some());
        prop_assert!(run(fuzzy_match_v2, &text, prefix, false).is_some());
        prop_assert!(run(suffix_match, &text, suffix, false).is_some());
        prop_assert!(run(fuzzy_match_v2, &text, suffix, false).is_some());
    }

    #[test]
    fn fuzzy_matches_exactly_the_subsequences(text in "[abc/]{0,30}", pattern in "[abc]{1,5}") {
        let expected = is_subsequence(&pattern, &text);
        prop_assert_eq!(run(fuzzy_match_v1, &text, &pattern, false).is_some(), expected);
        prop_assert_eq!(run(fuzzy_match_v2, &text, &pattern, false).is_some(), expected);
    }

    #[test]
    fn v2_positions_spell_the_pattern(text in "[a-z_ ]{1,50}", pattern in "[a-z]{1,6}") {
        if let Some(m) = run(fuzzy_match_v2, &text, &pattern, true) {
            let chars: Vec<char> = text.chars().collect();
            prop_assert_eq!(m.positions.len(), pattern.chars().count());
            prop_assert!(m.positions.windows(2).all(|w| w[0] < w[1]));
            let spelled: String = m.positions.iter().map(|&i| chars[i]).collect();
            prop_assert_eq!(spelled, pattern);
            prop_assert!(m.start <= m.positions[0]);
            prop_assert!(m.end > *m.positions.last().unwrap());
        }
    }

    #[test]
    fn ranking_is_deterministic(lines in prop::collection::vec("[a-e/]{0,12}", 0..300), query in "[a-e]{0,3}") {
        let store = CandidateStore::plain();
        for line in &lines {
            store.push(line.as_bytes());
        }
        store.finish();
        let snapshot = store.snapshot();
        let pattern = PatternBuilder::new(PatternOptions::default()).build(&query);
        let options = RankOptions::default();
        let cancel = AtomicBool::new(false);

        let first = rank(&pattern, &snapshot, &options, true, &cancel, &|_| {}).unwrap();
        let second = rank(&pattern, &snapshot, &options, true, &cancel, &|_| {}).unwrap();
        let a: Vec<u32> = first.iter().map(|r| r.index()).collect();
        let b: Vec<u32> = second.iter().map(|r| r.index()).collect();
        prop_assert_eq!(&a, &b);

        let expected = lines.iter().filter(|l| is_subsequence(&query, l)).count();
        prop_assert_eq!(a.len(), expected);
    }
}
