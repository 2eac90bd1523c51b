#![no_main]

use arbitrary::Arbitrary;
use fzx::item::Candidate;
use fzx::matching::{FuzzyAlgo, PatternBuilder, PatternOptions, Slab};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    query: &'a str,
    line: &'a [u8],
    v1: bool,
    extended: bool,
}

fuzz_target!(|input: Input| {
    // Compiling any query and matching it against any line must not panic
    let options = PatternOptions {
        algo: if input.v1 { FuzzyAlgo::V1 } else { FuzzyAlgo::V2 },
        extended: input.extended,
        ..PatternOptions::default()
    };
    let pattern = PatternBuilder::new(options).build(input.query);
    let item = Candidate::from_raw(0, Arc::from(input.line));
    let mut slab = Slab::default();
    if let Some(m) = pattern.match_item(&item, true, &mut slab) {
        assert!(m.positions.iter().all(|&p| p < item.text().len()));
    }
});
