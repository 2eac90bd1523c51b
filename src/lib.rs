//! # fzx - Interactive fuzzy finder
//!
//! fzx reads a list of lines from stdin (or a default command), lets the user
//! narrow it down with a fuzzy query, and prints the selection. Matching and
//! ranking run on a worker pool while input is still streaming, so the prompt
//! stays responsive on millions of lines.
//!
//! ## Architecture
//!
//! - [`item`] - candidate lines, the chunked store and the input reader
//! - [`matching`] - match algorithms, query compilation and ranking passes
//! - [`tui`] - terminal event/render loop (feature `interactive`)
//! - [`config`] - command line and config file
//! - [`output`] - printing selections and filter results
//!
//! ## Quick Start
//!
//! ```ignore
//! use fzx::item::CandidateStore;
//! use fzx::matching::{PatternBuilder, PatternOptions, RankOptions, rank};
//! use std::sync::atomic::AtomicBool;
//!
//! let store = CandidateStore::plain();
//! for line in ["apple", "apply", "snapple"] {
//!     store.push(line.as_bytes());
//! }
//! store.finish();
//!
//! let pattern = PatternBuilder::new(PatternOptions::default()).build("app");
//! let merger = rank(&pattern, &store.snapshot(), &RankOptions::default(), true, &AtomicBool::new(false), &|_| {})
//!     .unwrap();
//! for result in merger.iter() {
//!     println!("{}", result.item.as_str());
//! }
//! ```
//!
//! ## Ranking
//!
//! Results are ordered by score, then by the `--tiebreak` criteria, then by
//! input order. With more matches than the sort cap only the best ones are
//! fully ordered; the rest follow in input order.

pub mod config;
pub mod error;
pub mod item;
pub mod logging;
pub mod matching;
pub mod output;
#[cfg(feature = "interactive")]
pub mod tui;
