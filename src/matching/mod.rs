//! Matching, scoring and ranking.
//!
//! - [`algo`] - per-candidate match algorithms (fuzzy v1/v2, exact, prefix, ...)
//! - [`pattern`] - query compilation into term groups
//! - [`result`] / [`merger`] - ranked results and the ordered list shown to the user
//! - [`ranker`] - parallel passes over a store snapshot

pub mod algo;
pub mod merger;
pub mod normalize;
pub mod pattern;
pub mod ranker;
pub mod result;
pub mod scoring;

pub use algo::{FuzzyAlgo, Slab};
pub use merger::Merger;
pub use pattern::{CaseMode, Pattern, PatternBuilder, PatternMatch, PatternOptions};
pub use ranker::{RankEvent, RankOptions, RankRequest, Ranker, rank};
pub use result::{MatchResult, Tiebreak};
pub use scoring::ScoringWeights;
