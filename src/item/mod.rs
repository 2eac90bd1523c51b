//! Candidate storage and input.
//!
//! Lines flow from the [`reader`] into the [`store::CandidateStore`], which
//! the ranker scans through snapshots.

pub mod candidate;
pub mod chars;
pub mod reader;
pub mod store;
pub mod tokenizer;

pub use candidate::Candidate;
pub use chars::Chars;
pub use store::{CHUNK_SIZE, CandidateStore, Chunk, Snapshot};
