//! Ranked match results and the tie-break comparator.

use crate::error::Error;
use crate::item::candidate::Candidate;
use crate::matching::pattern::PatternMatch;
use std::cmp::Ordering;
use std::str::FromStr;

/// Sort key applied after the score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Higher score first
    Score,
    /// Shorter trimmed text first
    Length,
    /// Earlier match start first
    Begin,
    /// Match closer to the end first
    End,
}

/// Ordered list of criteria, always starting with `Score`.
///
/// Input order is the implied final key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tiebreak(Vec<Criterion>);

impl Default for Tiebreak {
    fn default() -> Self {
        Tiebreak(vec![Criterion::Score, Criterion::Length])
    }
}

impl Tiebreak {
    pub fn criteria(&self) -> &[Criterion] {
        &self.0
    }

    /// Matching scans backward when `end` is preferred over `begin`.
    pub fn forward(&self) -> bool {
        for c in &self.0 {
            match c {
                Criterion::End => return false,
                Criterion::Begin => return true,
                _ => {}
            }
        }
        true
    }
}

impl FromStr for Tiebreak {
    type Err = Error;

    /// Parse `length,begin,end,index`. `index` may only come last; at most
    /// three criteria besides the score.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut criteria = vec![Criterion::Score];
        let mut has_index = false;
        for name in s.to_lowercase().split(',') {
            if has_index {
                return Err(Error::InvalidTiebreak("index should be the last criterion".into()));
            }
            let criterion = match name.trim() {
                "index" => {
                    has_index = true;
                    continue;
                }
                "length" => Criterion::Length,
                "begin" => Criterion::Begin,
                "end" => Criterion::End,
                other => return Err(Error::InvalidTiebreak(other.to_string())),
            };
            if criteria.contains(&criterion) {
                return Err(Error::InvalidTiebreak(format!("duplicate sort criteria: {}", name)));
            }
            criteria.push(criterion);
        }
        if criteria.len() > 4 {
            return Err(Error::InvalidTiebreak(format!("at most 3 tiebreaks are allowed: {}", s)));
        }
        Ok(Tiebreak(criteria))
    }
}

/// A candidate that satisfied the query, with its rank.
///
/// `points` holds one key per criterion, lowest first wins, with the first
/// criterion in the highest slot so the array compares lexicographically from
/// the back.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub item: Candidate,
    pub points: [u16; 4],
    pub offsets: Vec<(usize, usize)>,
}

fn as_u16(v: i64) -> u16 {
    v.clamp(0, u16::MAX as i64) as u16
}

impl MatchResult {
    /// Result for an item shown without ranking (empty query or `--no-sort`)
    pub fn unranked(item: Candidate) -> Self {
        Self {
            item,
            points: [0; 4],
            offsets: Vec::new(),
        }
    }

    pub fn new(item: Candidate, m: PatternMatch, tiebreak: &Tiebreak) -> Self {
        let mut offsets = m.offsets;
        offsets.sort_unstable();

        let text = item.text();
        let num_chars = text.len();
        let mut min_begin = usize::MAX;
        let mut min_end = usize::MAX;
        let mut max_end = 0;
        let mut valid = false;
        for &(b, e) in &offsets {
            if b < e {
                min_begin = min_begin.min(b);
                min_end = min_end.min(e);
                max_end = max_end.max(e);
                valid = true;
            }
        }

        let mut points = [0u16; 4];
        for (idx, criterion) in tiebreak.criteria().iter().enumerate() {
            let val = match criterion {
                Criterion::Score => u16::MAX - as_u16(m.score as i64),
                Criterion::Length => as_u16(text.trim_len() as i64),
                Criterion::Begin | Criterion::End if valid => {
                    let mut white_prefix = 0;
                    for i in 0..num_chars {
                        white_prefix = i;
                        if i == min_begin || !text.get(i).is_whitespace() {
                            break;
                        }
                    }
                    if *criterion == Criterion::Begin {
                        as_u16(min_end as i64 - white_prefix as i64)
                    } else {
                        let trim = text.trim_len().max(1) as i64;
                        let max = u16::MAX as i64;
                        as_u16(max - max * (max_end as i64 - white_prefix as i64) / trim)
                    }
                }
                Criterion::Begin | Criterion::End => u16::MAX,
            };
            points[3 - idx] = val;
        }

        Self { item, points, offsets }
    }

    pub fn index(&self) -> u32 {
        self.item.index()
    }

    /// Score reconstructed from the points, for display
    pub fn score(&self, tiebreak: &Tiebreak) -> Option<i32> {
        tiebreak
            .criteria()
            .iter()
            .position(|c| *c == Criterion::Score)
            .map(|idx| (u16::MAX - self.points[3 - idx]) as i32)
    }
}

/// Total order over results. `tac` reverses the final index key.
pub fn compare(a: &MatchResult, b: &MatchResult, tac: bool) -> Ordering {
    for idx in (0..4).rev() {
        match a.points[idx].cmp(&b.points[idx]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    if tac {
        b.index().cmp(&a.index())
    } else {
        a.index().cmp(&b.index())
    }
}
