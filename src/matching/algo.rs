//! Match algorithms
//!
//! Every algorithm has the same shape: given the case and normalization
//! modes, a scan direction, the candidate text and the pattern, it returns the
//! matched span and a score, or `None` when the pattern does not occur.
//!
//! Two assumptions hold for all of them:
//! 1. `pattern` is already lowercase when `case_sensitive` is false
//! 2. `pattern` is already normalized when `normalize` is true
//!
//! The fuzzy matcher ([`fuzzy_match_v2`]) is a modified Smith-Waterman that
//! finds the best-scoring alignment. Because it is O(nm) it falls back to the
//! greedy [`fuzzy_match_v1`] when the score matrix would not fit the worker's
//! [`Slab`].

use crate::item::chars::Chars;
use crate::matching::normalize::normalize_char;
use crate::matching::scoring::{CharClass, ScoringWeights};
use memchr::memchr;
use std::str::FromStr;

/// Maximum number of score-matrix cells a slab holds
pub const SLAB_CELLS: usize = 100 * 1024;

/// Span and score of one match
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlgoMatch {
    pub start: usize,
    pub end: usize,
    pub score: i32,
    /// Matched character positions in ascending order. Only filled when
    /// positions were requested and the algorithm is not contiguous.
    pub positions: Vec<usize>,
}

impl AlgoMatch {
    fn span(start: usize, end: usize, score: i32) -> Self {
        Self {
            start,
            end,
            score,
            positions: Vec::new(),
        }
    }
}

/// Per-worker scratch space reused across candidates
#[derive(Debug)]
pub struct Slab {
    capacity: usize,
    h0: Vec<i16>,
    c0: Vec<i16>,
    bonus: Vec<i16>,
    first: Vec<usize>,
    text: Vec<char>,
    h: Vec<i16>,
    c: Vec<i16>,
}

impl Default for Slab {
    fn default() -> Self {
        Self::with_capacity(SLAB_CELLS)
    }
}

impl Slab {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            h0: Vec::new(),
            c0: Vec::new(),
            bonus: Vec::new(),
            first: Vec::new(),
            text: Vec::new(),
            h: Vec::new(),
            c: Vec::new(),
        }
    }
}

fn reset<T: Copy + Default>(buf: &mut Vec<T>, len: usize) {
    buf.clear();
    buf.resize(len, T::default());
}

/// Common signature of all match algorithms
pub type AlgoFn = fn(
    case_sensitive: bool,
    normalize: bool,
    forward: bool,
    text: &Chars,
    pattern: &[char],
    with_pos: bool,
    slab: &mut Slab,
    weights: &ScoringWeights,
) -> Option<AlgoMatch>;

/// Fuzzy algorithm selected with `--algo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuzzyAlgo {
    /// Greedy scan, faster but not optimal
    V1,
    /// Optimal alignment
    #[default]
    V2,
}

impl FuzzyAlgo {
    pub fn function(self) -> AlgoFn {
        match self {
            FuzzyAlgo::V1 => fuzzy_match_v1,
            FuzzyAlgo::V2 => fuzzy_match_v2,
        }
    }
}

impl FromStr for FuzzyAlgo {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(FuzzyAlgo::V1),
            "v2" => Ok(FuzzyAlgo::V2),
            other => Err(crate::error::Error::InvalidAlgorithm(other.to_string())),
        }
    }
}

#[inline]
fn index_at(index: usize, max: usize, forward: bool) -> usize {
    if forward { index } else { max - index - 1 }
}

/// Lowercase a single character, keeping it when the lowercase form expands
#[inline]
pub fn to_lower(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

#[inline]
fn fold(c: char, case_sensitive: bool, normalize: bool) -> char {
    let c = if case_sensitive { c } else { to_lower(c) };
    if normalize { normalize_char(c) } else { c }
}

fn bonus_at(text: &Chars, idx: usize, w: &ScoringWeights) -> i16 {
    if idx == 0 {
        return w.bonus_boundary;
    }
    w.bonus_for(CharClass::of(text.get(idx - 1)), CharClass::of(text.get(idx)))
}

/// Find `b` in `bytes[from..]`. When case-insensitive an earlier uppercase
/// occurrence wins.
fn try_skip(bytes: &[u8], case_sensitive: bool, b: u8, from: usize) -> Option<usize> {
    let slice = bytes.get(from..)?;
    let mut idx = memchr(b, slice);
    if idx == Some(0) {
        return Some(from);
    }
    if !case_sensitive && b.is_ascii_lowercase() {
        let scope = match idx {
            Some(i) => &slice[..i],
            None => slice,
        };
        if let Some(upper) = memchr(b - 32, scope) {
            idx = Some(upper);
        }
    }
    idx.map(|i| from + i)
}

/// Quick rejection for ASCII text. Returns `None` when the pattern cannot
/// occur, otherwise the index one before the first pattern character (so the
/// bonus of that character can still be computed), or 0 for non-ASCII text.
fn ascii_fuzzy_index(text: &Chars, pattern: &[char], case_sensitive: bool) -> Option<usize> {
    let Some(bytes) = text.as_ascii() else {
        return Some(0);
    };
    if !pattern.iter().all(char::is_ascii) {
        return None;
    }

    let mut first = 0;
    let mut idx = 0;
    for (pidx, &p) in pattern.iter().enumerate() {
        idx = try_skip(bytes, case_sensitive, p as u8, idx)?;
        if pidx == 0 && idx > 0 {
            first = idx - 1;
        }
        idx += 1;
    }
    Some(first)
}

/// Optimal fuzzy match.
pub fn fuzzy_match_v2(
    case_sensitive: bool,
    normalize: bool,
    forward: bool,
    input: &Chars,
    pattern: &[char],
    with_pos: bool,
    slab: &mut Slab,
    w: &ScoringWeights,
) -> Option<AlgoMatch> {
    let m = pattern.len();
    if m == 0 {
        return Some(AlgoMatch::default());
    }
    let n = input.len();
    if n * m > slab.capacity {
        return fuzzy_match_v1(case_sensitive, normalize, forward, input, pattern, with_pos, slab, w);
    }

    // Phase 1: reject early for ASCII input
    let idx = ascii_fuzzy_index(input, pattern, case_sensitive)?;

    let Slab {
        h0,
        c0,
        bonus: b,
        first: f,
        text: t,
        h,
        c,
        ..
    } = slab;
    reset(h0, n);
    reset(c0, n);
    reset(b, n);
    reset(f, m);
    input.copy_into(t);

    // Phase 2: per-position bonus, first occurrence of each pattern char and
    // the first row of the score matrix
    let mut max_score: i16 = 0;
    let mut max_score_pos = 0;
    let mut pidx = 0;
    let mut last_idx = 0;
    let pchar0 = pattern[0];
    let mut pchar = pattern[0];
    let mut prev_h0: i16 = 0;
    let mut prev_class = CharClass::NonWord;
    let mut in_gap = false;

    for off in idx..n {
        let mut ch = t[off];
        let class = if ch.is_ascii() {
            let class = CharClass::of_ascii(ch);
            if !case_sensitive && class == CharClass::Upper {
                ch = ch.to_ascii_lowercase();
            }
            class
        } else {
            let class = CharClass::of_non_ascii(ch);
            if !case_sensitive && class == CharClass::Upper {
                ch = to_lower(ch);
            }
            if normalize {
                ch = normalize_char(ch);
            }
            class
        };

        t[off] = ch;
        let bonus = w.bonus_for(prev_class, class);
        b[off] = bonus;
        prev_class = class;

        if ch == pchar {
            if pidx < m {
                f[pidx] = off;
                pidx += 1;
                pchar = pattern[pidx.min(m - 1)];
            }
            last_idx = off;
        }

        if ch == pchar0 {
            let score = w.score_match + bonus * w.first_char_multiplier;
            h0[off] = score;
            c0[off] = 1;
            if m == 1 && ((forward && score > max_score) || (!forward && score >= max_score)) {
                max_score = score;
                max_score_pos = off;
                if forward && bonus == w.bonus_boundary {
                    break;
                }
            }
            in_gap = false;
        } else {
            let penalty = if in_gap { w.gap_extension } else { w.gap_start };
            h0[off] = (prev_h0 + penalty).max(0);
            c0[off] = 0;
            in_gap = true;
        }
        prev_h0 = h0[off];
    }

    if pidx != m {
        return None;
    }
    if m == 1 {
        let mut result = AlgoMatch::span(max_score_pos, max_score_pos + 1, max_score as i32);
        if with_pos {
            result.positions.push(max_score_pos);
        }
        return Some(result);
    }

    // Phase 3: fill the score matrix. Omission is not allowed, so every row
    // starts at the first occurrence of its pattern character.
    let f0 = f[0];
    let width = last_idx - f0 + 1;
    reset(h, width * m);
    h[..width].copy_from_slice(&h0[f0..=last_idx]);
    reset(c, width * m);
    c[..width].copy_from_slice(&c0[f0..=last_idx]);

    for (pidx, &pchar) in pattern.iter().enumerate().skip(1) {
        let fi = f[pidx];
        let row = pidx * width;
        let mut in_gap = false;
        h[row + fi - f0 - 1] = 0;

        for col in fi..=last_idx {
            let j0 = col - f0;
            let mut s1: i16 = 0;
            let mut consecutive: i16 = 0;
            let penalty = if in_gap { w.gap_extension } else { w.gap_start };
            let s2 = h[row + j0 - 1] + penalty;

            if pchar == t[col] {
                s1 = h[row - width + j0 - 1] + w.score_match;
                let mut bonus = b[col];
                consecutive = c[row - width + j0 - 1] + 1;
                if bonus == w.bonus_boundary {
                    // A boundary starts a new chunk
                    consecutive = 1;
                } else if consecutive > 1 {
                    let chunk_start = b[col + 1 - consecutive as usize];
                    bonus = bonus.max(w.bonus_consecutive.max(chunk_start));
                }
                if s1 + bonus < s2 {
                    s1 += b[col];
                    consecutive = 0;
                } else {
                    s1 += bonus;
                }
            }
            c[row + j0] = consecutive;

            in_gap = s1 < s2;
            let score = s1.max(s2).max(0);
            if pidx == m - 1 && ((forward && score > max_score) || (!forward && score >= max_score)) {
                max_score = score;
                max_score_pos = col;
            }
            h[row + j0] = score;
        }
    }

    // Phase 4: backtrace for positions
    let mut positions = Vec::new();
    let mut j = f0;
    if with_pos {
        positions.reserve(m);
        let mut i = m - 1;
        j = max_score_pos;
        let mut prefer_match = true;
        loop {
            let row = i * width;
            let j0 = j - f0;
            let s = h[row + j0];

            let s1 = if i > 0 && j >= f[i] { h[row - width + j0 - 1] } else { 0 };
            let s2 = if j > f[i] { h[row + j0 - 1] } else { 0 };

            if s > s1 && (s > s2 || (s == s2 && prefer_match)) {
                positions.push(j);
                if i == 0 {
                    break;
                }
                i -= 1;
            }
            prefer_match = c[row + j0] > 1 || (row + width + j0 + 1 < c.len() && c[row + width + j0 + 1] > 0);
            j -= 1;
        }
        positions.reverse();
    }

    // Without positions the start is only an approximation; it matters for
    // the `begin` tie-break alone.
    Some(AlgoMatch {
        start: j,
        end: max_score_pos + 1,
        score: max_score as i32,
        positions,
    })
}

/// Score `text[sidx..eidx]` with the same criteria as [`fuzzy_match_v2`].
fn calculate_score(
    case_sensitive: bool,
    normalize: bool,
    text: &Chars,
    pattern: &[char],
    sidx: usize,
    eidx: usize,
    with_pos: bool,
    w: &ScoringWeights,
) -> (i32, Vec<usize>) {
    let mut pidx = 0;
    let mut score: i32 = 0;
    let mut in_gap = false;
    let mut consecutive = 0;
    let mut first_bonus: i16 = 0;
    let mut positions = if with_pos { Vec::with_capacity(pattern.len()) } else { Vec::new() };
    let mut prev_class = if sidx > 0 {
        CharClass::of(text.get(sidx - 1))
    } else {
        CharClass::NonWord
    };

    for idx in sidx..eidx {
        let raw = text.get(idx);
        let class = CharClass::of(raw);
        let ch = fold(raw, case_sensitive, normalize);

        if pidx < pattern.len() && ch == pattern[pidx] {
            if with_pos {
                positions.push(idx);
            }
            score += w.score_match as i32;
            let mut bonus = w.bonus_for(prev_class, class);
            if consecutive == 0 {
                first_bonus = bonus;
            } else {
                if bonus == w.bonus_boundary {
                    first_bonus = bonus;
                }
                bonus = bonus.max(first_bonus).max(w.bonus_consecutive);
            }
            if pidx == 0 {
                score += (bonus * w.first_char_multiplier) as i32;
            } else {
                score += bonus as i32;
            }
            in_gap = false;
            consecutive += 1;
            pidx += 1;
        } else {
            let penalty = if in_gap { w.gap_extension } else { w.gap_start };
            score += penalty as i32;
            in_gap = true;
            consecutive = 0;
            first_bonus = 0;
        }
        prev_class = class;
    }
    (score, positions)
}

/// Greedy fuzzy match: find the first occurrence scanning in `forward`
/// direction, then shrink the span scanning back.
pub fn fuzzy_match_v1(
    case_sensitive: bool,
    normalize: bool,
    forward: bool,
    text: &Chars,
    pattern: &[char],
    with_pos: bool,
    _slab: &mut Slab,
    w: &ScoringWeights,
) -> Option<AlgoMatch> {
    if pattern.is_empty() {
        return Some(AlgoMatch::default());
    }
    ascii_fuzzy_index(text, pattern, case_sensitive)?;

    let len = text.len();
    let plen = pattern.len();
    let mut pidx = 0;
    let mut sidx = None;
    let mut eidx = None;

    for index in 0..len {
        let ch = fold(text.get(index_at(index, len, forward)), case_sensitive, normalize);
        if ch == pattern[index_at(pidx, plen, forward)] {
            if sidx.is_none() {
                sidx = Some(index);
            }
            pidx += 1;
            if pidx == plen {
                eidx = Some(index + 1);
                break;
            }
        }
    }

    let (Some(mut sidx), Some(mut eidx)) = (sidx, eidx) else {
        return None;
    };

    let mut pidx = plen - 1;
    for index in (sidx..eidx).rev() {
        let ch = fold(text.get(index_at(index, len, forward)), case_sensitive, normalize);
        if ch == pattern[index_at(pidx, plen, forward)] {
            if pidx == 0 {
                sidx = index;
                break;
            }
            pidx -= 1;
        }
    }

    if !forward {
        (sidx, eidx) = (len - eidx, len - sidx);
    }

    let (score, positions) = calculate_score(case_sensitive, normalize, text, pattern, sidx, eidx, with_pos, w);
    Some(AlgoMatch {
        start: sidx,
        end: eidx,
        score,
        positions,
    })
}

fn is_word_boundary_span(text: &Chars, sidx: usize, eidx: usize) -> bool {
    let before = sidx == 0 || CharClass::of(text.get(sidx - 1)) == CharClass::NonWord;
    let after = eidx == text.len() || CharClass::of(text.get(eidx)) == CharClass::NonWord;
    before && after
}

fn exact_match(
    case_sensitive: bool,
    normalize: bool,
    forward: bool,
    text: &Chars,
    pattern: &[char],
    boundary: bool,
    w: &ScoringWeights,
) -> Option<AlgoMatch> {
    if pattern.is_empty() {
        return Some(AlgoMatch::default());
    }
    let len = text.len();
    let plen = pattern.len();
    if len < plen {
        return None;
    }
    ascii_fuzzy_index(text, pattern, case_sensitive)?;

    let span_of = |pos: usize| -> (usize, usize) {
        if forward {
            (pos + 1 - plen, pos + 1)
        } else {
            (len - (pos + 1), len - (pos + 1) + plen)
        }
    };

    // Only the bonus of the first character is compared
    let mut pidx = 0;
    let mut best: Option<usize> = None;
    let mut bonus: i16 = 0;
    let mut best_bonus: i16 = -1;
    let mut index: isize = 0;
    while (index as usize) < len {
        let i = index as usize;
        let tidx = index_at(i, len, forward);
        let ch = fold(text.get(tidx), case_sensitive, normalize);
        let ppos = index_at(pidx, plen, forward);
        if pattern[ppos] == ch {
            if ppos == 0 {
                bonus = bonus_at(text, tidx, w);
            }
            pidx += 1;
            if pidx == plen {
                let (s, e) = span_of(i);
                if bonus > best_bonus && (!boundary || is_word_boundary_span(text, s, e)) {
                    best = Some(i);
                    best_bonus = bonus;
                }
                if bonus == w.bonus_boundary && best == Some(i) {
                    break;
                }
                index -= pidx as isize - 1;
                pidx = 0;
                bonus = 0;
            }
        } else {
            index -= pidx as isize;
            pidx = 0;
            bonus = 0;
        }
        index += 1;
    }

    let pos = best?;
    let (sidx, eidx) = span_of(pos);
    let (score, _) = calculate_score(case_sensitive, normalize, text, pattern, sidx, eidx, false, w);
    Some(AlgoMatch::span(sidx, eidx, score))
}

/// Contiguous substring match preferring the occurrence with the best
/// first-character bonus.
pub fn exact_match_naive(
    case_sensitive: bool,
    normalize: bool,
    forward: bool,
    text: &Chars,
    pattern: &[char],
    _with_pos: bool,
    _slab: &mut Slab,
    w: &ScoringWeights,
) -> Option<AlgoMatch> {
    exact_match(case_sensitive, normalize, forward, text, pattern, false, w)
}

/// Contiguous substring match whose both ends sit on word boundaries.
pub fn exact_match_boundary(
    case_sensitive: bool,
    normalize: bool,
    forward: bool,
    text: &Chars,
    pattern: &[char],
    _with_pos: bool,
    _slab: &mut Slab,
    w: &ScoringWeights,
) -> Option<AlgoMatch> {
    exact_match(case_sensitive, normalize, forward, text, pattern, true, w)
}

/// Pattern at the start of the text. Leading whitespace of the text is
/// skipped unless the pattern itself starts with whitespace.
pub fn prefix_match(
    case_sensitive: bool,
    normalize: bool,
    _forward: bool,
    text: &Chars,
    pattern: &[char],
    _with_pos: bool,
    _slab: &mut Slab,
    w: &ScoringWeights,
) -> Option<AlgoMatch> {
    if pattern.is_empty() {
        return Some(AlgoMatch::default());
    }
    let trimmed = if pattern[0].is_whitespace() {
        0
    } else {
        text.leading_whitespaces()
    };
    let plen = pattern.len();
    if text.len() - trimmed < plen {
        return None;
    }

    for (i, &p) in pattern.iter().enumerate() {
        if fold(text.get(trimmed + i), case_sensitive, normalize) != p {
            return None;
        }
    }
    let (score, _) = calculate_score(case_sensitive, normalize, text, pattern, trimmed, trimmed + plen, false, w);
    Some(AlgoMatch::span(trimmed, trimmed + plen, score))
}

/// Pattern at the end of the text. Trailing whitespace of the text is
/// skipped unless the pattern itself ends with whitespace.
pub fn suffix_match(
    case_sensitive: bool,
    normalize: bool,
    _forward: bool,
    text: &Chars,
    pattern: &[char],
    _with_pos: bool,
    _slab: &mut Slab,
    w: &ScoringWeights,
) -> Option<AlgoMatch> {
    let len = text.len();
    let trailing = match pattern.last() {
        Some(p) if p.is_whitespace() => 0,
        _ => text.trailing_whitespaces(),
    };
    let trimmed_len = len - trailing;
    if pattern.is_empty() {
        return Some(AlgoMatch::span(trimmed_len, trimmed_len, 0));
    }
    let plen = pattern.len();
    let diff = trimmed_len.checked_sub(plen)?;

    for (i, &p) in pattern.iter().enumerate() {
        if fold(text.get(diff + i), case_sensitive, normalize) != p {
            return None;
        }
    }
    let (score, _) = calculate_score(case_sensitive, normalize, text, pattern, diff, trimmed_len, false, w);
    Some(AlgoMatch::span(diff, trimmed_len, score))
}

/// Whole text equals the pattern, ignoring surrounding whitespace the
/// pattern does not ask for.
pub fn equal_match(
    case_sensitive: bool,
    normalize: bool,
    _forward: bool,
    text: &Chars,
    pattern: &[char],
    _with_pos: bool,
    _slab: &mut Slab,
    w: &ScoringWeights,
) -> Option<AlgoMatch> {
    let plen = pattern.len();
    let leading = match pattern.first() {
        Some(p) if p.is_whitespace() => 0,
        _ => text.leading_whitespaces(),
    };
    let trailing = match pattern.last() {
        Some(p) if p.is_whitespace() => 0,
        _ => text.trailing_whitespaces(),
    };
    let len = text.len();
    if leading == len {
        // All whitespace
        return (plen == 0).then(|| AlgoMatch::span(0, 0, 0));
    }
    if len - leading - trailing != plen {
        return None;
    }

    let matched = pattern
        .iter()
        .enumerate()
        .all(|(i, &p)| fold(text.get(leading + i), case_sensitive, normalize) == p);
    if !matched {
        return None;
    }
    let plen_score = plen as i32;
    let score = (w.score_match + w.bonus_boundary) as i32 * plen_score
        + (w.first_char_multiplier - 1) as i32 * w.bonus_boundary as i32;
    Some(AlgoMatch::span(leading, leading + plen, score))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FUZZY: [AlgoFn; 2] = [fuzzy_match_v1, fuzzy_match_v2];

    fn run(
        algo: AlgoFn,
        case_sensitive: bool,
        normalize: bool,
        forward: bool,
        input: &str,
        pattern: &str,
    ) -> Option<(usize, usize, i32)> {
        let pattern: Vec<char> = if case_sensitive {
            pattern.chars().collect()
        } else {
            pattern.to_lowercase().chars().collect()
        };
        let pattern = if normalize {
            crate::matching::normalize::normalize_chars(&pattern)
        } else {
            pattern
        };
        let text = Chars::from_text(input);
        let mut slab = Slab::default();
        let w = ScoringWeights::default();
        algo(case_sensitive, normalize, forward, &text, &pattern, true, &mut slab, &w).map(|m| {
            if m.positions.is_empty() {
                (m.start, m.end, m.score)
            } else {
                (m.positions[0], m.positions[m.positions.len() - 1] + 1, m.score)
            }
        })
    }

    fn assert_match(algo: AlgoFn, cs: bool, fwd: bool, input: &str, pattern: &str, expected: Option<(usize, usize, i32)>) {
        assert_eq!(run(algo, cs, false, fwd, input, pattern), expected, "{:?} / {:?}", input, pattern);
    }

    const W: ScoringWeights = ScoringWeights {
        score_match: 16,
        gap_start: -3,
        gap_extension: -1,
        bonus_boundary: 8,
        bonus_non_word: 8,
        bonus_camel123: 7,
        bonus_consecutive: 4,
        first_char_multiplier: 2,
    };

    fn s(v: i16) -> i32 {
        v as i32
    }

    #[test]
    fn test_fuzzy_match() {
        for algo in ALL_FUZZY {
            for fwd in [true, false] {
                assert_match(
                    algo,
                    false,
                    fwd,
                    "fooBarbaz1",
                    "oBZ",
                    Some((2, 9, s(W.score_match * 3 + W.bonus_camel123 + W.gap_start + W.gap_extension * 3))),
                );
                assert_match(
                    algo,
                    false,
                    fwd,
                    "foo bar baz",
                    "fbb",
                    Some((
                        0,
                        9,
                        s(W.score_match * 3
                            + W.bonus_boundary * W.first_char_multiplier
                            + W.bonus_boundary * 2
                            + 2 * W.gap_start
                            + 4 * W.gap_extension),
                    )),
                );
                assert_match(
                    algo,
                    false,
                    fwd,
                    "/AutomatorDocument.icns",
                    "rdoc",
                    Some((9, 13, s(W.score_match * 4 + W.bonus_camel123 + W.bonus_consecutive * 2))),
                );
                assert_match(algo, true, fwd, "foo-bar", "o-ba", Some((2, 6, s(W.score_match * 4 + W.bonus_boundary * 3))));
            }
        }
    }

    #[test]
    fn test_fuzzy_non_match() {
        for algo in ALL_FUZZY {
            for fwd in [true, false] {
                assert_match(algo, true, fwd, "fooBarbaz", "oBZ", None);
                assert_match(algo, true, fwd, "Foo Bar Baz", "fbb", None);
                assert_match(algo, true, fwd, "fooBarbaz", "fooBarbazz", None);
            }
        }
    }

    #[test]
    fn test_fuzzy_match_backward() {
        let fwd = run(fuzzy_match_v1, false, false, true, "foobar fb", "fb").unwrap();
        assert_eq!((fwd.0, fwd.1), (0, 4));
        let back = run(fuzzy_match_v1, false, false, false, "foobar fb", "fb").unwrap();
        assert_eq!((back.0, back.1), (7, 9));
        assert!(back.2 > fwd.2);
    }

    #[test]
    fn test_exact_match_naive() {
        for fwd in [true, false] {
            assert_match(exact_match_naive, true, fwd, "fooBarbaz", "oBA", None);
            assert_match(exact_match_naive, true, fwd, "fooBarbaz", "fooBarbazz", None);
            assert_match(
                exact_match_naive,
                false,
                fwd,
                "fooBarbaz",
                "oBA",
                Some((2, 5, s(W.score_match * 3 + W.bonus_camel123 + W.bonus_consecutive))),
            );
            assert_match(
                exact_match_naive,
                false,
                fwd,
                "/AutomatorDocument.icns",
                "rdoc",
                Some((9, 13, s(W.score_match * 4 + W.bonus_camel123 + W.bonus_consecutive * 2))),
            );
        }
    }

    #[test]
    fn test_exact_match_naive_backward() {
        let score = s(W.score_match * 2 + W.bonus_consecutive);
        assert_match(exact_match_naive, false, true, "foobar foob", "oo", Some((1, 3, score)));
        assert_match(exact_match_naive, false, false, "foobar foob", "oo", Some((8, 10, score)));
    }

    #[test]
    fn test_exact_match_boundary() {
        assert!(run(exact_match_boundary, false, false, true, "foobar", "foo").is_none());
        assert!(run(exact_match_boundary, false, false, true, "xfoo bar", "foo").is_none());
        assert_eq!(run(exact_match_boundary, false, false, true, "foo bar", "foo").map(|r| (r.0, r.1)), Some((0, 3)));
        // Skips the occurrence inside a word
        assert_eq!(run(exact_match_boundary, false, false, true, "foobar foo", "foo").map(|r| (r.0, r.1)), Some((7, 10)));
    }

    #[test]
    fn test_prefix_match() {
        let score = s(W.score_match * 3 + W.bonus_boundary * W.first_char_multiplier + W.bonus_boundary * 2);
        for fwd in [true, false] {
            assert_match(prefix_match, true, fwd, "fooBarbaz", "Foo", None);
            assert_match(prefix_match, false, fwd, "fooBarBaz", "baz", None);
            assert_match(prefix_match, false, fwd, "fooBarbaz", "Foo", Some((0, 3, score)));
            assert_match(prefix_match, false, fwd, "foOBarBaZ", "foo", Some((0, 3, score)));
            assert_match(prefix_match, false, fwd, "f-oBarbaz", "f-o", Some((0, 3, score)));
            assert_match(prefix_match, false, fwd, " fooBar", "foo", Some((1, 4, score)));
            assert_match(prefix_match, false, fwd, " fooBar", " fo", Some((0, 3, score)));
            assert_match(prefix_match, false, fwd, "     fo", "foo", None);
        }
    }

    #[test]
    fn test_suffix_match() {
        for fwd in [true, false] {
            assert_match(suffix_match, true, fwd, "fooBarbaz", "Baz", None);
            assert_match(suffix_match, false, fwd, "fooBarbaz", "Foo", None);
            assert_match(
                suffix_match,
                false,
                fwd,
                "fooBarbaz",
                "baz",
                Some((6, 9, s(W.score_match * 3 + W.bonus_consecutive * 2))),
            );
            assert_match(
                suffix_match,
                false,
                fwd,
                "fooBarbaz ",
                "baz",
                Some((6, 9, s(W.score_match * 3 + W.bonus_consecutive * 2))),
            );
            assert_match(
                suffix_match,
                false,
                fwd,
                "fooBarbaz ",
                "baz ",
                Some((6, 10, s(W.score_match * 4 + W.bonus_consecutive * 2 + W.bonus_non_word))),
            );
        }
    }

    #[test]
    fn test_equal_match() {
        assert!(run(equal_match, false, false, true, "foo", "foo").is_some());
        assert!(run(equal_match, false, false, true, "  foo ", "foo").is_some());
        assert!(run(equal_match, false, false, true, "foobar", "foo").is_none());
        assert!(run(equal_match, true, false, true, "Foo", "foo").is_none());
    }

    #[test]
    fn test_empty_pattern() {
        for fwd in [true, false] {
            assert_match(fuzzy_match_v1, true, fwd, "foobar", "", Some((0, 0, 0)));
            assert_match(fuzzy_match_v2, true, fwd, "foobar", "", Some((0, 0, 0)));
            assert_match(exact_match_naive, true, fwd, "foobar", "", Some((0, 0, 0)));
            assert_match(prefix_match, true, fwd, "foobar", "", Some((0, 0, 0)));
            assert_match(suffix_match, true, fwd, "foobar", "", Some((6, 6, 0)));
        }
    }

    #[test]
    fn test_normalize() {
        let algos: [AlgoFn; 4] = [fuzzy_match_v1, fuzzy_match_v2, prefix_match, exact_match_naive];
        for algo in algos {
            assert_eq!(run(algo, false, true, true, "Só Danço Samba", "So"), Some((0, 2, 56)));
        }
        let all: [AlgoFn; 6] = [fuzzy_match_v1, fuzzy_match_v2, prefix_match, suffix_match, exact_match_naive, equal_match];
        for algo in all {
            assert_eq!(run(algo, false, true, true, "Danço", "danco"), Some((0, 5, 128)));
        }
        // Without normalization the accent must be typed
        assert_eq!(run(fuzzy_match_v2, false, false, true, "Danço", "danco"), None);
    }

    #[test]
    fn test_long_string_falls_back_to_v1() {
        let mut input = vec![b'x'; u16::MAX as usize * 2];
        input[u16::MAX as usize] = b'z';
        let input = String::from_utf8(input).unwrap();
        let start = u16::MAX as usize;
        assert_eq!(
            run(fuzzy_match_v2, true, false, true, &input, "zx"),
            Some((start, start + 2, s(W.score_match * 2 + W.bonus_consecutive)))
        );
    }

    #[test]
    fn test_v2_positions_ascending() {
        let text = Chars::from_text("src/matching/algo.rs");
        let pattern: Vec<char> = "mar".chars().collect();
        let mut slab = Slab::default();
        let m = fuzzy_match_v2(false, false, true, &text, &pattern, true, &mut slab, &W).unwrap();
        assert_eq!(m.positions.len(), 3);
        assert!(m.positions.windows(2).all(|p| p[0] < p[1]));
        assert_eq!(text.get(m.positions[0]), 'm');
    }

    #[test]
    fn test_fuzzy_algo_from_str() {
        assert_eq!("v1".parse::<FuzzyAlgo>().unwrap(), FuzzyAlgo::V1);
        assert_eq!("v2".parse::<FuzzyAlgo>().unwrap(), FuzzyAlgo::V2);
        assert!("v3".parse::<FuzzyAlgo>().is_err());
    }
}
