//! Query compilation
//!
//! Extended syntax, one term per whitespace-separated token:
//!
//! | Token     | Match type                 |
//! |-----------|----------------------------|
//! | `sbtrkt`  | fuzzy                      |
//! | `'wild`   | whole text equals          |
//! | `'wild'`  | exact on word boundaries   |
//! | `^music`  | prefix                     |
//! | `.mp3$`   | suffix                     |
//! | `^x$`     | whole text equals          |
//! | `!fire`   | inverse exact              |
//! | `!'fire`  | inverse equal              |
//!
//! Terms separated by whitespace must all match; a standalone `|` separates
//! alternative groups, at least one of which must be fully satisfied. An
//! operator without payload (`!`, `^`, `'`) is taken literally. `\ ` is a
//! literal space.

use crate::item::candidate::Candidate;
use crate::item::chars::Chars;
use crate::item::tokenizer::{Delimiter, Range, Token, strip_last_delimiter, tokenize, transform};
use crate::matching::algo::{
    AlgoFn, AlgoMatch, FuzzyAlgo, Slab, equal_match, exact_match_boundary, exact_match_naive, prefix_match,
    suffix_match,
};
use crate::matching::normalize::{is_normalized, normalize_chars};
use crate::matching::scoring::ScoringWeights;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Case sensitivity of the whole query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    /// Sensitive only for terms containing an uppercase letter
    #[default]
    Smart,
    Ignore,
    Respect,
}

/// How a single term is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Fuzzy,
    Exact,
    ExactBoundary,
    Prefix,
    Suffix,
    Equal,
}

/// One compiled query term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub kind: TermKind,
    pub inverse: bool,
    pub text: Vec<char>,
    pub case_sensitive: bool,
    pub normalize: bool,
}

/// Terms that must all be satisfied
pub type TermSet = Vec<Term>;

/// Session-wide matching options. Fixed once the finder starts.
#[derive(Debug, Clone)]
pub struct PatternOptions {
    pub fuzzy: bool,
    pub algo: FuzzyAlgo,
    pub extended: bool,
    pub case: CaseMode,
    pub normalize: bool,
    /// Scan direction; backward when the `end` tie-break wins over `begin`
    pub forward: bool,
    pub nth: Vec<Range>,
    pub delimiter: Delimiter,
    pub weights: ScoringWeights,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            fuzzy: true,
            algo: FuzzyAlgo::V2,
            extended: true,
            case: CaseMode::Smart,
            normalize: true,
            forward: true,
            nth: Vec::new(),
            delimiter: Delimiter::Awk,
            weights: ScoringWeights::default(),
        }
    }
}

/// Outcome of matching one candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMatch {
    pub score: i32,
    /// Matched spans in character offsets of the display text
    pub offsets: Vec<(usize, usize)>,
    /// Individual matched characters; only filled when requested
    pub positions: Vec<usize>,
}

/// Compiled query
#[derive(Debug)]
pub struct Pattern {
    text: String,
    options: Arc<PatternOptions>,
    /// Alternatives; each is an AND-group
    groups: Vec<TermSet>,
    /// Non-extended mode: the whole query as one term
    basic: Option<Term>,
    sortable: bool,
}

impl Pattern {
    /// Compile `query`.
    pub fn parse(query: &str, options: Arc<PatternOptions>) -> Self {
        let text = if options.extended {
            trim_query(query)
        } else {
            query.to_string()
        };

        if options.extended {
            let groups = parse_terms(&text, &options);
            // Results of a query with only inverse terms are not ranked
            let sortable = groups.iter().flatten().any(|t| !t.inverse);
            Self {
                text,
                options,
                groups,
                basic: None,
                sortable,
            }
        } else {
            let kind = if options.fuzzy { TermKind::Fuzzy } else { TermKind::Exact };
            let basic = (!text.is_empty()).then(|| build_term(kind, false, &text, &options));
            Self {
                text,
                options,
                groups: Vec::new(),
                basic,
                sortable: true,
            }
        }
    }

    /// The effective query string
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.basic.is_none()
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn groups(&self) -> &[TermSet] {
        &self.groups
    }

    pub fn options(&self) -> &PatternOptions {
        &self.options
    }

    /// Match one candidate. Returns `None` when it does not satisfy the query.
    pub fn match_item(&self, item: &Candidate, with_pos: bool, slab: &mut Slab) -> Option<PatternMatch> {
        if self.is_empty() {
            return Some(PatternMatch::default());
        }
        let whole;
        let input: &[Token] = if self.options.nth.is_empty() {
            whole = [Token {
                text: item.text().clone(),
                prefix_len: 0,
            }];
            &whole
        } else {
            item.tokens_with(|text| self.transform_input(text))
        };

        if let Some(term) = &self.basic {
            let (offset, m) = self.iter_tokens(term, input, with_pos, slab)?;
            return Some(PatternMatch {
                score: m.score,
                offsets: vec![offset],
                positions: m.positions,
            });
        }

        let mut best: Option<PatternMatch> = None;
        for group in &self.groups {
            if let Some(m) = self.match_group(group, input, with_pos, slab) {
                if best.as_ref().is_none_or(|b| m.score > b.score) {
                    best = Some(m);
                }
            }
        }
        best
    }

    fn match_group(&self, group: &[Term], input: &[Token], with_pos: bool, slab: &mut Slab) -> Option<PatternMatch> {
        let mut result = PatternMatch::default();
        for term in group {
            let found = self.iter_tokens(term, input, with_pos, slab);
            match (found, term.inverse) {
                (Some(_), true) | (None, false) => return None,
                (None, true) => {}
                (Some((offset, m)), false) => {
                    result.score += m.score;
                    result.offsets.push(offset);
                    if with_pos {
                        if m.positions.is_empty() {
                            result.positions.extend(offset.0..offset.1);
                        } else {
                            result.positions.extend(m.positions);
                        }
                    }
                }
            }
        }
        result.offsets.sort_unstable();
        if with_pos {
            result.positions.sort_unstable();
            result.positions.dedup();
        }
        Some(result)
    }

    /// Try `term` against each token in turn; the first token that matches
    /// wins.
    fn iter_tokens(
        &self,
        term: &Term,
        input: &[Token],
        with_pos: bool,
        slab: &mut Slab,
    ) -> Option<((usize, usize), AlgoMatch)> {
        let algo = self.algo_for(term.kind);
        input.iter().find_map(|token| {
            let mut m = algo(
                term.case_sensitive,
                term.normalize,
                self.options.forward,
                &token.text,
                &term.text,
                with_pos,
                slab,
                &self.options.weights,
            )?;
            let offset = (m.start + token.prefix_len, m.end + token.prefix_len);
            m.positions.iter_mut().for_each(|p| *p += token.prefix_len);
            Some((offset, m))
        })
    }

    fn algo_for(&self, kind: TermKind) -> AlgoFn {
        match kind {
            TermKind::Fuzzy => self.options.algo.function(),
            TermKind::Exact => exact_match_naive,
            TermKind::ExactBoundary => exact_match_boundary,
            TermKind::Prefix => prefix_match,
            TermKind::Suffix => suffix_match,
            TermKind::Equal => equal_match,
        }
    }

    fn transform_input(&self, text: &Chars) -> Vec<Token> {
        let tokens = tokenize(&text.to_string(), &self.options.delimiter);
        let mut out = transform(&tokens, &self.options.nth);
        // Let suffix terms match the last selected field
        if let Some(last) = out.last_mut() {
            if !self.options.delimiter.is_awk() {
                let stripped = strip_last_delimiter(&last.text.to_string(), &self.options.delimiter);
                last.text = Chars::from_text(&stripped);
            }
        }
        out
    }
}

/// Drop leading spaces and unescaped trailing spaces.
fn trim_query(query: &str) -> String {
    let mut s = query.trim_start_matches(' ');
    while s.ends_with(' ') && !s.ends_with("\\ ") {
        s = &s[..s.len() - 1];
    }
    s.to_string()
}

fn build_term(kind: TermKind, inverse: bool, text: &str, options: &PatternOptions) -> Term {
    let lower = text.to_lowercase();
    let case_sensitive = match options.case {
        CaseMode::Respect => true,
        CaseMode::Ignore => false,
        CaseMode::Smart => lower != text,
    };
    // A term typed with accents must match them exactly
    let normalize = options.normalize && is_normalized(&lower);
    let chars: Vec<char> = if case_sensitive { text.chars().collect() } else { lower.chars().collect() };
    let chars = if normalize { normalize_chars(&chars) } else { chars };
    Term {
        kind,
        inverse,
        text: chars,
        case_sensitive,
        normalize,
    }
}

/// Parse one token into (kind, inverse, payload). Operators with an empty
/// payload make the whole token literal.
fn parse_token<'a>(token: &'a str, fuzzy: bool) -> (TermKind, bool, &'a str) {
    let default_kind = if fuzzy { TermKind::Fuzzy } else { TermKind::Exact };
    let mut kind = default_kind;
    let mut inverse = false;
    let mut text = token;

    if let Some(rest) = text.strip_prefix('!') {
        inverse = true;
        kind = TermKind::Exact;
        text = rest;
    }

    if text != "$" {
        if let Some(rest) = text.strip_suffix('$') {
            kind = TermKind::Suffix;
            text = rest;
        }
    }

    if text.chars().count() > 2 && text.starts_with('\'') && text.ends_with('\'') {
        kind = TermKind::ExactBoundary;
        text = &text[1..text.len() - 1];
    } else if let Some(rest) = text.strip_prefix('\'') {
        // The whole text, so a trailing `$` adds nothing
        kind = TermKind::Equal;
        text = rest;
    } else if let Some(rest) = text.strip_prefix('^') {
        kind = if kind == TermKind::Suffix { TermKind::Equal } else { TermKind::Prefix };
        text = rest;
    }

    if text.is_empty() {
        (default_kind, false, token)
    } else {
        (kind, inverse, text)
    }
}

/// Split on unescaped spaces; `\\ ` becomes a literal space of its token.
fn split_tokens(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut chars = query.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&' ') => {
                chars.next();
                token.push(' ');
            }
            ' ' => {
                if !token.is_empty() {
                    tokens.push(std::mem::take(&mut token));
                }
            }
            c => token.push(c),
        }
    }
    if !token.is_empty() {
        tokens.push(token);
    }
    tokens
}

fn parse_terms(query: &str, options: &PatternOptions) -> Vec<TermSet> {
    let mut groups = Vec::new();
    let mut group: TermSet = Vec::new();
    let mut after_bar = false;

    for token in split_tokens(query) {
        if token == "|" && !group.is_empty() && !after_bar {
            groups.push(std::mem::take(&mut group));
            after_bar = true;
            continue;
        }
        after_bar = false;

        let (kind, inverse, text) = parse_token(&token, options.fuzzy);
        group.push(build_term(kind, inverse, text, options));
    }
    if !group.is_empty() {
        groups.push(group);
    }
    groups
}

/// Upper bound on cached compiled patterns
const PATTERN_CACHE_MAX: usize = 1024;

/// Compiles queries, reusing earlier compilations of the same string.
pub struct PatternBuilder {
    options: Arc<PatternOptions>,
    cache: FxHashMap<String, Arc<Pattern>>,
}

impl PatternBuilder {
    pub fn new(options: PatternOptions) -> Self {
        Self {
            options: Arc::new(options),
            cache: FxHashMap::default(),
        }
    }

    pub fn options(&self) -> &Arc<PatternOptions> {
        &self.options
    }

    pub fn build(&mut self, query: &str) -> Arc<Pattern> {
        if let Some(p) = self.cache.get(query) {
            return Arc::clone(p);
        }
        if self.cache.len() >= PATTERN_CACHE_MAX {
            self.cache.clear();
        }
        let pattern = Arc::new(Pattern::parse(query, Arc::clone(&self.options)));
        self.cache.insert(query.to_string(), Arc::clone(&pattern));
        pattern
    }
}
