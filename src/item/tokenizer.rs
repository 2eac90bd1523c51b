//! Field splitting and field-selection expressions.
//!
//! A line is split into tokens by a [`Delimiter`]. Each token keeps the
//! delimiter that follows it, so joining tokens reproduces the original text,
//! and records its character offset within the line so match positions can be
//! mapped back for highlighting.
//!
//! Field expressions (`--nth`, `--with-nth`, `{2..}` placeholders) are lists of
//! [`Range`]s: `N`, `N..`, `..N`, `N..M` and `..`, 1-based, negative values
//! counting from the end.

use crate::error::Error;
use crate::item::chars::Chars;
use regex::Regex;

/// Marker for an open end of a range (`..N`, `N..`).
const RANGE_ELLIPSIS: i32 = 0;

/// One field selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub begin: i32,
    pub end: i32,
}

impl Range {
    fn new(begin: i32, end: i32) -> Self {
        let begin = if begin == 1 { RANGE_ELLIPSIS } else { begin };
        let end = if end == -1 { RANGE_ELLIPSIS } else { end };
        Self { begin, end }
    }
}

/// A field together with its character offset in the source line
#[derive(Debug, Clone)]
pub struct Token {
    pub text: Chars,
    pub prefix_len: usize,
}

/// How a line is split into fields
#[derive(Debug, Clone, Default)]
pub enum Delimiter {
    /// AWK-style: runs of non-blank characters followed by blanks; leading
    /// blanks are skipped
    #[default]
    Awk,
    Str(String),
    Regex(Regex),
}

impl Delimiter {
    /// Plain strings are used verbatim; anything containing regex
    /// metacharacters is compiled as a pattern.
    pub fn parse(s: &str) -> Result<Self, Error> {
        // "\t" typed on the command line arrives as two characters
        let s = s.replace("\\t", "\t");
        if regex::escape(&s) == s {
            return Ok(Delimiter::Str(s));
        }
        Regex::new(&s)
            .map(Delimiter::Regex)
            .map_err(|e| Error::InvalidDelimiter(s.clone(), e))
    }

    pub fn is_awk(&self) -> bool {
        matches!(self, Delimiter::Awk)
    }
}

/// Parse a single range expression. Returns `None` for malformed input or a
/// zero index.
pub fn parse_range(s: &str) -> Option<Range> {
    if s == ".." {
        return Some(Range::new(RANGE_ELLIPSIS, RANGE_ELLIPSIS));
    }
    if let Some(rest) = s.strip_prefix("..") {
        let end: i32 = rest.parse().ok()?;
        return (end != 0).then(|| Range::new(RANGE_ELLIPSIS, end));
    }
    if let Some(rest) = s.strip_suffix("..") {
        let begin: i32 = rest.parse().ok()?;
        return (begin != 0).then(|| Range::new(begin, RANGE_ELLIPSIS));
    }
    if let Some((b, e)) = s.split_once("..") {
        let begin: i32 = b.parse().ok()?;
        let end: i32 = e.parse().ok()?;
        if begin == 0 || end == 0 {
            return None;
        }
        return Some(Range::new(begin, end));
    }
    let n: i32 = s.parse().ok()?;
    (n != 0).then(|| Range::new(n, n))
}

/// Parse a comma-separated field expression such as `1,3..`.
pub fn parse_ranges(expr: &str) -> Result<Vec<Range>, Error> {
    expr.split(',')
        .map(|part| parse_range(part).ok_or_else(|| Error::InvalidFieldExpr(expr.to_string())))
        .collect()
}

fn with_prefix_lengths(tokens: Vec<&str>, begin: usize) -> Vec<Token> {
    let mut prefix_len = begin;
    tokens
        .into_iter()
        .map(|s| {
            let text = Chars::from_text(s);
            let token = Token { text, prefix_len };
            prefix_len += token.text.len();
            token
        })
        .collect()
}

/// Split on blanks keeping the trailing blanks with each field.
/// Returns the fields and the number of leading blanks.
fn awk_tokenize(input: &str) -> (Vec<&str>, usize) {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut leading = 0;
    let mut begin: Option<usize> = None;
    let mut in_white = false;

    for (idx, &b) in bytes.iter().enumerate() {
        let white = b == b' ' || b == b'\t';
        match begin {
            None => {
                if white {
                    leading += 1;
                } else {
                    begin = Some(idx);
                }
            }
            Some(start) => {
                if white {
                    in_white = true;
                } else if in_white {
                    tokens.push(&input[start..idx]);
                    begin = Some(idx);
                    in_white = false;
                }
            }
        }
    }
    if let Some(start) = begin {
        tokens.push(&input[start..]);
    }
    (tokens, leading)
}

/// Split `text` into fields.
pub fn tokenize(text: &str, delimiter: &Delimiter) -> Vec<Token> {
    match delimiter {
        Delimiter::Awk => {
            let (tokens, leading) = awk_tokenize(text);
            with_prefix_lengths(tokens, leading)
        }
        Delimiter::Str(delim) => with_prefix_lengths(text.split_inclusive(delim.as_str()).collect(), 0),
        Delimiter::Regex(re) => {
            let mut tokens = Vec::new();
            let mut rest = text;
            while !rest.is_empty() {
                let end = match re.find(rest) {
                    Some(m) if m.end() > 0 => m.end(),
                    // Empty match at the start: consume one character
                    Some(_) => rest.chars().next().map_or(1, char::len_utf8),
                    None => rest.len(),
                };
                tokens.push(&rest[..end]);
                rest = &rest[end..];
            }
            with_prefix_lengths(tokens, 0)
        }
    }
}

/// Concatenate token texts.
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.to_string()).collect()
}

fn resolve(idx: i32, num_tokens: i32) -> i32 {
    if idx < 0 { idx + num_tokens + 1 } else { idx }
}

/// Apply field selectors to a token list. One output token per range.
pub fn transform(tokens: &[Token], ranges: &[Range]) -> Vec<Token> {
    let num_tokens = tokens.len() as i32;
    ranges
        .iter()
        .map(|r| {
            let mut parts: Vec<&Chars> = Vec::new();
            let mut min_idx = 0i32;
            let whole;

            if r.begin == r.end {
                if r.begin == RANGE_ELLIPSIS {
                    whole = Chars::from_text(&join_tokens(tokens));
                    parts.push(&whole);
                } else {
                    let idx = resolve(r.begin, num_tokens);
                    if (1..=num_tokens).contains(&idx) {
                        min_idx = idx - 1;
                        parts.push(&tokens[(idx - 1) as usize].text);
                    }
                }
            } else {
                let (begin, end) = if r.begin == RANGE_ELLIPSIS {
                    (1, resolve(r.end, num_tokens))
                } else if r.end == RANGE_ELLIPSIS {
                    (resolve(r.begin, num_tokens), num_tokens)
                } else {
                    (resolve(r.begin, num_tokens), resolve(r.end, num_tokens))
                };
                min_idx = (begin - 1).max(0);
                for idx in begin..=end {
                    if (1..=num_tokens).contains(&idx) {
                        parts.push(&tokens[(idx - 1) as usize].text);
                    }
                }
            }

            let text = match parts.as_slice() {
                [] => Chars::empty(),
                [one] => (*one).clone(),
                many => Chars::from_text(&many.iter().map(|c| c.to_string()).collect::<String>()),
            };
            let prefix_len = tokens
                .get(min_idx as usize)
                .map(|t| t.prefix_len)
                .unwrap_or(0);
            Token { text, prefix_len }
        })
        .collect()
}

/// Remove a trailing delimiter so that suffix matches (`foo$`) work on the last
/// selected field.
pub fn strip_last_delimiter(s: &str, delimiter: &Delimiter) -> String {
    match delimiter {
        Delimiter::Str(d) => s.strip_suffix(d.as_str()).unwrap_or(s).to_string(),
        Delimiter::Regex(re) => match re.find_iter(s).last() {
            Some(m) if m.end() == s.len() => s[..m.start()].to_string(),
            _ => s.to_string(),
        },
        Delimiter::Awk => s.trim_end_matches([' ', '\t']).to_string(),
    }
}
