use crate::item::chars::Chars;
use crate::item::tokenizer::Token;
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

/// One input line.
///
/// Created once by the reader and never mutated afterwards. `raw` is what gets
/// printed on selection; `text` is what is displayed and matched (they differ
/// only when `--with-nth` rewrites the display). Field tokens for `--nth` are
/// computed on first use and cached.
#[derive(Debug, Clone)]
pub struct Candidate {
    index: u32,
    raw: Arc<[u8]>,
    text: Chars,
    tokens: OnceLock<Arc<[Token]>>,
}

impl Candidate {
    pub fn new(index: u32, raw: Arc<[u8]>, text: Chars) -> Self {
        Self {
            index,
            raw,
            text,
            tokens: OnceLock::new(),
        }
    }

    /// Candidate whose display text is the raw line itself
    pub fn from_raw(index: u32, raw: Arc<[u8]>) -> Self {
        let text = Chars::from_bytes(raw.clone());
        Self::new(index, raw, text)
    }

    /// Stable insertion order; the final tie-break
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    #[inline]
    pub fn text(&self) -> &Chars {
        &self.text
    }

    /// Original line as a string (lossy for invalid UTF-8)
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// Field tokens, computed by `init` on first access.
    pub fn tokens_with(&self, init: impl FnOnce(&Chars) -> Vec<Token>) -> &[Token] {
        self.tokens.get_or_init(|| init(&self.text).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::tokenizer::{Delimiter, tokenize};

    #[test]
    fn test_from_raw_shares_text() {
        let c = Candidate::from_raw(7, Arc::from(&b"foo bar"[..]));
        assert_eq!(c.index(), 7);
        assert_eq!(c.text().to_string(), "foo bar");
        assert_eq!(c.as_str(), "foo bar");
    }

    #[test]
    fn test_tokens_are_cached() {
        let c = Candidate::from_raw(0, Arc::from(&b"a b c"[..]));
        let first = c.tokens_with(|t| tokenize(&t.to_string(), &Delimiter::Awk)).len();
        let second = c.tokens_with(|_| panic!("tokens recomputed")).len();
        assert_eq!(first, 3);
        assert_eq!(second, 3);
    }
}
