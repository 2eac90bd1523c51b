//! Character storage for candidate text.
//!
//! Most input is ASCII, so the common case keeps the original bytes and indexes
//! them directly. Lines containing anything else are decoded once into a
//! `char` slice so the matchers can index characters in O(1) without repeated
//! UTF-8 decoding.

use std::fmt;
use std::sync::Arc;

/// Text of a candidate, indexable by character position.
#[derive(Clone, PartialEq, Eq)]
pub enum Chars {
    /// Pure ASCII; byte index == character index
    Ascii(Arc<[u8]>),
    /// Pre-decoded code points
    Unicode(Arc<[char]>),
}

impl Chars {
    /// Build from raw bytes, sharing the allocation when the bytes are ASCII.
    /// Invalid UTF-8 is replaced with U+FFFD.
    pub fn from_bytes(bytes: Arc<[u8]>) -> Self {
        if bytes.is_ascii() {
            return Chars::Ascii(bytes);
        }
        let decoded: Vec<char> = String::from_utf8_lossy(&bytes).chars().collect();
        Chars::Unicode(decoded.into())
    }

    pub fn from_text(s: &str) -> Self {
        if s.is_ascii() {
            Chars::Ascii(Arc::from(s.as_bytes()))
        } else {
            Chars::Unicode(s.chars().collect::<Vec<_>>().into())
        }
    }

    pub fn empty() -> Self {
        Chars::Ascii(Arc::from(&[][..]))
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Chars::Ascii(bytes) => bytes.len(),
            Chars::Unicode(chars) => chars.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Character at `idx`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn get(&self, idx: usize) -> char {
        match self {
            Chars::Ascii(bytes) => bytes[idx] as char,
            Chars::Unicode(chars) => chars[idx],
        }
    }

    /// The underlying bytes when the text is pure ASCII
    #[inline]
    pub fn as_ascii(&self) -> Option<&[u8]> {
        match self {
            Chars::Ascii(bytes) => Some(bytes),
            Chars::Unicode(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Copy all characters into `buf`, replacing its contents.
    pub fn copy_into(&self, buf: &mut Vec<char>) {
        buf.clear();
        match self {
            Chars::Ascii(bytes) => buf.extend(bytes.iter().map(|&b| b as char)),
            Chars::Unicode(chars) => buf.extend_from_slice(chars),
        }
    }

    pub fn leading_whitespaces(&self) -> usize {
        self.iter().take_while(|c| c.is_whitespace()).count()
    }

    pub fn trailing_whitespaces(&self) -> usize {
        let len = self.len();
        (0..len)
            .rev()
            .take_while(|&i| self.get(i).is_whitespace())
            .count()
    }

    /// Length without surrounding whitespace, used by the `length` tie-break.
    pub fn trim_len(&self) -> usize {
        let leading = self.leading_whitespaces();
        if leading == self.len() {
            return 0;
        }
        self.len() - leading - self.trailing_whitespaces()
    }

    /// Characters in `[start, end)` as a new `String`
    pub fn slice_to_string(&self, start: usize, end: usize) -> String {
        let end = end.min(self.len());
        let start = start.min(end);
        match self {
            Chars::Ascii(bytes) => String::from_utf8_lossy(&bytes[start..end]).into_owned(),
            Chars::Unicode(chars) => chars[start..end].iter().collect(),
        }
    }
}

impl fmt::Display for Chars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chars::Ascii(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Chars::Unicode(chars) => {
                for c in chars.iter() {
                    fmt::Write::write_char(f, *c)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Chars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chars({:?})", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_shares_bytes() {
        let raw: Arc<[u8]> = Arc::from(&b"hello"[..]);
        let chars = Chars::from_bytes(raw.clone());
        match &chars {
            Chars::Ascii(bytes) => assert!(Arc::ptr_eq(bytes, &raw)),
            Chars::Unicode(_) => panic!("expected ascii"),
        }
        assert_eq!(chars.len(), 5);
        assert_eq!(chars.get(1), 'e');
    }

    #[test]
    fn test_unicode_indexes_by_char() {
        let chars = Chars::from_text("héllo");
        assert_eq!(chars.len(), 5);
        assert_eq!(chars.get(1), 'é');
        assert_eq!(chars.to_string(), "héllo");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let chars = Chars::from_bytes(Arc::from(&b"a\xffb"[..]));
        assert_eq!(chars.to_string(), "a\u{FFFD}b");
    }

    #[test]
    fn test_whitespace_counts() {
        let chars = Chars::from_text("  foo bar \t");
        assert_eq!(chars.leading_whitespaces(), 2);
        assert_eq!(chars.trailing_whitespaces(), 2);
        assert_eq!(chars.trim_len(), 7);
    }

    #[test]
    fn test_all_whitespace_trims_to_zero() {
        assert_eq!(Chars::from_text("   ").trim_len(), 0);
        assert_eq!(Chars::empty().trim_len(), 0);
    }

    #[test]
    fn test_slice_to_string() {
        let chars = Chars::from_text("añb");
        assert_eq!(chars.slice_to_string(1, 3), "ñb");
        assert_eq!(chars.slice_to_string(2, 10), "b");
    }
}
