//! Printing selections and filter-mode results

use crate::item::candidate::Candidate;
use crate::matching::algo::Slab;
use crate::matching::pattern::Pattern;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Colors are only used on an interactive stdout
pub fn color_choice(enabled: bool) -> ColorChoice {
    if enabled && io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Writes query and item lines, newline or NUL terminated.
pub struct Output<W> {
    out: W,
    terminator: u8,
    highlight: Option<Arc<Pattern>>,
    slab: Slab,
}

impl Output<StandardStream> {
    pub fn stdout(print0: bool, color: bool) -> Self {
        Self::new(StandardStream::stdout(color_choice(color)), print0)
    }
}

impl<W: WriteColor> Output<W> {
    pub fn new(out: W, print0: bool) -> Self {
        Self {
            out,
            terminator: if print0 { b'\0' } else { b'\n' },
            highlight: None,
            slab: Slab::default(),
        }
    }

    /// Highlight the characters `pattern` matched. Only meaningful when the
    /// display text is the raw line.
    pub fn with_highlight(mut self, pattern: Arc<Pattern>) -> Self {
        self.highlight = Some(pattern);
        self
    }

    pub fn query(&mut self, query: &str) -> io::Result<()> {
        self.out.write_all(query.as_bytes())?;
        self.out.write_all(&[self.terminator])
    }

    /// Print the original line of `item`. Lines that are not valid UTF-8 are
    /// written byte for byte, without highlighting.
    pub fn item(&mut self, item: &Candidate) -> io::Result<()> {
        let utf8 = std::str::from_utf8(item.raw()).is_ok();
        let mut positions = match &self.highlight {
            Some(pattern) if utf8 && self.out.supports_color() => pattern
                .match_item(item, true, &mut self.slab)
                .map(|m| m.positions)
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        positions.sort_unstable();
        positions.dedup();
        if positions.is_empty() {
            self.out.write_all(item.raw())?;
        } else {
            self.highlighted(item, &positions)?;
        }
        self.out.write_all(&[self.terminator])
    }

    fn highlighted(&mut self, item: &Candidate, positions: &[usize]) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Green)).set_bold(true);
        let mut buf = [0u8; 4];
        let mut next = positions.iter().peekable();
        for (i, c) in item.text().iter().enumerate() {
            let hit = next.next_if(|&&p| p == i).is_some();
            if hit {
                self.out.set_color(&spec)?;
            }
            self.out.write_all(c.encode_utf8(&mut buf).as_bytes())?;
            if hit {
                self.out.reset()?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Report a fatal error on stderr.
pub fn print_error(err: &anyhow::Error, color: bool) {
    let choice = if color && io::stderr().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "fzx:");
    let _ = stderr.reset();
    let _ = writeln!(stderr, " {:#}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::pattern::PatternOptions;
    use termcolor::Buffer;

    fn item(text: &str) -> Candidate {
        Candidate::from_raw(0, Arc::from(text.as_bytes()))
    }

    #[test]
    fn test_plain_lines() {
        let mut out = Output::new(Buffer::no_color(), false);
        out.query("qq").unwrap();
        out.item(&item("foo")).unwrap();
        out.item(&item("bar")).unwrap();
        assert_eq!(out.out.as_slice(), b"qq\nfoo\nbar\n");
    }

    #[test]
    fn test_print0() {
        let mut out = Output::new(Buffer::no_color(), true);
        out.item(&item("a b")).unwrap();
        out.item(&item("c")).unwrap();
        assert_eq!(out.out.as_slice(), b"a b\0c\0");
    }

    #[test]
    fn test_highlight_only_with_color() {
        let pattern = Arc::new(Pattern::parse("fb", Arc::new(PatternOptions::default())));

        let mut out = Output::new(Buffer::no_color(), false).with_highlight(Arc::clone(&pattern));
        out.item(&item("foobar")).unwrap();
        assert_eq!(out.out.as_slice(), b"foobar\n");

        let mut out = Output::new(Buffer::ansi(), false).with_highlight(pattern);
        out.item(&item("foobar")).unwrap();
        let text = String::from_utf8(out.out.into_inner()).unwrap();
        assert!(text.contains('\x1b'));
        assert!(text.ends_with("ar\n"));
    }

    #[test]
    fn test_invalid_utf8_written_verbatim() {
        let pattern = Arc::new(Pattern::parse("fb", Arc::new(PatternOptions::default())));
        let raw: &[u8] = b"foo\xff\xfebar";
        let mut out = Output::new(Buffer::ansi(), false).with_highlight(pattern);
        out.item(&Candidate::from_raw(0, Arc::from(raw))).unwrap();
        assert_eq!(out.out.as_slice(), b"foo\xff\xfebar\n");
    }
}
