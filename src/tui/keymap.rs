//! Key names, actions and the binding table.
//!
//! `--bind` takes a comma-separated list of `KEY:ACTION[+ACTION...]`. Keys use
//! the usual names (`ctrl-a`, `alt-b`, `enter`, `pgdn`, `f1`, single
//! characters); `execute(cmd)` may contain commas, colons and plus signs.

use crate::error::{Error, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rustc_hash::FxHashMap;

/// Normalized key: shift is folded into the character for printable keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Key {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let modifiers = match code {
            KeyCode::Char(_) | KeyCode::BackTab => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        Self { code, modifiers }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn alt(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::ALT)
    }

    /// Parse a key name.
    pub fn parse(name: &str) -> Result<Self> {
        let lower = name.to_lowercase();
        let key = match lower.as_str() {
            "enter" | "return" | "ctrl-m" => Key::plain(KeyCode::Enter),
            "esc" => Key::plain(KeyCode::Esc),
            "tab" | "ctrl-i" => Key::plain(KeyCode::Tab),
            "btab" | "shift-tab" => Key::plain(KeyCode::BackTab),
            "space" => Key::plain(KeyCode::Char(' ')),
            "bspace" | "bs" | "backspace" => Key::plain(KeyCode::Backspace),
            "alt-bspace" | "alt-bs" => Key::alt(KeyCode::Backspace),
            "del" | "delete" => Key::plain(KeyCode::Delete),
            "up" => Key::plain(KeyCode::Up),
            "down" => Key::plain(KeyCode::Down),
            "left" => Key::plain(KeyCode::Left),
            "right" => Key::plain(KeyCode::Right),
            "home" => Key::plain(KeyCode::Home),
            "end" => Key::plain(KeyCode::End),
            "pgup" | "page-up" => Key::plain(KeyCode::PageUp),
            "pgdn" | "page-down" => Key::plain(KeyCode::PageDown),
            "shift-up" => Key::new(KeyCode::Up, KeyModifiers::SHIFT),
            "shift-down" => Key::new(KeyCode::Down, KeyModifiers::SHIFT),
            "shift-left" => Key::new(KeyCode::Left, KeyModifiers::SHIFT),
            "shift-right" => Key::new(KeyCode::Right, KeyModifiers::SHIFT),
            _ => {
                if let Some(rest) = lower.strip_prefix("ctrl-") {
                    match single_char(rest) {
                        Some(c) if c.is_ascii_alphabetic() => Key::ctrl(c),
                        _ => return Err(Error::InvalidKey(name.to_string())),
                    }
                } else if let Some(rest) = name.strip_prefix("alt-").or_else(|| name.strip_prefix("ALT-")) {
                    match single_char(rest) {
                        Some(c) => Key::alt(KeyCode::Char(c)),
                        None => return Err(Error::InvalidKey(name.to_string())),
                    }
                } else if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                    if !(1..=12).contains(&n) {
                        return Err(Error::InvalidKey(name.to_string()));
                    }
                    Key::plain(KeyCode::F(n))
                } else {
                    // Single characters keep their case
                    match single_char(name) {
                        Some(c) => Key::plain(KeyCode::Char(c)),
                        None => return Err(Error::InvalidKey(name.to_string())),
                    }
                }
            }
        };
        Ok(key)
    }
}

impl From<KeyEvent> for Key {
    fn from(ev: KeyEvent) -> Self {
        Key::new(ev.code, ev.modifiers)
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Something a key can do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Abort,
    Accept,
    BackwardChar,
    ForwardChar,
    BackwardWord,
    ForwardWord,
    BeginningOfLine,
    EndOfLine,
    BackwardDeleteChar,
    DeleteChar,
    /// Delete forward, or abort when the query is empty
    DeleteCharEof,
    BackwardKillWord,
    KillWord,
    UnixLineDiscard,
    KillLine,
    Yank,
    ClearQuery,
    Up,
    Down,
    PageUp,
    PageDown,
    First,
    Last,
    Toggle,
    ToggleDown,
    ToggleUp,
    SelectAll,
    DeselectAll,
    ToggleAll,
    TogglePreview,
    PreviewUp,
    PreviewDown,
    PreviewPageUp,
    PreviewPageDown,
    ToggleSort,
    Execute(String),
    Ignore,
}

impl Action {
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(cmd) = s.strip_prefix("execute(").and_then(|r| r.strip_suffix(')')) {
            return Ok(Action::Execute(cmd.to_string()));
        }
        let action = match s.to_lowercase().as_str() {
            "abort" => Action::Abort,
            "accept" => Action::Accept,
            "backward-char" => Action::BackwardChar,
            "forward-char" => Action::ForwardChar,
            "backward-word" => Action::BackwardWord,
            "forward-word" => Action::ForwardWord,
            "beginning-of-line" => Action::BeginningOfLine,
            "end-of-line" => Action::EndOfLine,
            "backward-delete-char" => Action::BackwardDeleteChar,
            "delete-char" => Action::DeleteChar,
            "delete-char/eof" => Action::DeleteCharEof,
            "backward-kill-word" | "unix-word-rubout" => Action::BackwardKillWord,
            "kill-word" => Action::KillWord,
            "unix-line-discard" => Action::UnixLineDiscard,
            "kill-line" => Action::KillLine,
            "yank" => Action::Yank,
            "clear-query" => Action::ClearQuery,
            "up" => Action::Up,
            "down" => Action::Down,
            "page-up" => Action::PageUp,
            "page-down" => Action::PageDown,
            "first" | "top" => Action::First,
            "last" => Action::Last,
            "toggle" => Action::Toggle,
            "toggle-down" => Action::ToggleDown,
            "toggle-up" => Action::ToggleUp,
            "select-all" => Action::SelectAll,
            "deselect-all" => Action::DeselectAll,
            "toggle-all" => Action::ToggleAll,
            "toggle-preview" => Action::TogglePreview,
            "preview-up" => Action::PreviewUp,
            "preview-down" => Action::PreviewDown,
            "preview-page-up" => Action::PreviewPageUp,
            "preview-page-down" => Action::PreviewPageDown,
            "toggle-sort" => Action::ToggleSort,
            "ignore" => Action::Ignore,
            _ => return Err(Error::InvalidAction(s.to_string())),
        };
        Ok(action)
    }
}

/// Split `a+b+execute(x+y)` into actions.
fn parse_actions(s: &str) -> Result<Vec<Action>> {
    let mut actions = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let end = if rest.starts_with("execute(") {
            // Runs to the `)` that closes the action
            match rest.find(")+") {
                Some(i) => i + 1,
                None => rest.len(),
            }
        } else {
            rest.find('+').unwrap_or(rest.len())
        };
        actions.push(Action::parse(&rest[..end])?);
        rest = rest[end..].strip_prefix('+').unwrap_or(&rest[end..]);
    }
    if actions.is_empty() {
        return Err(Error::InvalidAction(s.to_string()));
    }
    Ok(actions)
}

/// Split a `--bind` value into `(key, actions)` pairs.
fn split_bindings(spec: &str) -> Result<Vec<(&str, &str)>> {
    let mut out = Vec::new();
    let mut rest = spec;
    while !rest.is_empty() {
        // The first character is always part of the key so `::` and `,:` work
        let colon = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == ':')
            .map(|(i, _)| i)
            .ok_or_else(|| Error::InvalidKey(rest.to_string()))?;
        let key = &rest[..colon];
        let after = &rest[colon + 1..];
        let mut end = after.len();
        let mut depth = 0usize;
        for (i, c) in after.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    end = i;
                    break;
                }
                _ => {}
            }
        }
        out.push((key, &after[..end]));
        rest = after[end..].strip_prefix(',').unwrap_or("");
    }
    Ok(out)
}

/// Binding table
#[derive(Debug, Clone)]
pub struct Keymap {
    map: FxHashMap<Key, Vec<Action>>,
}

impl Default for Keymap {
    fn default() -> Self {
        use Action::*;
        let mut map = FxHashMap::default();
        let mut bind = |key: Key, action: Action| {
            map.insert(key, vec![action]);
        };

        for c in ['c', 'g', 'q'] {
            bind(Key::ctrl(c), Abort);
        }
        bind(Key::plain(KeyCode::Esc), Abort);
        bind(Key::plain(KeyCode::Enter), Accept);
        bind(Key::ctrl('b'), BackwardChar);
        bind(Key::plain(KeyCode::Left), BackwardChar);
        bind(Key::ctrl('f'), ForwardChar);
        bind(Key::plain(KeyCode::Right), ForwardChar);
        bind(Key::alt(KeyCode::Char('b')), BackwardWord);
        bind(Key::new(KeyCode::Left, KeyModifiers::SHIFT), BackwardWord);
        bind(Key::alt(KeyCode::Char('f')), ForwardWord);
        bind(Key::new(KeyCode::Right, KeyModifiers::SHIFT), ForwardWord);
        bind(Key::ctrl('a'), BeginningOfLine);
        bind(Key::plain(KeyCode::Home), BeginningOfLine);
        bind(Key::ctrl('e'), EndOfLine);
        bind(Key::plain(KeyCode::End), EndOfLine);
        bind(Key::plain(KeyCode::Backspace), BackwardDeleteChar);
        bind(Key::ctrl('h'), BackwardDeleteChar);
        bind(Key::plain(KeyCode::Delete), DeleteChar);
        bind(Key::ctrl('d'), DeleteCharEof);
        bind(Key::ctrl('w'), BackwardKillWord);
        bind(Key::alt(KeyCode::Backspace), BackwardKillWord);
        bind(Key::alt(KeyCode::Char('d')), KillWord);
        bind(Key::ctrl('u'), UnixLineDiscard);
        bind(Key::ctrl('y'), Yank);
        bind(Key::ctrl('k'), Up);
        bind(Key::ctrl('p'), Up);
        bind(Key::plain(KeyCode::Up), Up);
        bind(Key::ctrl('j'), Down);
        bind(Key::ctrl('n'), Down);
        bind(Key::plain(KeyCode::Down), Down);
        bind(Key::plain(KeyCode::PageUp), PageUp);
        bind(Key::plain(KeyCode::PageDown), PageDown);
        bind(Key::plain(KeyCode::Tab), ToggleDown);
        bind(Key::plain(KeyCode::BackTab), ToggleUp);
        bind(Key::new(KeyCode::Up, KeyModifiers::SHIFT), PreviewUp);
        bind(Key::new(KeyCode::Down, KeyModifiers::SHIFT), PreviewDown);

        Self { map }
    }
}

impl Keymap {
    /// Default bindings overridden by each `--bind` value in turn.
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let mut keymap = Self::default();
        for spec in specs {
            keymap.apply(spec.as_ref())?;
        }
        Ok(keymap)
    }

    pub fn apply(&mut self, spec: &str) -> Result<()> {
        for (key, actions) in split_bindings(spec)? {
            let key = Key::parse(key)?;
            let actions = parse_actions(actions)?;
            self.map.insert(key, actions);
        }
        Ok(())
    }

    pub fn get(&self, key: &Key) -> Option<&[Action]> {
        self.map.get(key).map(Vec::as_slice)
    }
}
