//! View model and state machine of the finder.
//!
//! [`App::handle`] consumes one [`AppEvent`] and returns the [`Command`]s the
//! loop has to carry out (ranking passes, preview processes, `execute`). The
//! app never touches the terminal itself.
//!
//! Ranking results are tagged with a generation. A result is applied only when
//! its generation is at least that of the latest query change and higher than
//! the last applied one, so an old query's answer can never replace a newer
//! one whatever order the passes finish in.

use crate::config::Config;
use crate::item::candidate::Candidate;
use crate::item::store::CandidateStore;
use crate::matching::algo::Slab;
use crate::matching::merger::Merger;
use crate::matching::pattern::{Pattern, PatternBuilder};
use crate::matching::ranker::RankRequest;
use crate::tui::event::AppEvent;
use crate::tui::keymap::{Action, Key, Keymap};
use crate::tui::preview::{PlaceholderContext, expand, has_item_placeholder};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

/// How the session ended
#[derive(Debug, Clone)]
pub enum Outcome {
    Accept { query: String, items: Vec<Candidate> },
    Abort,
}

#[derive(Debug, Clone)]
pub enum Phase {
    /// No input received yet
    Idle,
    /// Input still streaming or a pass in flight
    Loading,
    /// Input complete and the latest pass applied
    Ready,
    Finished(Outcome),
}

/// Work requested from the loop
#[derive(Debug)]
pub enum Command {
    Rank(RankRequest),
    Preview { generation: u64, command: String },
    Execute(String),
}

pub struct App {
    config: Arc<Config>,
    keymap: Keymap,
    store: Arc<CandidateStore>,
    builder: PatternBuilder,
    pub phase: Phase,

    // Prompt
    pub query: Vec<char>,
    pub cursor: usize,
    yank: Vec<char>,

    // Ranking
    /// Pattern of the latest submitted pass
    pub pattern: Arc<Pattern>,
    pub merger: Arc<Merger>,
    /// Pattern that produced `merger`, used for highlighting
    pub merger_pattern: Arc<Pattern>,
    pub item_count: usize,
    reader_done: bool,
    pub reader_error: Option<String>,
    pub rank_progress: Option<u8>,
    generation: u64,
    query_generation: u64,
    applied_generation: u64,
    rerank_pending: bool,
    reset_on_apply: bool,
    pub sort: bool,

    // List view
    pub current: usize,
    pub offset: usize,
    pub list_top: u16,
    pub list_height: usize,
    selection: FxHashMap<u32, (u64, Candidate)>,
    selection_seq: u64,

    // Preview
    pub preview_visible: bool,
    pub preview_scroll: u16,
    pub preview_height: u16,
    pub preview: Option<Result<String, String>>,
    preview_generation: u64,
    preview_command: Option<String>,

    pub spinner: usize,
    pub dirty: bool,
    /// Scratch space for highlight positions when drawing
    pub slab: Slab,
}

impl App {
    pub fn new(config: Arc<Config>, keymap: Keymap, store: Arc<CandidateStore>) -> Self {
        let mut builder = PatternBuilder::new(config.pattern.clone());
        let query: Vec<char> = config.query.chars().collect();
        let pattern = builder.build(&config.query);
        let preview_visible = config.preview.is_some() && !config.preview_window.hidden;
        let sort = config.rank.sort_cap.is_some();
        Self {
            keymap,
            store,
            builder,
            phase: Phase::Idle,
            cursor: query.len(),
            query,
            yank: Vec::new(),
            merger_pattern: Arc::clone(&pattern),
            pattern,
            merger: Arc::new(Merger::default()),
            item_count: 0,
            reader_done: false,
            reader_error: None,
            rank_progress: None,
            generation: 0,
            query_generation: 0,
            applied_generation: 0,
            rerank_pending: false,
            reset_on_apply: false,
            sort,
            current: 0,
            offset: 0,
            list_top: 0,
            list_height: 1,
            selection: FxHashMap::default(),
            selection_seq: 0,
            preview_visible,
            preview_scroll: 0,
            preview_height: 1,
            preview: None,
            preview_generation: 0,
            preview_command: None,
            spinner: 0,
            dirty: true,
            slab: Slab::default(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Commands for the first pass
    pub fn start(&mut self) -> Vec<Command> {
        vec![self.submit(true)]
    }

    pub fn query_string(&self) -> String {
        self.query.iter().collect()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    pub fn multi(&self) -> bool {
        self.config.multi.is_some()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn is_selected(&self, index: u32) -> bool {
        self.selection.contains_key(&index)
    }

    pub fn current_item(&self) -> Option<Candidate> {
        self.merger.get(self.current).map(|r| r.item)
    }

    /// Selected items in the order they were selected
    pub fn selected_items(&self) -> Vec<Candidate> {
        let mut items: Vec<&(u64, Candidate)> = self.selection.values().collect();
        items.sort_unstable_by_key(|(seq, _)| *seq);
        items.into_iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn handle(&mut self, event: AppEvent) -> Vec<Command> {
        if self.is_finished() {
            return Vec::new();
        }
        let mut cmds = Vec::new();
        match event {
            AppEvent::Key(key) => self.handle_key(key, &mut cmds),
            AppEvent::Mouse(mouse) => self.handle_mouse(mouse),
            AppEvent::Resize(..) => self.dirty = true,
            AppEvent::Tick => {
                if !matches!(self.phase, Phase::Ready) {
                    self.spinner = self.spinner.wrapping_add(1);
                    self.dirty = true;
                }
            }
            AppEvent::ReaderProgress => {
                self.item_count = self.store.count();
                self.rerank(&mut cmds);
            }
            AppEvent::ReaderFinished(error) => {
                self.reader_done = true;
                self.item_count = self.store.count();
                self.reader_error = error;
                self.rerank(&mut cmds);
            }
            AppEvent::RankProgress { generation, percent } => {
                if generation == self.generation {
                    self.rank_progress = Some(percent);
                    self.dirty = true;
                }
            }
            AppEvent::Ranked {
                generation,
                pattern,
                merger,
            } => self.apply(generation, pattern, merger, &mut cmds),
            AppEvent::PreviewOutput { generation, output } => {
                if generation == self.preview_generation {
                    self.preview = Some(output);
                    self.preview_scroll = 0;
                    self.dirty = true;
                }
            }
            AppEvent::Terminate => self.finish(Outcome::Abort),
        }
        self.update_phase();
        if !self.is_finished() {
            self.refresh_preview(&mut cmds);
        }
        cmds
    }

    fn submit(&mut self, query_changed: bool) -> Command {
        self.generation += 1;
        if query_changed {
            self.query_generation = self.generation;
            self.reset_on_apply = true;
            self.pattern = self.builder.build(&self.query_string());
        }
        self.rerank_pending = false;
        self.rank_progress = None;
        trace!(generation = self.generation, query_changed, "submit");
        Command::Rank(RankRequest {
            generation: self.generation,
            pattern: Arc::clone(&self.pattern),
            snapshot: self.store.snapshot(),
            sort: self.sort,
        })
    }

    /// New input arrived: re-run the current query, or queue that until the
    /// pass in flight lands.
    fn rerank(&mut self, cmds: &mut Vec<Command>) {
        if self.generation > self.applied_generation {
            self.rerank_pending = true;
        } else {
            cmds.push(self.submit(false));
        }
        self.dirty = true;
    }

    fn apply(&mut self, generation: u64, pattern: Arc<Pattern>, merger: Arc<Merger>, cmds: &mut Vec<Command>) {
        if generation < self.query_generation || generation <= self.applied_generation {
            trace!(generation, "dropping stale result");
            return;
        }
        self.applied_generation = generation;
        self.merger = merger;
        self.merger_pattern = pattern;
        self.rank_progress = None;
        if self.reset_on_apply {
            self.reset_on_apply = false;
            self.current = 0;
            self.offset = 0;
        }
        self.current = self.current.min(self.merger.len().saturating_sub(1));
        self.dirty = true;
        if self.rerank_pending && generation == self.generation {
            cmds.push(self.submit(false));
        }
    }

    fn update_phase(&mut self) {
        if self.is_finished() {
            return;
        }
        self.phase = if !self.reader_done {
            if self.store.count() == 0 { Phase::Idle } else { Phase::Loading }
        } else if self.generation > self.applied_generation || self.rerank_pending {
            Phase::Loading
        } else {
            Phase::Ready
        };
    }

    fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::Finished(outcome);
        self.dirty = true;
    }

    fn handle_key(&mut self, key: KeyEvent, cmds: &mut Vec<Command>) {
        let key = Key::from(key);
        let before = self.query.clone();
        match self.keymap.get(&key) {
            Some(actions) => {
                for action in actions.to_vec() {
                    self.perform(action, cmds);
                    if self.is_finished() {
                        return;
                    }
                }
            }
            None => match key.code {
                KeyCode::Char(c) if key.modifiers == KeyModifiers::NONE => {
                    self.query.insert(self.cursor, c);
                    self.cursor += 1;
                }
                _ => {}
            },
        }
        if self.query != before {
            cmds.push(self.submit(true));
        }
        self.dirty = true;
    }

    fn perform(&mut self, action: Action, cmds: &mut Vec<Command>) {
        match action {
            Action::Abort => self.finish(Outcome::Abort),
            Action::Accept => self.accept(),
            Action::BackwardChar => self.cursor = self.cursor.saturating_sub(1),
            Action::ForwardChar => self.cursor = (self.cursor + 1).min(self.query.len()),
            Action::BackwardWord => self.cursor = self.word_start(),
            Action::ForwardWord => self.cursor = self.word_end(),
            Action::BeginningOfLine => self.cursor = 0,
            Action::EndOfLine => self.cursor = self.query.len(),
            Action::BackwardDeleteChar => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.query.remove(self.cursor);
                }
            }
            Action::DeleteChar => {
                if self.cursor < self.query.len() {
                    self.query.remove(self.cursor);
                }
            }
            Action::DeleteCharEof => {
                if self.query.is_empty() {
                    self.finish(Outcome::Abort);
                } else if self.cursor < self.query.len() {
                    self.query.remove(self.cursor);
                }
            }
            Action::BackwardKillWord => {
                let start = self.word_start();
                self.kill(start, self.cursor);
                self.cursor = start;
            }
            Action::KillWord => {
                let end = self.word_end();
                self.kill(self.cursor, end);
            }
            Action::UnixLineDiscard => {
                self.kill(0, self.cursor);
                self.cursor = 0;
            }
            Action::KillLine => self.kill(self.cursor, self.query.len()),
            Action::Yank => {
                for c in self.yank.clone() {
                    self.query.insert(self.cursor, c);
                    self.cursor += 1;
                }
            }
            Action::ClearQuery => {
                self.query.clear();
                self.cursor = 0;
            }
            Action::Up => self.move_by(-1),
            Action::Down => self.move_by(1),
            Action::PageUp => self.move_by(-(self.list_height.max(1) as isize)),
            Action::PageDown => self.move_by(self.list_height.max(1) as isize),
            Action::First => self.current = 0,
            Action::Last => self.current = self.merger.len().saturating_sub(1),
            Action::Toggle => self.toggle_current(),
            Action::ToggleDown => {
                self.toggle_current();
                self.move_by(1);
            }
            Action::ToggleUp => {
                self.toggle_current();
                self.move_by(-1);
            }
            Action::SelectAll => {
                if self.multi() {
                    for r in self.merger.clone().iter() {
                        if !self.is_selected(r.index()) {
                            self.select(r.item);
                        }
                    }
                }
            }
            Action::DeselectAll => self.selection.clear(),
            Action::ToggleAll => {
                if self.multi() {
                    for r in self.merger.clone().iter() {
                        self.toggle(r.item);
                    }
                }
            }
            Action::TogglePreview => {
                if self.config.preview.is_some() {
                    self.preview_visible = !self.preview_visible;
                }
            }
            Action::PreviewUp => self.preview_scroll = self.preview_scroll.saturating_sub(1),
            Action::PreviewDown => self.preview_scroll = self.preview_scroll.saturating_add(1),
            Action::PreviewPageUp => {
                self.preview_scroll = self.preview_scroll.saturating_sub(self.preview_height.max(1))
            }
            Action::PreviewPageDown => {
                self.preview_scroll = self.preview_scroll.saturating_add(self.preview_height.max(1))
            }
            Action::ToggleSort => {
                self.sort = !self.sort;
                cmds.push(self.submit(true));
            }
            Action::Execute(template) => {
                let command = self.expand(&template);
                cmds.push(Command::Execute(command));
            }
            Action::Ignore => {}
        }
    }

    fn accept(&mut self) {
        let items = if self.selection.is_empty() {
            self.current_item().into_iter().collect()
        } else {
            self.selected_items()
        };
        self.finish(Outcome::Accept {
            query: self.query_string(),
            items,
        });
    }

    fn kill(&mut self, start: usize, end: usize) {
        if start < end {
            self.yank = self.query.drain(start..end).collect();
        }
    }

    fn word_start(&self) -> usize {
        let mut i = self.cursor;
        while i > 0 && !self.query[i - 1].is_alphanumeric() {
            i -= 1;
        }
        while i > 0 && self.query[i - 1].is_alphanumeric() {
            i -= 1;
        }
        i
    }

    fn word_end(&self) -> usize {
        let len = self.query.len();
        let mut i = self.cursor;
        while i < len && !self.query[i].is_alphanumeric() {
            i += 1;
        }
        while i < len && self.query[i].is_alphanumeric() {
            i += 1;
        }
        i
    }

    fn move_by(&mut self, delta: isize) {
        let len = self.merger.len();
        if len == 0 {
            return;
        }
        let target = self.current as isize + delta;
        self.current = if self.config.cycle && delta.abs() == 1 {
            target.rem_euclid(len as isize) as usize
        } else {
            target.clamp(0, len as isize - 1) as usize
        };
    }

    /// Keep the current row inside the visible window
    pub fn scroll_to_current(&mut self) {
        let height = self.list_height.max(1);
        if self.current < self.offset {
            self.offset = self.current;
        } else if self.current >= self.offset + height {
            self.offset = self.current + 1 - height;
        }
    }

    fn can_select(&self) -> bool {
        match self.config.multi {
            Some(0) => true,
            Some(max) => self.selection.len() < max,
            None => false,
        }
    }

    fn select(&mut self, item: Candidate) {
        if self.can_select() {
            self.selection_seq += 1;
            self.selection.insert(item.index(), (self.selection_seq, item));
        }
    }

    fn toggle(&mut self, item: Candidate) {
        if self.selection.remove(&item.index()).is_none() {
            self.select(item);
        }
    }

    fn toggle_current(&mut self) {
        if !self.multi() {
            return;
        }
        if let Some(item) = self.current_item() {
            self.toggle(item);
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.move_by(-1),
            MouseEventKind::ScrollDown => self.move_by(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let row = mouse.row;
                if row >= self.list_top && ((row - self.list_top) as usize) < self.list_height {
                    let idx = self.offset + (row - self.list_top) as usize;
                    if idx < self.merger.len() {
                        self.current = idx;
                    }
                }
            }
            _ => return,
        }
        self.dirty = true;
    }

    fn expand(&self, template: &str) -> String {
        let current = self.current_item();
        let selected = self.selected_items();
        let query = self.query_string();
        expand(
            template,
            &PlaceholderContext {
                current: current.as_ref(),
                selected: &selected,
                query: &query,
                delimiter: &self.config.pattern.delimiter,
            },
        )
    }

    /// Start a preview when the command for the current state changed
    fn refresh_preview(&mut self, cmds: &mut Vec<Command>) {
        let Some(template) = self.config.preview.clone() else {
            return;
        };
        if !self.preview_visible {
            self.preview_command = None;
            return;
        }
        if has_item_placeholder(&template) && self.current_item().is_none() {
            if self.preview_command.take().is_some() {
                self.preview_generation += 1;
                self.preview = None;
            }
            return;
        }
        let command = self.expand(&template);
        if self.preview_command.as_deref() != Some(command.as_str()) {
            self.preview_generation += 1;
            self.preview_command = Some(command.clone());
            cmds.push(Command::Preview {
                generation: self.preview_generation,
                command,
            });
        }
    }
}
