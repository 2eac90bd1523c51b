//! Interactive finder.
//!
//! The loop thread owns the terminal and the [`App`]. Input, reader, ranker,
//! preview and signal threads only post [`AppEvent`]s to its queue.

pub mod app;
pub mod event;
pub mod keymap;
pub mod preview;
mod theme;
mod ui;

use crate::config::Config;
use crate::error::Error;
use crate::item::reader::{self, ReaderOptions, Source};
use crate::item::store::CandidateStore;
use crate::matching::ranker::Ranker;
use anyhow::Result;
use app::{App, Command, Outcome, Phase};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use event::{AppEvent, InputControl};
use keymap::Keymap;
use preview::Previewer;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::{File, OpenOptions};
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use theme::Theme;
use tracing::{debug, info, warn};

/// Raw mode, alternate screen and mouse capture on the controlling terminal.
/// Restored on drop.
pub struct TerminalContext {
    terminal: Terminal<CrosstermBackend<File>>,
    mouse: bool,
}

impl TerminalContext {
    pub fn open(mouse: bool) -> Result<Self, Error> {
        let tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map_err(Error::TerminalInit)?;
        enable_raw_mode().map_err(Error::TerminalInit)?;
        let mut ctx = Self {
            terminal: Terminal::new(CrosstermBackend::new(tty)).map_err(Error::TerminalInit)?,
            mouse,
        };
        ctx.enter().map_err(Error::TerminalInit)?;
        ctx.terminal.clear().map_err(Error::TerminalInit)?;
        Ok(ctx)
    }

    fn enter(&mut self) -> io::Result<()> {
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        if self.mouse {
            execute!(self.terminal.backend_mut(), EnableMouseCapture)?;
        }
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if self.mouse {
            execute!(self.terminal.backend_mut(), DisableMouseCapture)?;
        }
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }

    /// Hand the terminal to a child process and wait for it.
    fn run_foreground(&mut self, command: &str) -> io::Result<()> {
        self.leave()?;
        disable_raw_mode()?;
        let tty_in = OpenOptions::new().read(true).open("/dev/tty")?;
        let tty_out = OpenOptions::new().write(true).open("/dev/tty")?;
        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::from(tty_in))
            .stdout(Stdio::from(tty_out))
            .status();
        enable_raw_mode()?;
        self.enter()?;
        self.terminal.clear()?;
        match status {
            Ok(s) => debug!(command, status = %s, "execute finished"),
            Err(e) => warn!(command, error = %e, "execute failed"),
        }
        Ok(())
    }
}

impl Drop for TerminalContext {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = self.leave();
    }
}

/// Run the finder until the user accepts or aborts.
pub fn run(config: Arc<Config>, store: Arc<CandidateStore>, source: Source) -> Result<Outcome> {
    // Bad bindings are configuration errors; report them before taking over
    // the terminal
    let keymap = Keymap::from_specs(&config.bind)?;
    let theme = Theme::new(config.color);
    let (tx, rx) = mpsc::channel::<AppEvent>();

    let reader_tx = tx.clone();
    let reader = reader::spawn(
        source,
        Arc::clone(&store),
        ReaderOptions { read0: config.read0 },
        move |ev| {
            let _ = reader_tx.send(ev.into());
        },
    );
    let rank_tx = tx.clone();
    let mut ranker = Ranker::spawn(config.rank.clone(), move |ev| {
        let _ = rank_tx.send(ev.into());
    });
    let previewer = Previewer::new(tx.clone());

    let mut ctx = TerminalContext::open(config.mouse)?;
    let control = InputControl::default();
    let input = event::spawn_input(tx.clone(), control.clone());
    #[cfg(unix)]
    let signals = event::spawn_signals(tx.clone())
        .map_err(|e| warn!(error = %e, "failed to install signal handlers"))
        .ok();
    drop(tx);

    let mut app = App::new(Arc::clone(&config), keymap, store);
    let mut pending = app.start();
    let outcome = loop {
        for cmd in pending.drain(..) {
            match cmd {
                Command::Rank(request) => ranker.submit(request),
                Command::Preview { generation, command } => previewer.request(generation, command),
                Command::Execute(command) => {
                    control.paused.store(true, Ordering::Release);
                    let result = ctx.run_foreground(&command);
                    control.paused.store(false, Ordering::Release);
                    result?;
                    app.dirty = true;
                }
            }
        }
        if let Phase::Finished(outcome) = &app.phase {
            break outcome.clone();
        }
        if app.dirty {
            ctx.terminal.draw(|f| ui::draw(f, &mut app, &theme))?;
            app.dirty = false;
        }

        let Ok(ev) = rx.recv() else {
            break Outcome::Abort;
        };
        if matches!(ev, AppEvent::ReaderProgress) {
            reader.ack();
        }
        pending = app.handle(ev);
    };

    control.stop.store(true, Ordering::Release);
    #[cfg(unix)]
    let _ = signals.map(|handle| handle.close());
    previewer.kill();
    drop(ctx);
    if let Some(input) = input {
        let _ = input.join();
    }
    info!(accepted = matches!(outcome, Outcome::Accept { .. }), "finder closed");
    Ok(outcome)
}
