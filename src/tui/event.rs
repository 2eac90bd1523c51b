//! The loop's event queue and the threads feeding it

use crate::item::reader::ReaderEvent;
use crate::matching::merger::Merger;
use crate::matching::pattern::Pattern;
use crate::matching::ranker::RankEvent;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::warn;

/// Idle tick interval
pub const TICK: Duration = Duration::from_millis(50);

/// Everything the render loop reacts to
#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    ReaderProgress,
    ReaderFinished(Option<String>),
    RankProgress { generation: u64, percent: u8 },
    Ranked {
        generation: u64,
        pattern: Arc<Pattern>,
        merger: Arc<Merger>,
    },
    PreviewOutput { generation: u64, output: Result<String, String> },
    Terminate,
}

impl From<ReaderEvent> for AppEvent {
    fn from(ev: ReaderEvent) -> Self {
        match ev {
            ReaderEvent::Progress => AppEvent::ReaderProgress,
            ReaderEvent::Finished(err) => AppEvent::ReaderFinished(err),
        }
    }
}

impl From<RankEvent> for AppEvent {
    fn from(ev: RankEvent) -> Self {
        match ev {
            RankEvent::Progress { generation, percent } => AppEvent::RankProgress { generation, percent },
            RankEvent::Done {
                generation,
                pattern,
                merger,
            } => AppEvent::Ranked {
                generation,
                pattern,
                merger,
            },
        }
    }
}

/// Shared switches of the input thread
#[derive(Debug, Clone, Default)]
pub struct InputControl {
    pub stop: Arc<AtomicBool>,
    /// Set while a foreground command owns the terminal
    pub paused: Arc<AtomicBool>,
}

/// Forward terminal input, posting a tick whenever nothing arrives within
/// [`TICK`].
pub fn spawn_input(tx: Sender<AppEvent>, control: InputControl) -> Option<JoinHandle<()>> {
    thread::Builder::new()
        .name("fzx-input".into())
        .spawn(move || {
            while !control.stop.load(Ordering::Acquire) {
                if control.paused.load(Ordering::Acquire) {
                    thread::sleep(TICK);
                    continue;
                }
                let ev = match event::poll(TICK) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
                        Ok(Event::Mouse(mouse)) => AppEvent::Mouse(mouse),
                        Ok(Event::Resize(w, h)) => AppEvent::Resize(w, h),
                        Ok(_) => continue,
                        Err(e) => {
                            warn!(error = %e, "terminal read failed");
                            AppEvent::Terminate
                        }
                    },
                    Ok(false) => AppEvent::Tick,
                    Err(e) => {
                        warn!(error = %e, "terminal poll failed");
                        AppEvent::Terminate
                    }
                };
                let terminate = matches!(ev, AppEvent::Terminate);
                if tx.send(ev).is_err() || terminate {
                    break;
                }
            }
        })
        .ok()
}

/// Turn SIGINT/SIGTERM/SIGHUP into [`AppEvent::Terminate`].
#[cfg(unix)]
pub fn spawn_signals(tx: Sender<AppEvent>) -> std::io::Result<signal_hook::iterator::Handle> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
    let handle = signals.handle();
    thread::Builder::new().name("fzx-signals".into()).spawn(move || {
        for sig in signals.forever() {
            tracing::debug!(signal = sig, "terminating on signal");
            if tx.send(AppEvent::Terminate).is_err() {
                break;
            }
        }
    })?;
    Ok(handle)
}
