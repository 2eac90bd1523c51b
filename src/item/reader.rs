//! Input reader feeding the candidate store from a background thread.

use crate::error::{Error, Result};
use crate::item::store::CandidateStore;
use std::io::{self, BufRead, BufReader, IsTerminal, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Command used when stdin is a terminal and no default command is set
pub const DEFAULT_COMMAND: &str = "find . -type f 2>/dev/null";

/// Environment variable overriding [`DEFAULT_COMMAND`]
pub const DEFAULT_COMMAND_ENV: &str = "FZX_DEFAULT_COMMAND";

/// Where candidate lines come from
pub enum Source {
    Stream(Box<dyn Read + Send>),
    Command(String),
}

impl Source {
    /// Piped stdin, or the default command when stdin is a terminal.
    pub fn detect() -> Self {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            let cmd = std::env::var(DEFAULT_COMMAND_ENV)
                .ok()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COMMAND.to_string());
            Source::Command(cmd)
        } else {
            Source::Stream(Box::new(stdin))
        }
    }
}

/// Notifications posted by the reader thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// New candidates are available
    Progress,
    /// Input exhausted; carries a message when reading failed
    Finished(Option<String>),
}

/// Handle to a running reader.
///
/// `Progress` notifications are coalesced: after one is posted no other is
/// sent until the consumer calls [`ReaderHandle::ack`].
pub struct ReaderHandle {
    pending: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    /// Allow the next progress notification through
    pub fn ack(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Block until the reader thread exits
    pub fn join(mut self) {
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

/// Reader configuration
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// Split on NUL instead of newline
    pub read0: bool,
}

/// Start reading `source` into `store` on a new thread.
pub fn spawn<F>(source: Source, store: Arc<CandidateStore>, options: ReaderOptions, notify: F) -> ReaderHandle
where
    F: Fn(ReaderEvent) + Send + 'static,
{
    let pending = Arc::new(AtomicBool::new(false));
    let thread_pending = Arc::clone(&pending);

    let thread = thread::Builder::new()
        .name("fzx-reader".into())
        .spawn(move || {
            let result = read_source(source, &store, options, || {
                if !thread_pending.swap(true, Ordering::AcqRel) {
                    notify(ReaderEvent::Progress);
                }
            });
            store.finish();
            let error = result.err().map(|e| {
                warn!(error = %e, "reader failed");
                e.to_string()
            });
            notify(ReaderEvent::Finished(error));
        })
        .ok();

    ReaderHandle { pending, thread }
}

/// Read everything from `source` on the current thread.
pub fn read_source(
    source: Source,
    store: &CandidateStore,
    options: ReaderOptions,
    mut on_batch: impl FnMut(),
) -> Result<()> {
    match source {
        Source::Stream(stream) => Ok(feed(stream, store, options, &mut on_batch)?),
        Source::Command(cmd) => {
            debug!(command = %cmd, "reading from command");
            let mut child = Command::new("sh")
                .arg("-c")
                .arg(&cmd)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .spawn()?;
            let result = match child.stdout.take() {
                Some(out) => feed(out, store, options, &mut on_batch),
                None => Ok(()),
            };
            wait_command(&mut child, &cmd)?;
            Ok(result?)
        }
    }
}

fn wait_command(child: &mut Child, cmd: &str) -> Result<()> {
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            command: cmd.to_string(),
            status,
        })
    }
}

/// Notify at most once per this many lines
const NOTIFY_EVERY: usize = 1000;

fn feed<R: Read>(src: R, store: &CandidateStore, options: ReaderOptions, on_batch: &mut impl FnMut()) -> io::Result<()> {
    let delim = if options.read0 { b'\0' } else { b'\n' };
    let mut reader = BufReader::with_capacity(64 * 1024, src);
    let mut buf = Vec::with_capacity(256);
    let mut since_notify = 0;

    loop {
        buf.clear();
        let n = reader.read_until(delim, &mut buf)?;
        if n == 0 {
            break;
        }
        let line = trim_line(&buf, delim);
        store.push(line);

        since_notify += 1;
        if since_notify >= NOTIFY_EVERY || reader.buffer().is_empty() {
            on_batch();
            since_notify = 0;
        }
    }
    if since_notify > 0 {
        on_batch();
    }
    Ok(())
}

fn trim_line(buf: &[u8], delim: u8) -> &[u8] {
    let line = buf.strip_suffix(&[delim]).unwrap_or(buf);
    if delim == b'\n' {
        line.strip_suffix(b"\r").unwrap_or(line)
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    fn lines(store: &CandidateStore) -> Vec<String> {
        store.snapshot().iter().map(|c| c.as_str().into_owned()).collect()
    }

    #[test]
    fn test_reads_lines_and_strips_crlf() {
        let store = CandidateStore::plain();
        let src = Source::Stream(Box::new(Cursor::new(b"a\r\nb\n\nc".to_vec())));
        read_source(src, &store, ReaderOptions { read0: false }, || {}).unwrap();
        assert_eq!(lines(&store), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_read0_keeps_newlines() {
        let store = CandidateStore::plain();
        let src = Source::Stream(Box::new(Cursor::new(b"one\ntwo\0three\0".to_vec())));
        read_source(src, &store, ReaderOptions { read0: true }, || {}).unwrap();
        assert_eq!(lines(&store), vec!["one\ntwo", "three"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_from_command() {
        let store = CandidateStore::plain();
        let src = Source::Command("printf 'x\\ny\\n'".to_string());
        read_source(src, &store, ReaderOptions { read0: false }, || {}).unwrap();
        assert_eq!(lines(&store), vec!["x", "y"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_is_reported() {
        let store = CandidateStore::plain();
        let src = Source::Command("echo partial; exit 3".to_string());
        let err = read_source(src, &store, ReaderOptions { read0: false }, || {}).unwrap_err();
        assert!(matches!(&err, Error::CommandFailed { command, .. } if command == "echo partial; exit 3"));
        assert!(err.to_string().contains("command failed"));
        assert_eq!(lines(&store), vec!["partial"]);
    }

    /// Yields one line, then fails
    struct Broken(bool);

    impl Read for Broken {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0 {
                return Err(io::Error::other("device gone"));
            }
            self.0 = true;
            buf[..3].copy_from_slice(b"ok\n");
            Ok(3)
        }
    }

    #[test]
    fn test_stream_error_is_input_error() {
        let store = CandidateStore::plain();
        let src = Source::Stream(Box::new(Broken(false)));
        let err = read_source(src, &store, ReaderOptions { read0: false }, || {}).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert_eq!(err.to_string(), "failed to read input: device gone");
        assert_eq!(lines(&store), vec!["ok"]);
    }

    #[test]
    fn test_spawn_finishes_store_and_coalesces_progress() {
        let store = Arc::new(CandidateStore::plain());
        let data: Vec<u8> = (0..5000).flat_map(|i| format!("{}\n", i).into_bytes()).collect();
        let (tx, rx) = mpsc::channel();
        let handle = spawn(
            Source::Stream(Box::new(Cursor::new(data))),
            Arc::clone(&store),
            ReaderOptions { read0: false },
            move |ev| {
                let _ = tx.send(ev);
            },
        );
        handle.join();

        let events: Vec<ReaderEvent> = rx.try_iter().collect();
        assert_eq!(events.last(), Some(&ReaderEvent::Finished(None)));
        // Never acknowledged, so only the first progress got through
        assert_eq!(events.iter().filter(|e| **e == ReaderEvent::Progress).count(), 1);
        assert!(store.is_finished());
        assert_eq!(store.count(), 5000);
    }
}
