//! Placeholder expansion and the preview process runner.
//!
//! Placeholders in `--preview` and `execute(...)` templates:
//!
//! - `{}` the current line, `{+}` the selected lines (current when none)
//! - `{q}` the query, `{n}` the zero-based index, `{+n}` selected indexes
//! - `{1}`, `{-1}`, `{2..}`, `{..3}`, `{1,3}` fields of the line
//! - `{s2..}` keeps the field whitespace
//! - `\{}` a literal `{}`
//!
//! Every substituted value is single-quoted for the shell.

use crate::item::candidate::Candidate;
use crate::item::tokenizer::{Delimiter, join_tokens, parse_ranges, strip_last_delimiter, tokenize, transform};
use crate::tui::event::AppEvent;
use regex::Regex;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, LazyLock, Mutex};
use std::thread;
use tracing::{debug, trace, warn};

/// Preview output beyond this is dropped
const PREVIEW_MAX_BYTES: u64 = 1 << 20;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\?\{[+s]*(?:q|n|-?[0-9]*(?:\.\.-?[0-9]*)?(?:,-?[0-9]*(?:\.\.-?[0-9]*)?)*)\}").expect("placeholder regex")
});

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]|\x1b\][^\x07]*\x07").expect("escape regex"));

/// What placeholders expand against
pub struct PlaceholderContext<'a> {
    pub current: Option<&'a Candidate>,
    pub selected: &'a [Candidate],
    pub query: &'a str,
    pub delimiter: &'a Delimiter,
}

/// Quote `s` for `sh`.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Whether `template` refers to the selection or the current line
pub fn has_item_placeholder(template: &str) -> bool {
    PLACEHOLDER.find_iter(template).any(|m| {
        let s = m.as_str();
        !s.starts_with('\\') && s != "{q}"
    })
}

/// Substitute every placeholder in `template`.
pub fn expand(template: &str, ctx: &PlaceholderContext<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let whole = &caps[0];
            if let Some(escaped) = whole.strip_prefix('\\') {
                return escaped.to_string();
            }
            let inner = &whole[1..whole.len() - 1];
            let flags_len = inner.find(|c: char| c != '+' && c != 's').unwrap_or(inner.len());
            let (flags, expr) = inner.split_at(flags_len);
            let plus = flags.contains('+');
            let preserve = flags.contains('s');

            if expr == "q" {
                return quote(ctx.query);
            }
            let items: Vec<&Candidate> = if plus && !ctx.selected.is_empty() {
                ctx.selected.iter().collect()
            } else {
                ctx.current.into_iter().collect()
            };
            if items.is_empty() {
                return "''".to_string();
            }
            let values: Vec<String> = items
                .iter()
                .map(|item| match expr {
                    "n" => item.index().to_string(),
                    "" => quote(&item.as_str()),
                    fields => quote(&select_fields(item, fields, preserve, ctx.delimiter)),
                })
                .collect();
            values.join(" ")
        })
        .into_owned()
}

fn select_fields(item: &Candidate, expr: &str, preserve: bool, delimiter: &Delimiter) -> String {
    let Ok(ranges) = parse_ranges(expr) else {
        return String::new();
    };
    let fields = transform(&tokenize(&item.as_str(), delimiter), &ranges);
    if preserve {
        return join_tokens(&fields);
    }
    fields
        .iter()
        .map(|t| strip_last_delimiter(&t.text.to_string(), delimiter).trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove terminal escape sequences; the pane renders plain text.
pub fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE.replace_all(s, "").into_owned()
}

/// Process slot shared by the preview threads
#[derive(Default)]
struct Running {
    /// Newest requested generation; older threads never spawn
    latest: u64,
    child: Option<(u64, Child)>,
}

impl Running {
    fn kill(&mut self) {
        if let Some((generation, mut child)) = self.child.take() {
            trace!(generation, "killing preview process");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Runs preview commands off the loop thread. A new request kills the
/// process of the previous one.
pub struct Previewer {
    tx: Sender<AppEvent>,
    running: Arc<Mutex<Running>>,
}

impl Previewer {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self {
            tx,
            running: Arc::new(Mutex::new(Running::default())),
        }
    }

    pub fn request(&self, generation: u64, command: String) {
        {
            let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
            running.latest = running.latest.max(generation);
            running.kill();
        }
        let tx = self.tx.clone();
        let running = Arc::clone(&self.running);
        let spawned = thread::Builder::new().name("fzx-preview".into()).spawn(move || {
            if let Some(output) = run_command(generation, &command, &running) {
                let _ = tx.send(AppEvent::PreviewOutput { generation, output });
            }
        });
        if let Err(e) = spawned {
            warn!(error = %e, "failed to start preview thread");
        }
    }

    /// Kill the running preview process, if any
    pub fn kill(&self) {
        self.running.lock().unwrap_or_else(|e| e.into_inner()).kill();
    }
}

impl Drop for Previewer {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Run `command` unless a newer request came in first. Returns `None` when
/// superseded before the process started.
fn run_command(generation: u64, command: &str, running: &Mutex<Running>) -> Option<Result<String, String>> {
    // Spawning under the lock keeps an older thread from replacing a newer
    // process in the slot
    let stdout = {
        let mut slot = running.lock().unwrap_or_else(|e| e.into_inner());
        if generation < slot.latest {
            trace!(generation, "preview superseded before start");
            return None;
        }
        slot.kill();
        debug!(command, "preview");
        let spawned = Command::new("sh")
            .arg("-c")
            .arg(format!("exec 2>&1\n{}", command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match spawned {
            Ok(c) => c,
            Err(e) => return Some(Err(format!("failed to run preview command: {}", e))),
        };
        let stdout = child.stdout.take();
        slot.child = Some((generation, child));
        stdout
    };

    let mut buf = Vec::new();
    if let Some(out) = stdout {
        if let Err(e) = out.take(PREVIEW_MAX_BYTES).read_to_end(&mut buf) {
            return Some(Err(format!("failed to read preview output: {}", e)));
        }
    }

    // Reap unless a newer request already killed it
    let status = {
        let mut slot = running.lock().unwrap_or_else(|e| e.into_inner());
        match slot.child.take() {
            Some((g, child)) if g == generation => Some(child),
            other => {
                slot.child = other;
                None
            }
        }
    }
    .and_then(|mut child| child.wait().ok());

    let text = strip_ansi(&String::from_utf8_lossy(&buf));
    Some(match status {
        Some(s) if !s.success() && text.is_empty() => Err(format!("preview command failed ({})", s)),
        _ => Ok(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::mpsc::{self, Receiver};
    use std::time::{Duration, Instant};

    fn item(index: u32, text: &str) -> Candidate {
        Candidate::from_raw(index, Arc::from(text.as_bytes()))
    }

    fn ctx<'a>(current: Option<&'a Candidate>, selected: &'a [Candidate], delimiter: &'a Delimiter) -> PlaceholderContext<'a> {
        PlaceholderContext {
            current,
            selected,
            query: "it's",
            delimiter,
        }
    }

    #[test]
    fn test_basic_placeholders() {
        let cur = item(4, "src/main.rs:10: fn main");
        let d = Delimiter::Awk;
        let c = ctx(Some(&cur), &[], &d);
        assert_eq!(expand("cat {}", &c), "cat 'src/main.rs:10: fn main'");
        assert_eq!(expand("echo {q}", &c), r"echo 'it'\''s'");
        assert_eq!(expand("echo {n}", &c), "echo 4");
        assert_eq!(expand(r"echo \{} {}", &c), "echo {} 'src/main.rs:10: fn main'");
    }

    #[test]
    fn test_field_placeholders() {
        let cur = item(0, "src/main.rs:10: fn main");
        let d = Delimiter::parse(":").unwrap();
        let c = ctx(Some(&cur), &[], &d);
        assert_eq!(expand("{1}", &c), "'src/main.rs'");
        assert_eq!(expand("{2}", &c), "'10'");
        assert_eq!(expand("{-1}", &c), "'fn main'");
        assert_eq!(expand("{1,2}", &c), "'src/main.rs 10'");
        assert_eq!(expand("{2..}", &c), "'10: fn main'");
        assert_eq!(expand("{s3}", &c), "' fn main'");

        let d = Delimiter::Awk;
        let cur = item(0, "  alpha  beta gamma");
        let c = ctx(Some(&cur), &[], &d);
        assert_eq!(expand("{..2}", &c), "'alpha  beta'");
    }

    #[test]
    fn test_selected_placeholder() {
        let cur = item(0, "a");
        let sel = vec![item(1, "b"), item(2, "c d")];
        let d = Delimiter::Awk;
        assert_eq!(expand("rm {+}", &ctx(Some(&cur), &sel, &d)), "rm 'b' 'c d'");
        assert_eq!(expand("rm {+}", &ctx(Some(&cur), &[], &d)), "rm 'a'");
        assert_eq!(expand("{+n}", &ctx(Some(&cur), &sel, &d)), "1 2");
        assert_eq!(expand("cat {}", &ctx(None, &[], &d)), "cat ''");
    }

    #[test]
    fn test_has_item_placeholder() {
        assert!(has_item_placeholder("cat {}"));
        assert!(has_item_placeholder("echo {2}"));
        assert!(!has_item_placeholder("echo {q}"));
        assert!(!has_item_placeholder(r"echo \{}"));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;31mred\x1b[0m plain"), "red plain");
    }

    #[test]
    fn test_previewer_runs_command() {
        let (tx, rx) = mpsc::channel();
        let previewer = Previewer::new(tx);
        previewer.request(7, "echo hello; echo oops >&2".to_string());
        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            AppEvent::PreviewOutput { generation, output } => {
                assert_eq!(generation, 7);
                assert_eq!(output.unwrap(), "hello\noops\n");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_previewer_reports_failure() {
        let (tx, rx) = mpsc::channel();
        let previewer = Previewer::new(tx);
        previewer.request(1, "exit 3".to_string());
        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            AppEvent::PreviewOutput { output, .. } => assert!(output.is_err()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    /// Wait for the output of `generation`, skipping older ones
    fn output_of(rx: &Receiver<AppEvent>, generation: u64) -> Result<String, String> {
        loop {
            match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
                AppEvent::PreviewOutput { generation: g, output } if g == generation => return output,
                AppEvent::PreviewOutput { .. } => continue,
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    fn is_alive(pid: &str) -> bool {
        Command::new("kill")
            .arg("-0")
            .arg(pid)
            .stderr(Stdio::null())
            .status()
            .unwrap()
            .success()
    }

    fn read_pid(path: &Path) -> Option<String> {
        let pid = std::fs::read_to_string(path).ok()?;
        let pid = pid.trim();
        (!pid.is_empty()).then(|| pid.to_string())
    }

    #[test]
    fn test_new_request_kills_previous_process() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("first.pid");
        let (tx, rx) = mpsc::channel();
        let previewer = Previewer::new(tx);
        previewer.request(1, format!("echo $$ > '{}'; exec sleep 5", pid_file.display()));

        let deadline = Instant::now() + Duration::from_secs(5);
        let pid = loop {
            if let Some(pid) = read_pid(&pid_file) {
                break pid;
            }
            assert!(Instant::now() < deadline, "first preview never started");
            thread::sleep(Duration::from_millis(10));
        };
        assert!(is_alive(&pid));

        previewer.request(2, "echo x".to_string());
        assert_eq!(output_of(&rx, 2).unwrap(), "x\n");
        assert!(!is_alive(&pid));
    }

    #[test]
    fn test_back_to_back_requests_leave_no_process() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("first.pid");
        let (tx, rx) = mpsc::channel();
        let previewer = Previewer::new(tx);
        previewer.request(1, format!("echo $$ > '{}'; exec sleep 5", pid_file.display()));
        previewer.request(2, "echo x".to_string());
        assert_eq!(output_of(&rx, 2).unwrap(), "x\n");

        // The first process was either never started or already killed
        if let Some(pid) = read_pid(&pid_file) {
            assert!(!is_alive(&pid));
        }
    }
}
