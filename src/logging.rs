//! File logging.
//!
//! The terminal belongs to the finder while it runs, so logs only go to the
//! file named by `FZX_LOG`. Without it no subscriber is installed and the
//! `tracing` macros are no-ops. The level is taken from `RUST_LOG`, defaulting
//! to `debug`.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FZX_LOG";

/// Install the file subscriber. The returned guard flushes pending records on
/// drop and must live until exit.
pub fn init() -> Option<WorkerGuard> {
    let path = std::env::var_os(LOG_ENV)?;
    let path = Path::new(&path);
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let file_name = path.file_name()?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .ok()?;
    Some(guard)
}
