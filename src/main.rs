use anyhow::Result;
use fzx::config::Config;
use fzx::item::reader::{self, ReaderOptions, Source};
use fzx::item::store::CandidateStore;
use fzx::matching::{Merger, PatternBuilder, rank};
use fzx::output::{Output, print_error};
use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

const EXIT_OK: i32 = 0;
const EXIT_NO_MATCH: i32 = 1;
const EXIT_ERROR: i32 = 2;
#[cfg(feature = "interactive")]
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let guard = fzx::logging::init();
    let code = match Config::load() {
        Ok(config) => run(Arc::new(config)).unwrap_or_else(|e| {
            print_error(&e, true);
            EXIT_ERROR
        }),
        Err(e) => {
            print_error(&e.into(), true);
            EXIT_ERROR
        }
    };
    info!(code, "exit");
    drop(guard);
    std::process::exit(code);
}

fn run(config: Arc<Config>) -> Result<i32> {
    let store = Arc::new(CandidateStore::new(config.candidate_builder()));
    let source = Source::detect();

    if let Some(query) = &config.filter {
        load_all(&config, &store, source)?;
        let merger = rank_once(&config, &store, query);
        let found = !merger.is_empty();
        print_filtered(&config, &merger, query)?;
        return Ok(if found { EXIT_OK } else { EXIT_NO_MATCH });
    }

    let source = if config.select_1 || config.exit_0 {
        load_all(&config, &store, source)?;
        let merger = rank_once(&config, &store, &config.query);
        if config.select_1 && merger.len() == 1 {
            let items: Vec<_> = merger.iter().map(|r| r.item).collect();
            print_selection(&config, &config.query, &items)?;
            return Ok(EXIT_OK);
        }
        if config.exit_0 && merger.is_empty() {
            if config.print_query {
                print_selection(&config, &config.query, &[])?;
            }
            return Ok(EXIT_NO_MATCH);
        }
        // Input is already in the store
        Source::Stream(Box::new(io::empty()))
    } else {
        source
    };

    interactive(config, store, source)
}

/// Read the whole input before ranking. A failing source only matters when
/// it produced nothing at all.
fn load_all(config: &Config, store: &CandidateStore, source: Source) -> Result<()> {
    let result = reader::read_source(source, store, ReaderOptions { read0: config.read0 }, || {});
    store.finish();
    match result {
        Err(e) if store.count() == 0 => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "input source failed");
            print_error(&anyhow::Error::from(e), config.color);
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

fn rank_once(config: &Config, store: &CandidateStore, query: &str) -> Merger {
    let pattern = PatternBuilder::new(config.pattern.clone()).build(query);
    let sort = config.rank.sort_cap.is_some();
    rank(&pattern, &store.snapshot(), &config.rank, sort, &AtomicBool::new(false), &|_| {}).unwrap_or_default()
}

fn print_filtered(config: &Config, merger: &Merger, query: &str) -> Result<()> {
    let mut out = Output::stdout(config.print0, config.color);
    if config.with_nth.is_empty() {
        out = out.with_highlight(PatternBuilder::new(config.pattern.clone()).build(query));
    }
    let result = (|| -> io::Result<()> {
        if config.print_query {
            out.query(query)?;
        }
        for r in merger.iter() {
            out.item(&r.item)?;
        }
        out.flush()
    })();
    ignore_broken_pipe(result)
}

fn print_selection(config: &Config, query: &str, items: &[fzx::item::Candidate]) -> Result<()> {
    let mut out = Output::stdout(config.print0, false);
    let result = (|| -> io::Result<()> {
        if config.print_query {
            out.query(query)?;
        }
        for item in items {
            out.item(item)?;
        }
        out.flush()
    })();
    ignore_broken_pipe(result)
}

fn ignore_broken_pipe(result: io::Result<()>) -> Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}

#[cfg(feature = "interactive")]
fn interactive(config: Arc<Config>, store: Arc<CandidateStore>, source: Source) -> Result<i32> {
    use fzx::tui::app::Outcome;

    match fzx::tui::run(Arc::clone(&config), store, source)? {
        Outcome::Accept { query, items } => {
            print_selection(&config, &query, &items)?;
            Ok(if items.is_empty() { EXIT_NO_MATCH } else { EXIT_OK })
        }
        Outcome::Abort => Ok(EXIT_INTERRUPTED),
    }
}

#[cfg(not(feature = "interactive"))]
fn interactive(_config: Arc<Config>, _store: Arc<CandidateStore>, _source: Source) -> Result<i32> {
    anyhow::bail!("built without the interactive finder; use --filter")
}
