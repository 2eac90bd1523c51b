//! Command-line and config-file options.
//!
//! The CLI is parsed once with clap and merged with the optional JSON config
//! file into an immutable [`Config`]. Command-line values win over file values.

use crate::error::{Error, Result};
use crate::item::candidate::Candidate;
use crate::item::chars::Chars;
use crate::item::store::CandidateBuilder;
use crate::item::tokenizer::{Delimiter, Range, join_tokens, parse_ranges, strip_last_delimiter, tokenize, transform};
use crate::matching::algo::FuzzyAlgo;
use crate::matching::pattern::{CaseMode, PatternOptions};
use crate::matching::ranker::{DEFAULT_SORT_CAP, RankOptions};
use crate::matching::result::Tiebreak;
use crate::matching::scoring::ScoringWeights;
use clap::Parser;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Parser, Debug, Default)]
#[command(name = "fzx")]
#[command(version, about = "Interactive fuzzy finder for the terminal")]
pub struct Cli {
    /// Extended-search mode (default)
    #[arg(short = 'x', long)]
    pub extended: bool,

    /// Disable extended-search mode (+x)
    #[arg(long)]
    pub no_extended: bool,

    /// Exact-match terms by default
    #[arg(short = 'e', long)]
    pub exact: bool,

    /// Fuzzy algorithm: v1 (faster, greedy) or v2 (optimal)
    #[arg(long, value_name = "TYPE")]
    pub algo: Option<String>,

    /// Case-insensitive match
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Case-sensitive match (+i)
    #[arg(long)]
    pub no_ignore_case: bool,

    /// Do not normalize latin script letters
    #[arg(long)]
    pub literal: bool,

    /// Field delimiter regex (default: AWK-style)
    #[arg(short = 'd', long, value_name = "STR")]
    pub delimiter: Option<String>,

    /// Comma-separated field index expressions to limit search scope
    #[arg(short = 'n', long, value_name = "N[,..]")]
    pub nth: Option<String>,

    /// Transform the presentation of each line using field expressions
    #[arg(long, value_name = "N[,..]")]
    pub with_nth: Option<String>,

    /// Sort the result, fully ranking at most N matches
    #[arg(short = 's', long, value_name = "N", num_args = 0..=1, default_missing_value = "1000")]
    pub sort: Option<usize>,

    /// Do not sort the result (+s)
    #[arg(long)]
    pub no_sort: bool,

    /// Reverse the order of the input
    #[arg(long)]
    pub tac: bool,

    /// Comma-separated sort criteria: length, begin, end, index
    #[arg(long, value_name = "CRI[,..]")]
    pub tiebreak: Option<String>,

    /// Enable multi-select, optionally limited to MAX items
    #[arg(short = 'm', long, value_name = "MAX", num_args = 0..=1, default_missing_value = "0")]
    pub multi: Option<usize>,

    /// Disable multi-select (+m)
    #[arg(long)]
    pub no_multi: bool,

    /// Custom key bindings: KEY:ACTION[+ACTION],...
    #[arg(long, value_name = "KEYBINDS")]
    pub bind: Vec<String>,

    /// Start the finder with the given query
    #[arg(short = 'q', long, value_name = "STR")]
    pub query: Option<String>,

    /// Filter mode: print matches for the query and exit
    #[arg(short = 'f', long, value_name = "STR")]
    pub filter: Option<String>,

    /// Automatically select the only match
    #[arg(short = '1', long = "select-1")]
    pub select_1: bool,

    /// Exit immediately when there is no match
    #[arg(short = '0', long = "exit-0")]
    pub exit_0: bool,

    /// Print the query as the first line
    #[arg(long)]
    pub print_query: bool,

    /// Read input delimited by ASCII NUL characters
    #[arg(long)]
    pub read0: bool,

    /// Print output delimited by ASCII NUL characters
    #[arg(long)]
    pub print0: bool,

    /// Command to preview the current item
    #[arg(long, value_name = "COMMAND")]
    pub preview: Option<String>,

    /// Preview window layout: [right|left|up|down][:SIZE%][:hidden]
    #[arg(long, value_name = "OPTS")]
    pub preview_window: Option<String>,

    /// Input prompt
    #[arg(long, value_name = "STR")]
    pub prompt: Option<String>,

    /// Header line shown above the list
    #[arg(long, value_name = "STR")]
    pub header: Option<String>,

    /// Wrap around when moving past either end of the list
    #[arg(long)]
    pub cycle: bool,

    /// Disable mouse
    #[arg(long)]
    pub no_mouse: bool,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Config file (default: <config dir>/fzx/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Options that take a separate value argument
const VALUE_OPTIONS: &[&str] = &[
    "--algo",
    "-d",
    "--delimiter",
    "-n",
    "--nth",
    "--with-nth",
    "--tiebreak",
    "--bind",
    "-q",
    "--query",
    "-f",
    "--filter",
    "--preview",
    "--preview-window",
    "--prompt",
    "--header",
    "--config",
];

/// Rewrite the traditional `+x` style toggles to their long forms.
pub fn rewrite_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out: Vec<OsString> = Vec::new();
    let mut takes_value = false;
    let mut after_dashes = false;
    for arg in args {
        let rewritten = match arg.to_str() {
            _ if takes_value || after_dashes => None,
            Some("+s") => Some("--no-sort"),
            Some("+i") => Some("--no-ignore-case"),
            Some("+x") => Some("--no-extended"),
            Some("+m") => Some("--no-multi"),
            _ => None,
        };
        let s = arg.to_str().unwrap_or_default();
        after_dashes |= s == "--";
        takes_value = !takes_value && VALUE_OPTIONS.contains(&s);
        out.push(rewritten.map(OsString::from).unwrap_or(arg));
    }
    out
}

/// Defaults loaded from the config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub prompt: Option<String>,
    pub bind: Vec<String>,
    pub tiebreak: Option<String>,
    pub sort: Option<usize>,
    pub preview_window: Option<String>,
    pub scoring: ScoringWeights,
}

impl FileConfig {
    /// Load `path`, or the default location when `None`. A missing default
    /// file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let config: FileConfig =
            serde_json::from_str(&data).map_err(|source| Error::ConfigParse { path: path.clone(), source })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fzx").join("config.json"))
}

/// Where the preview pane sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewPosition {
    #[default]
    Right,
    Left,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewWindow {
    pub position: PreviewPosition,
    /// Percentage of the screen, 1..=99
    pub size: u16,
    pub hidden: bool,
}

impl Default for PreviewWindow {
    fn default() -> Self {
        Self {
            position: PreviewPosition::Right,
            size: 50,
            hidden: false,
        }
    }
}

impl std::str::FromStr for PreviewWindow {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut window = PreviewWindow::default();
        for opt in s.split(':').filter(|o| !o.is_empty()) {
            match opt {
                "right" => window.position = PreviewPosition::Right,
                "left" => window.position = PreviewPosition::Left,
                "up" | "top" => window.position = PreviewPosition::Up,
                "down" | "bottom" => window.position = PreviewPosition::Down,
                "hidden" => window.hidden = true,
                "nohidden" => window.hidden = false,
                size => {
                    let size = size
                        .strip_suffix('%')
                        .and_then(|n| n.parse::<u16>().ok())
                        .filter(|n| (1..100).contains(n))
                        .ok_or_else(|| Error::InvalidPreviewWindow(opt.to_string()))?;
                    window.size = size;
                }
            }
        }
        Ok(window)
    }
}

/// Session configuration. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub pattern: PatternOptions,
    pub rank: RankOptions,
    pub with_nth: Vec<Range>,
    pub query: String,
    pub filter: Option<String>,
    /// `None` when multi-select is off; `Some(0)` means unlimited
    pub multi: Option<usize>,
    pub bind: Vec<String>,
    pub select_1: bool,
    pub exit_0: bool,
    pub print_query: bool,
    pub read0: bool,
    pub print0: bool,
    pub preview: Option<String>,
    pub preview_window: PreviewWindow,
    pub prompt: String,
    pub header: Option<String>,
    pub cycle: bool,
    pub mouse: bool,
    pub color: bool,
}

impl Config {
    /// Parse the process arguments and the config file.
    pub fn load() -> Result<Self> {
        let cli = Cli::parse_from(rewrite_args(std::env::args_os()));
        let file = FileConfig::load(cli.config.as_deref())?;
        Self::build(cli, file)
    }

    pub fn build(cli: Cli, file: FileConfig) -> Result<Self> {
        let tiebreak = match cli.tiebreak.as_deref().or(file.tiebreak.as_deref()) {
            Some(s) => s.parse::<Tiebreak>()?,
            None => Tiebreak::default(),
        };
        let delimiter = match &cli.delimiter {
            Some(d) => Delimiter::parse(d)?,
            None => Delimiter::Awk,
        };
        let nth = cli.nth.as_deref().map(parse_ranges).transpose()?.unwrap_or_default();
        let with_nth = cli.with_nth.as_deref().map(parse_ranges).transpose()?.unwrap_or_default();
        let algo = match &cli.algo {
            Some(a) => a.parse::<FuzzyAlgo>()?,
            None => FuzzyAlgo::default(),
        };
        let case = if cli.no_ignore_case {
            CaseMode::Respect
        } else if cli.ignore_case {
            CaseMode::Ignore
        } else {
            CaseMode::Smart
        };
        if !file.scoring.is_consistent() {
            warn!(weights = ?file.scoring, "scoring weights break the expected ordering");
        }

        let pattern = PatternOptions {
            fuzzy: !cli.exact,
            algo,
            extended: !cli.no_extended,
            case,
            normalize: !cli.literal,
            forward: tiebreak.forward(),
            nth,
            delimiter,
            weights: file.scoring,
        };
        let sort_cap = if cli.no_sort {
            None
        } else {
            Some(cli.sort.or(file.sort).unwrap_or(DEFAULT_SORT_CAP))
        };
        let rank = RankOptions {
            sort_cap,
            tac: cli.tac,
            tiebreak,
        };
        let preview_window = match cli.preview_window.as_deref().or(file.preview_window.as_deref()) {
            Some(s) => s.parse()?,
            None => PreviewWindow::default(),
        };
        let mut bind = file.bind;
        bind.extend(cli.bind);

        Ok(Self {
            pattern,
            rank,
            with_nth,
            query: cli.query.unwrap_or_default(),
            filter: cli.filter,
            multi: if cli.no_multi { None } else { cli.multi },
            bind,
            select_1: cli.select_1,
            exit_0: cli.exit_0,
            print_query: cli.print_query,
            read0: cli.read0,
            print0: cli.print0,
            preview: cli.preview,
            preview_window,
            prompt: cli.prompt.or(file.prompt).unwrap_or_else(|| "> ".to_string()),
            header: cli.header,
            cycle: cli.cycle,
            mouse: !cli.no_mouse,
            color: !cli.no_color,
        })
    }

    /// Builds candidates for the store, applying `--with-nth` to the display
    /// text.
    pub fn candidate_builder(&self) -> CandidateBuilder {
        if self.with_nth.is_empty() {
            return Box::new(|index: u32, data: &[u8]| Some(Candidate::from_raw(index, Arc::from(data))));
        }
        let ranges = self.with_nth.clone();
        let delimiter = self.pattern.delimiter.clone();
        Box::new(move |index: u32, data: &[u8]| {
            let line = String::from_utf8_lossy(data);
            let tokens = transform(&tokenize(&line, &delimiter), &ranges);
            let display = strip_last_delimiter(&join_tokens(&tokens), &delimiter);
            Some(Candidate::new(index, Arc::from(data), Chars::from_text(&display)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::result::Criterion;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    fn config(list: &[&str]) -> Result<Config> {
        let mut full = vec!["fzx"];
        full.extend_from_slice(list);
        let cli = Cli::try_parse_from(rewrite_args(args(&full))).unwrap();
        Config::build(cli, FileConfig::default())
    }

    #[test]
    fn test_rewrite_plus_flags() {
        let out = rewrite_args(args(&["fzx", "+s", "+i", "-q", "+s", "+m", "--", "+x"]));
        assert_eq!(out, args(&["fzx", "--no-sort", "--no-ignore-case", "-q", "+s", "--no-multi", "--", "+x"]));
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]).unwrap();
        assert!(c.pattern.extended);
        assert!(c.pattern.fuzzy);
        assert_eq!(c.pattern.case, CaseMode::Smart);
        assert_eq!(c.rank.sort_cap, Some(DEFAULT_SORT_CAP));
        assert_eq!(c.rank.tiebreak, Tiebreak::default());
        assert_eq!(c.multi, None);
        assert_eq!(c.prompt, "> ");
        assert!(c.mouse && c.color);
    }

    #[test]
    fn test_flags() {
        let c = config(&["+x", "-e", "+i", "--literal", "+s", "--tac", "-m", "--algo=v1"]).unwrap();
        assert!(!c.pattern.extended);
        assert!(!c.pattern.fuzzy);
        assert_eq!(c.pattern.case, CaseMode::Respect);
        assert!(!c.pattern.normalize);
        assert_eq!(c.rank.sort_cap, None);
        assert!(c.rank.tac);
        assert_eq!(c.multi, Some(0));
        assert_eq!(c.pattern.algo, FuzzyAlgo::V1);

        let c = config(&["--sort=50", "--multi=3", "-i"]).unwrap();
        assert_eq!(c.rank.sort_cap, Some(50));
        assert_eq!(c.multi, Some(3));
        assert_eq!(c.pattern.case, CaseMode::Ignore);
    }

    #[test]
    fn test_tiebreak_sets_direction() {
        let c = config(&["--tiebreak=end,begin"]).unwrap();
        assert_eq!(c.rank.tiebreak.criteria(), &[Criterion::Score, Criterion::End, Criterion::Begin]);
        assert!(!c.pattern.forward);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(config(&["--tiebreak=foo"]), Err(Error::InvalidTiebreak(_))));
        assert!(matches!(config(&["--nth=x"]), Err(Error::InvalidFieldExpr(_))));
        assert!(matches!(config(&["--algo=v3"]), Err(Error::InvalidAlgorithm(_))));
        assert!(matches!(config(&["--preview-window=huge"]), Err(Error::InvalidPreviewWindow(_))));
    }

    #[test]
    fn test_preview_window() {
        let w: PreviewWindow = "down:30%:hidden".parse().unwrap();
        assert_eq!(w.position, PreviewPosition::Down);
        assert_eq!(w.size, 30);
        assert!(w.hidden);
        assert!("left:100%".parse::<PreviewWindow>().is_err());
    }

    #[test]
    fn test_file_config_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"prompt": "$ ", "sort": 10, "bind": ["ctrl-j:down"], "scoring": {"bonus_boundary": 9}}"#,
        )
        .unwrap();
        let file = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(file.scoring.bonus_boundary, 9);
        assert_eq!(file.scoring.score_match, ScoringWeights::default().score_match);

        let cli = Cli::try_parse_from(args(&["fzx", "--bind", "ctrl-k:up", "--prompt", "> "])).unwrap();
        let c = Config::build(cli, file).unwrap();
        assert_eq!(c.prompt, "> ");
        assert_eq!(c.rank.sort_cap, Some(10));
        assert_eq!(c.bind, vec!["ctrl-j:down", "ctrl-k:up"]);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_with_nth_builder() {
        let c = config(&["--with-nth=2..", "-d", ":"]).unwrap();
        let build = c.candidate_builder();
        let item = build(0, b"a:b:c").unwrap();
        assert_eq!(item.text().to_string(), "b:c");
        assert_eq!(item.raw(), b"a:b:c");
    }
}
