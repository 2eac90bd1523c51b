use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Configuration and startup errors.
///
/// Query parsing never fails (malformed terms degrade to literals) and a
/// candidate that does not match is not an error, so this covers only what can
/// go wrong before the loop starts or while talking to the terminal.
#[derive(Debug, Error)]
pub enum Error {
    /// `--delimiter` that is neither a plain string nor a valid regex
    #[error("invalid delimiter {0:?}: {1}")]
    InvalidDelimiter(String, #[source] regex::Error),

    /// Bad `--nth` / `--with-nth` expression
    #[error("invalid field expression: {0}")]
    InvalidFieldExpr(String),

    #[error("invalid tiebreak criterion: {0}")]
    InvalidTiebreak(String),

    #[error("unsupported key: {0}")]
    InvalidKey(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("invalid preview window option: {0}")]
    InvalidPreviewWindow(String),

    #[error("invalid algorithm: {0} (expected v1 or v2)")]
    InvalidAlgorithm(String),

    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No controlling terminal or raw mode unavailable
    #[error("failed to initialize terminal: {0}")]
    TerminalInit(#[source] std::io::Error),

    /// Reading candidates from stdin or the default command
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),

    #[error("command failed ({status}): {command}")]
    CommandFailed { command: String, status: ExitStatus },
}

pub type Result<T> = std::result::Result<T, Error>;
