//! Error types for running checks.
//!
//! Rejected constants and impure routines are diagnostics, not errors. The
//! variants here cover what stops a run: unreadable configuration, malformed
//! input and report files that cannot be written.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualflowError {
    /// The TOML configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A checker option name that is not recognised
    #[error("unknown option `{0}`")]
    UnknownOption(String),

    /// Reading an input or writing a report failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON input or report serialisation failed; this includes routine
    /// bodies that are not valid control-flow graphs
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QualflowError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QualflowError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, QualflowError>;
