use std::path::PathBuf;
use thiserror::Error;

pub mod aggregate;
pub mod aggregator;
pub mod format;
pub mod planner;
pub mod record;
pub mod scanner;
pub mod source;

/// Fatal errors. Any of these aborts the whole run and no result is produced.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input truncated: expected {expected} bytes, read {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("Degree of parallelism must be at least 1")]
    InvalidParallelism,

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ProcessorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcessorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single line could not be turned into a record.
///
/// Recoverable: the scanner skips the line and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing ';' delimiter")]
    MissingDelimiter,

    #[error("value is not of the form -?d+.d")]
    InvalidNumber,
}

/// A skipped line, located by its absolute byte offset in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub offset: usize,
    pub line: String,
    pub error: ParseError,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "byte {}: {} ({:?})", self.offset, self.error, self.line)
    }
}

/// Pipeline states, in the order a run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Planning,
    Dispatch,
    WorkersRunning,
    Joined,
    Merging,
    Formatting,
    Done,
    Aborted,
}
