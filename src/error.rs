use std::path::PathBuf;

use thiserror::Error;

/// Fetching the CSV text failed before any parsing happened.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("upstream answered HTTP {status}")]
    Status { status: reqwest::StatusCode },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The fetched text is not valid CSV.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("quoted field opened on line {line} is never closed")]
    UnterminatedQuote { line: usize },
}

/// The column policy cannot be applied.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("column {column:?}: link label must not be empty")]
    EmptyLabel { column: String },
    #[error("column {column:?}: invalid date pattern {pattern:?}")]
    InvalidPattern { column: String, pattern: String },
}

/// Everything that can make a load cycle fail.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
