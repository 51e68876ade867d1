// Error types shared by the loading, splitting, training and prediction stages.
use thiserror::Error;

/// A single malformed CSV row. Line numbers are 1-based and count the header.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: header row cannot be parsed as a record")]
    HeaderRow { line: u64 },

    #[error("line {line}: invalid value for `{column}`: {reason}")]
    InvalidField {
        line: u64,
        column: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv reader failed: {0}")]
    Csv(#[from] csv::Error),

    /// Loading is all-or-nothing: the first bad row aborts it.
    #[error("failed to load dataset: {0}")]
    Load(#[from] ParseError),

    #[error("dataset has no data rows")]
    EmptyDataset,

    #[error("train ratio must be in (0, 1], got {0}")]
    InvalidRatio(f64),

    #[error("expected {expected} feature values, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{predictions} predictions for {targets} targets")]
    LengthMismatch { predictions: usize, targets: usize },

    #[error("model error: {0}")]
    Model(String),

    #[error("training cancelled after {epochs} epochs")]
    Cancelled { epochs: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
