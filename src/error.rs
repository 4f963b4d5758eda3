//! Error types for the cluster-concordance library.

use std::fmt;
use thiserror::Error;

/// Which of the two label sequences an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    /// Row labels (e.g. cluster ids).
    Rows,
    /// Column labels (e.g. predicted cell types).
    Columns,
}

impl fmt::Display for LabelSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelSide::Rows => write!(f, "row"),
            LabelSide::Columns => write!(f, "column"),
        }
    }
}

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum ConcordanceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Label length mismatch: {rows} row labels vs {cols} column labels")]
    LengthMismatch { rows: usize, cols: usize },

    #[error("Missing {side} label at observation {index}")]
    MissingLabel { index: usize, side: LabelSide },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Unknown column '{0}' in canonical ordering")]
    UnknownColumn(String),

    #[error("Unknown row '{0}' in canonical ordering")]
    UnknownRow(String),

    #[error("Missing column '{0}' in label table")]
    MissingColumn(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConcordanceError {
    /// True for the errors that describe malformed label input
    /// (length mismatch, missing labels, invalid tokens).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ConcordanceError::LengthMismatch { .. }
                | ConcordanceError::MissingLabel { .. }
                | ConcordanceError::InvalidInput(_)
        )
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, ConcordanceError>;
