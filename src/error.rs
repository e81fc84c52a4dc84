// Dataset load errors
// Every variant is fatal at startup; an empty filter result is never an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetLoadError {
    #[error("dataset file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset header is missing column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: malformed row: {source}")]
    MalformedRow {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: invalid date '{value}'")]
    BadDate { line: u64, value: String },

    #[error("line {line}: invalid time '{value}'")]
    BadTime { line: u64, value: String },

    #[error("line {line}: duplicate invoice id '{invoice_id}'")]
    DuplicateInvoice { line: u64, invoice_id: String },

    #[error("line {line}: {message}")]
    Invariant { line: u64, message: String },
}

impl DatasetLoadError {
    /// Data line the error refers to, when it refers to one
    pub fn line(&self) -> Option<u64> {
        match self {
            DatasetLoadError::MalformedRow { line, .. }
            | DatasetLoadError::BadDate { line, .. }
            | DatasetLoadError::BadTime { line, .. }
            | DatasetLoadError::DuplicateInvoice { line, .. }
            | DatasetLoadError::Invariant { line, .. } => Some(*line),
            _ => None,
        }
    }
}
