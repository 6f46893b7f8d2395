use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the review pipeline.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File does not exist: '{}'", .0.display())]
    FileNotFound(PathBuf),

    #[error("Account '{path}' not found in account tree (missing segment '{segment}')")]
    AccountNotFound { path: String, segment: String },

    #[error("Cursor {cursor:?} is not a valid path through the account tree")]
    InvalidCursor { cursor: Vec<usize> },

    #[error("Account tree is empty")]
    EmptyAccountTree,

    #[error("Transaction dated {date} has no posting at index {index}")]
    MissingPosting { date: chrono::NaiveDate, index: usize },
}

pub type ReviewResult<T> = Result<T, ReviewError>;
