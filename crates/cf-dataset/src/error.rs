//! Error types for dataset reading and subsetting.

use thiserror::Error;

/// Result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Error types for dataset reading and subsetting.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A requested data variable is not in the file
    #[error("Variable not found in dataset: {0}")]
    MissingVariable(String),

    /// A coordinate needed for selection is not in the file
    #[error("Coordinate not found in dataset: {0}")]
    MissingCoordinate(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// The selection cannot be applied to the dataset
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// The blocking reader task panicked or was cancelled
    #[error("Reader task failed: {0}")]
    Task(String),
}
