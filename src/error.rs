use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Format error: {0}")]
    Format(String),

    /// `row` is the 1-based worksheet row, header and blank rows included.
    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Store write error: {0}")]
    StoreWrite(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for EtlError {
    fn from(err: rusqlite::Error) -> Self {
        EtlError::StoreWrite(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for EtlError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        EtlError::Format(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
