//! Errors raised by the columnar writers.

/// Error type for Parquet/Arrow operations.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Parquet encoding or file-level failure.
    #[error("Parquet read/write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow array or schema failure.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Underlying file I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested table layout is unusable.
    #[error("invalid table schema: {0}")]
    Schema(String),

    /// Write attempted after the table was closed.
    #[error("table already finished")]
    Finished,
}

impl From<TableError> for btv_core::Error {
    fn from(e: TableError) -> Self {
        match e {
            TableError::Io(io) => btv_core::Error::Io(io),
            other => btv_core::Error::Validation(other.to_string()),
        }
    }
}
