//! Error types for table linking data ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing tables and lookup files.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to open or read a file (or stdin).
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write a file (or stdout).
    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited file.
    #[error("failed to parse {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Required column not found in a file or table.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl IngestError {
    pub(crate) fn csv(path: impl Into<PathBuf>, error: &impl std::fmt::Display) -> Self {
        Self::CsvParse {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::MissingColumn {
            column: "kg_id".to_string(),
            path: PathBuf::from("candidates.csv"),
        };
        assert_eq!(
            err.to_string(),
            "required column 'kg_id' not found in candidates.csv"
        );
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
