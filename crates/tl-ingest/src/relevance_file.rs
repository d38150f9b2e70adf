//! Saved property relevance (`property_scores.csv`).

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use tl_model::PropertyRelevance;
use tracing::info;

use crate::error::{IngestError, Result};

/// File name used when the target path is a directory.
pub const PROPERTY_SCORES_FILE: &str = "property_scores.csv";

/// Resolve the file a relevance table is written to.
pub fn relevance_target(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(PROPERTY_SCORES_FILE)
    } else {
        path.to_path_buf()
    }
}

/// Write relevance records as CSV and return the file written.
///
/// # Errors
///
/// Fails when the file cannot be created or written.
pub fn write_relevance(path: &Path, records: &[PropertyRelevance]) -> Result<PathBuf> {
    let target = relevance_target(path);
    let write_error = |source| IngestError::FileWrite {
        path: target.clone(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(&target)
        .map_err(|error| IngestError::csv(&target, &error))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|error| IngestError::csv(&target, &error))?;
    }
    writer.flush().map_err(write_error)?;
    info!(path = %target.display(), records = records.len(), "property scores saved");
    Ok(target)
}

/// Read relevance records written by [`write_relevance`].
///
/// # Errors
///
/// Fails when the file cannot be read or a record does not parse.
pub fn read_relevance(path: &Path) -> Result<Vec<PropertyRelevance>> {
    let target = relevance_target(path);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(&target)
        .map_err(|error| match error.into_kind() {
            csv::ErrorKind::Io(source) => IngestError::FileRead {
                path: target.clone(),
                source,
            },
            other => IngestError::CsvParse {
                path: target.clone(),
                message: format!("{other:?}"),
            },
        })?;
    reader
        .deserialize()
        .map(|record| record.map_err(|error| IngestError::csv(&target, &error)))
        .collect()
}
