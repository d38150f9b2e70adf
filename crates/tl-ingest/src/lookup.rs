//! Candidate lookup files: context values and class features.
//!
//! Both are delimited files keyed by a `qnode` column. Paths ending in
//! `.gz` are decompressed on the fly.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Key column shared by all lookup files.
pub const QNODE_COLUMN: &str = "qnode";

/// Value column of context files.
pub const CONTEXT_COLUMN: &str = "context";

fn open_text(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    if is_gzip(path) {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Tab for `.tsv` and `.tsv.gz`, comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".tsv") { b'\t' } else { b',' }
}

/// Read `(key, value)` pairs from two named columns of a delimited file.
///
/// Tab-delimited files are read without quote handling so values keep
/// embedded quotes verbatim.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed, or lacks either column.
pub fn read_key_values(
    path: &Path,
    delimiter: u8,
    key_column: &str,
    value_column: &str,
) -> Result<Vec<(String, String)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .quoting(delimiter != b'\t')
        .flexible(true)
        .from_reader(open_text(path)?);

    let headers = reader
        .headers()
        .map_err(|error| IngestError::csv(path, &error))?
        .clone();
    let position = |column: &str| {
        headers
            .iter()
            .position(|header| header.trim().trim_matches('\u{feff}') == column)
            .ok_or_else(|| IngestError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            })
    };
    let key_index = position(key_column)?;
    let value_index = position(value_column)?;

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| IngestError::csv(path, &error))?;
        let key = record.get(key_index).unwrap_or("").trim();
        if key.is_empty() {
            continue;
        }
        let value = record.get(value_index).unwrap_or("").trim();
        pairs.push((key.to_string(), value.to_string()));
    }
    debug!(path = %path.display(), records = pairs.len(), "lookup file read");
    Ok(pairs)
}

/// Read a context file (`qnode`, `context`; tab-separated).
///
/// # Errors
///
/// See [`read_key_values`].
pub fn read_context_file(path: &Path) -> Result<Vec<(String, String)>> {
    read_key_values(path, b'\t', QNODE_COLUMN, CONTEXT_COLUMN)
}

/// Read a feature file (`qnode`, `<feature_name>`).
///
/// # Errors
///
/// See [`read_key_values`].
pub fn read_feature_file(path: &Path, feature_name: &str) -> Result<Vec<(String, String)>> {
    read_key_values(path, delimiter_for(path), QNODE_COLUMN, feature_name)
}
