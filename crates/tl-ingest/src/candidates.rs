//! Candidate tables: one row per (cell, candidate) with score columns.
//!
//! Tables are read with every column as a string so columns the engines do
//! not touch are written back verbatim.

use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tl_model::{CandidateRow, Method};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Separator of the positions in a row context value.
pub const CONTEXT_SEPARATOR: char = '|';

const STDIN_LABEL: &str = "<stdin>";
const STDOUT_LABEL: &str = "<stdout>";

/// Names of the candidate table columns an engine reads.
///
/// `column`, `row` and `kg_id` are always required; the rest are read only
/// when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateColumns {
    /// Optional; absent tables are treated as a single table.
    pub table: String,
    pub column: String,
    pub row: String,
    pub kg_id: String,
    pub method: Option<String>,
    pub pagerank: Option<String>,
    pub retrieval_score: Option<String>,
    pub context: Option<String>,
    pub pseudo_gt: Option<String>,
    pub ignore: Option<String>,
}

impl Default for CandidateColumns {
    fn default() -> Self {
        Self {
            table: "table".to_string(),
            column: "column".to_string(),
            row: "row".to_string(),
            kg_id: "kg_id".to_string(),
            method: None,
            pagerank: None,
            retrieval_score: None,
            context: None,
            pseudo_gt: None,
            ignore: None,
        }
    }
}

/// Read a candidate table from `path`, or stdin when `path` is `None` or `-`.
///
/// # Errors
///
/// Fails when the input cannot be read or parsed as CSV.
pub fn read_candidates(path: Option<&Path>) -> Result<DataFrame> {
    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0));
    let df = match path.filter(|path| path.as_os_str() != "-") {
        Some(path) => options
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| IngestError::csv(path, &e))?
            .finish()
            .map_err(|e| IngestError::csv(path, &e))?,
        None => {
            let mut bytes = Vec::new();
            io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|source| IngestError::FileRead {
                    path: PathBuf::from(STDIN_LABEL),
                    source,
                })?;
            options
                .into_reader_with_file_handle(Cursor::new(bytes))
                .finish()
                .map_err(|e| IngestError::csv(STDIN_LABEL, &e))?
        }
    };
    debug!(rows = df.height(), columns = df.width(), "candidate table read");
    Ok(df)
}

/// Read a column as strings; nulls become empty strings.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] when the column does not exist.
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df.column(name).map_err(|_| IngestError::MissingColumn {
        column: name.to_string(),
        path: PathBuf::from("candidate table"),
    })?;
    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or_default().trim().to_string())
        .collect())
}

fn optional_column(df: &DataFrame, name: Option<&str>) -> Result<Option<Vec<String>>> {
    name.map(|name| string_column(df, name)).transpose()
}

/// Parse a possibly empty score; missing or invalid scores are `NaN`.
pub fn parse_score(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// `1`, `1.0`, `true`, `yes` (any case) are set flags.
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.parse::<f64>().is_ok_and(|n| n != 0.0)
        || ["true", "yes", "y"]
            .iter()
            .any(|flag| value.eq_ignore_ascii_case(flag))
}

/// Split a row context value into positions.
pub fn split_context(value: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    value
        .split(CONTEXT_SEPARATOR)
        .map(|part| part.trim().to_string())
        .collect()
}

/// Build candidate rows from a table, in table order.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] when a required or configured
/// column is absent.
pub fn extract_candidates(df: &DataFrame, columns: &CandidateColumns) -> Result<Vec<CandidateRow>> {
    let height = df.height();
    let tables = if df.get_column_names().iter().any(|name| name.as_str() == columns.table) {
        string_column(df, &columns.table)?
    } else {
        vec![String::new(); height]
    };
    let cells = string_column(df, &columns.column)?;
    let row_ids = string_column(df, &columns.row)?;
    let kg_ids = string_column(df, &columns.kg_id)?;
    let methods = optional_column(df, columns.method.as_deref())?;
    let pageranks = optional_column(df, columns.pagerank.as_deref())?;
    let retrieval = optional_column(df, columns.retrieval_score.as_deref())?;
    let contexts = optional_column(df, columns.context.as_deref())?;
    let pseudo_gt = optional_column(df, columns.pseudo_gt.as_deref())?;
    let ignore = optional_column(df, columns.ignore.as_deref())?;

    let value = |values: &Option<Vec<String>>, index: usize| -> Option<String> {
        values.as_ref().map(|values| values[index].clone())
    };

    let mut rows = Vec::with_capacity(height);
    for index in 0..height {
        let mut row = CandidateRow::new(
            tables[index].clone(),
            cells[index].clone(),
            row_ids[index].clone(),
            kg_ids[index].clone(),
        );
        if let Some(method) = value(&methods, index) {
            row = row.with_method(Method::parse(&method));
        }
        let pagerank = value(&pageranks, index).map_or(f64::NAN, |v| parse_score(&v));
        let retrieval_score = value(&retrieval, index).map_or(f64::NAN, |v| parse_score(&v));
        row = row.with_scores(pagerank, retrieval_score);
        if let Some(context) = value(&contexts, index) {
            row = row.with_context(split_context(&context));
        }
        row = row
            .with_pseudo_gt(value(&pseudo_gt, index).is_some_and(|v| parse_flag(&v)))
            .with_ignored(value(&ignore, index).is_some_and(|v| parse_flag(&v)));
        rows.push(row);
    }
    Ok(rows)
}

/// Append (or replace) a numeric column; `NaN` is written as an empty cell.
///
/// # Errors
///
/// Fails when the length does not match the table height.
pub fn append_f64_column(df: &mut DataFrame, name: &str, values: &[f64]) -> Result<()> {
    let values: Vec<Option<f64>> = values
        .iter()
        .map(|value| (!value.is_nan()).then_some(*value))
        .collect();
    df.with_column(Series::new(name.into(), values))?;
    Ok(())
}

/// Append (or replace) a 0/1 flag column.
///
/// # Errors
///
/// Fails when the length does not match the table height.
pub fn append_flag_column(df: &mut DataFrame, name: &str, values: &[bool]) -> Result<()> {
    let values: Vec<i32> = values.iter().map(|flag| i32::from(*flag)).collect();
    df.with_column(Series::new(name.into(), values))?;
    Ok(())
}

/// Append (or replace) a string column.
///
/// # Errors
///
/// Fails when the length does not match the table height.
pub fn append_str_column(df: &mut DataFrame, name: &str, values: &[String]) -> Result<()> {
    df.with_column(Series::new(name.into(), values))?;
    Ok(())
}

/// Write a table as CSV to `path`, or stdout when `path` is `None` or `-`.
///
/// # Errors
///
/// Fails when the output cannot be created or written.
pub fn write_candidates(df: &mut DataFrame, path: Option<&Path>) -> Result<()> {
    match path.filter(|path| path.as_os_str() != "-") {
        Some(path) => {
            let mut file = File::create(path).map_err(|source| IngestError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(df)
                .map_err(|e| IngestError::csv(path, &e))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            CsvWriter::new(&mut stdout)
                .include_header(true)
                .finish(df)
                .map_err(|e| IngestError::csv(STDOUT_LABEL, &e))?;
            stdout.flush().map_err(|source| IngestError::FileWrite {
                path: PathBuf::from(STDOUT_LABEL),
                source,
            })?;
        }
    }
    Ok(())
}
