//! Tabular collaborators of the scoring engines: candidate tables through
//! polars, lookup and relevance files through the `csv` crate.

pub mod candidates;
pub mod error;
pub mod lookup;
pub mod relevance_file;

pub use candidates::{
    CONTEXT_SEPARATOR, CandidateColumns, append_f64_column, append_flag_column,
    append_str_column, extract_candidates, parse_flag, parse_score, read_candidates,
    split_context, string_column, write_candidates,
};
pub use error::{IngestError, Result};
pub use lookup::{
    CONTEXT_COLUMN, QNODE_COLUMN, delimiter_for, read_context_file, read_feature_file,
    read_key_values,
};
pub use relevance_file::{PROPERTY_SCORES_FILE, read_relevance, relevance_target, write_relevance};
