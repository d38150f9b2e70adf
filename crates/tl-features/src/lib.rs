//! Candidate scoring core for table linking.
//!
//! Two engines score the candidates proposed for table cells:
//!
//! - [`context_match`]: agreement between a candidate's property values and
//!   the other cells of its table row
//! - [`semantics`]: agreement between a candidate's classes and the classes
//!   of the column's high-confidence candidates
//!
//! Both take pre-loaded inputs and return score columns aligned with the
//! input rows; neither touches files.

pub mod context_index;
pub mod context_match;
pub mod feature_dict;
pub mod high_confidence;
pub mod idf;
mod partition;
pub mod semantics;
pub mod similarity;

pub use context_index::{ContextIndex, ParsedEntry, parse_context_entry};
pub use context_match::{
    ContextMatch, ContextMatchOutput, RelevanceMode, derive_relevance, fold, match_context,
    match_row,
};
pub use feature_dict::FeatureDictionary;
pub use high_confidence::HighConfidence;
pub use idf::{IdfTable, normalize_high_confidence};
pub use semantics::{SemanticScores, score_semantics};
