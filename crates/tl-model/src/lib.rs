//! Shared data model for table linking: candidate rows, context entries,
//! property relevance, engine options and the error taxonomy.

pub mod candidate;
pub mod context;
pub mod error;
pub mod options;
pub mod relevance;

pub use candidate::{CandidateRow, CellKey, ColumnKey, Method};
pub use context::{ContextEntry, PropertyMatch, ValueType};
pub use error::{Result, TlError};
pub use options::{ContextMatchOptions, ContextSource, SemanticOptions, Thresholds};
pub use relevance::{ColumnRelevance, PropertyRelevance, RelevanceTable};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trips_known_labels() {
        assert_eq!(Method::parse("exact-match"), Method::ExactMatch);
        assert_eq!(Method::parse(" fuzzy-augmented "), Method::FuzzyAugmented);
        assert_eq!(Method::parse("ngram").as_str(), "ngram");
    }

    #[test]
    fn pgr_rts_is_product() {
        let row = CandidateRow::new("t", "0", "1", "Q1").with_scores(0.5, 0.4);
        assert!((row.pgr_rts() - 0.2).abs() < 1e-12);
    }
}
