//! Candidate rows: one competing knowledge-graph entity per table cell.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a candidate was retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    ExactMatch,
    FuzzyAugmented,
    Other(String),
}

impl Method {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "exact-match" => Self::ExactMatch,
            "fuzzy-augmented" => Self::FuzzyAugmented,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ExactMatch => "exact-match",
            Self::FuzzyAugmented => "fuzzy-augmented",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one column of one input table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    pub table: String,
    pub column: String,
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "column {}", self.column)
        } else {
            write!(f, "{} column {}", self.table, self.column)
        }
    }
}

/// Identifies one cell; all candidates of a cell share it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub table: String,
    pub column: String,
    pub row: String,
}

impl CellKey {
    pub fn column_key(&self) -> ColumnKey {
        ColumnKey {
            table: self.table.clone(),
            column: self.column.clone(),
        }
    }
}

/// A candidate entity proposed for one table cell.
///
/// Rows are read-only inputs; engines return new score columns aligned
/// with the input order instead of mutating rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub cell: CellKey,
    pub kg_id: String,
    pub method: Method,
    /// Missing or unparseable scores are `NaN`.
    pub pagerank: f64,
    pub retrieval_score: f64,
    /// Other cell values of the same table row, in column order.
    pub context: Vec<String>,
    /// Row is a pseudo ground truth seed (only meaningful when a
    /// pseudo ground truth column is configured).
    pub pseudo_gt: bool,
    /// Row is excluded from context matching.
    pub ignored: bool,
}

impl CandidateRow {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        row: impl Into<String>,
        kg_id: impl Into<String>,
    ) -> Self {
        Self {
            cell: CellKey {
                table: table.into(),
                column: column.into(),
                row: row.into(),
            },
            kg_id: kg_id.into(),
            method: Method::Other(String::new()),
            pagerank: f64::NAN,
            retrieval_score: f64::NAN,
            context: Vec::new(),
            pseudo_gt: false,
            ignored: false,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_scores(mut self, pagerank: f64, retrieval_score: f64) -> Self {
        self.pagerank = pagerank;
        self.retrieval_score = retrieval_score;
        self
    }

    #[must_use]
    pub fn with_context<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_pseudo_gt(mut self, pseudo_gt: bool) -> Self {
        self.pseudo_gt = pseudo_gt;
        self
    }

    #[must_use]
    pub fn with_ignored(mut self, ignored: bool) -> Self {
        self.ignored = ignored;
        self
    }

    pub fn column_key(&self) -> ColumnKey {
        self.cell.column_key()
    }

    /// Product of pagerank and retrieval score used to rank fuzzy matches.
    pub fn pgr_rts(&self) -> f64 {
        self.pagerank * self.retrieval_score
    }

    pub fn has_candidate(&self) -> bool {
        !self.kg_id.trim().is_empty()
    }
}
