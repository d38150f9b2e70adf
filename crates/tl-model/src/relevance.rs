//! Property relevance: which property explains each row position of a column.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::candidate::ColumnKey;

/// The significant property of one row position within one column.
///
/// Persisted as one CSV record so a later run can reuse it instead of
/// deriving it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRelevance {
    #[serde(default)]
    pub table: String,
    pub column: String,
    pub position: usize,
    pub property: String,
    /// Number of rows whose best match at this position was `property`.
    pub matches: usize,
    /// Lowest similarity with which `property` matched at this position.
    pub min_similarity: f64,
}

impl PropertyRelevance {
    pub fn column_key(&self) -> ColumnKey {
        ColumnKey {
            table: self.table.clone(),
            column: self.column.clone(),
        }
    }
}

/// Significant properties for one column, ordered by rank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRelevance {
    ranked: Vec<PropertyRelevance>,
}

impl ColumnRelevance {
    /// Orders records by match count (descending), then position. Only the
    /// strongest record of a position is kept.
    pub fn new(mut records: Vec<PropertyRelevance>) -> Self {
        records.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| rank_order(a, b)));
        records.dedup_by(|later, kept| later.position == kept.position);
        records.sort_by(rank_order);
        Self { ranked: records }
    }

    pub fn ranked(&self) -> &[PropertyRelevance] {
        &self.ranked
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn into_records(self) -> Vec<PropertyRelevance> {
        self.ranked
    }
}

fn rank_order(a: &PropertyRelevance, b: &PropertyRelevance) -> Ordering {
    b.matches
        .cmp(&a.matches)
        .then_with(|| a.position.cmp(&b.position))
}

/// Relevance for every column of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceTable {
    columns: BTreeMap<ColumnKey, ColumnRelevance>,
}

impl RelevanceTable {
    pub fn from_records(records: impl IntoIterator<Item = PropertyRelevance>) -> Self {
        let mut grouped: BTreeMap<ColumnKey, Vec<PropertyRelevance>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.column_key()).or_default().push(record);
        }
        Self {
            columns: grouped
                .into_iter()
                .map(|(key, records)| (key, ColumnRelevance::new(records)))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: ColumnKey, relevance: ColumnRelevance) {
        self.columns.insert(key, relevance);
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&ColumnRelevance> {
        self.columns.get(key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All records in column order, each column in rank order.
    pub fn records(&self) -> Vec<PropertyRelevance> {
        self.columns
            .values()
            .flat_map(|column| column.ranked().iter().cloned())
            .collect()
    }
}
