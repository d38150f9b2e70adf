//! Context-matching engine.
//!
//! Scores each candidate by how well its recorded property values agree with
//! the other cell values of its table row. A column is processed in three
//! passes:
//!
//! 1. **match**: best similarity of every candidate property against every
//!    row position
//! 2. **relevance**: the significant property of each position, derived from
//!    the rows' best matches or taken from a saved relevance table
//! 3. **fold**: rank-weighted mean over the significant positions, imputing
//!    positions whose property the candidate does not carry at all

use std::collections::BTreeMap;

use tl_model::{
    CandidateRow, ColumnKey, ColumnRelevance, ContextMatchOptions, PropertyMatch,
    PropertyRelevance, RelevanceTable, Result, Thresholds,
};
use tracing::debug;

use crate::context_index::ContextIndex;
use crate::partition::{partition_by_column, run_partitioned};
use crate::similarity::entry_similarity;

/// Context score of one candidate row with its explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMatch {
    pub score: f64,
    /// Matched significant properties in rank order.
    pub properties: Vec<String>,
    pub similarities: Vec<f64>,
}

impl ContextMatch {
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            properties: Vec::new(),
            similarities: Vec::new(),
        }
    }

    /// `P577|P3529`
    pub fn property_list(&self) -> String {
        self.properties.join("|")
    }

    /// `1.0|0.5`
    pub fn similarity_list(&self) -> String {
        self.similarities
            .iter()
            .map(|sim| format!("{sim:?}"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Where the significant property of each position comes from.
#[derive(Debug, Clone, Copy)]
pub enum RelevanceMode<'a> {
    /// Derive from the rows themselves; optionally only from pseudo ground
    /// truth rows.
    Derive { pseudo_gt_only: bool },
    /// Reuse a saved relevance table.
    Cached(&'a RelevanceTable),
}

#[derive(Debug, Clone)]
pub struct ContextMatchOutput {
    /// One entry per input row, in input order.
    pub matches: Vec<ContextMatch>,
    /// Relevance used for scoring, per column.
    pub relevance: RelevanceTable,
}

struct ColumnOutcome {
    key: ColumnKey,
    matches: Vec<(usize, ContextMatch)>,
    relevance: Option<ColumnRelevance>,
}

/// Score every row against `index`.
///
/// # Errors
///
/// Returns [`tl_model::TlError::Configuration`] when `options` are invalid.
pub fn match_context(
    rows: &[CandidateRow],
    index: &ContextIndex,
    options: &ContextMatchOptions,
    mode: RelevanceMode<'_>,
) -> Result<ContextMatchOutput> {
    options.validate()?;
    let partitions = partition_by_column(rows);
    debug!(
        rows = rows.len(),
        columns = partitions.len(),
        workers = options.workers,
        "context matching started"
    );

    let outcomes = run_partitioned(options.workers, partitions, |key, indices| {
        score_column(key, indices, rows, index, options, mode)
    });

    let mut matches = vec![ContextMatch::empty(); rows.len()];
    let mut relevance = RelevanceTable::default();
    for outcome in outcomes {
        for (row_index, matched) in outcome.matches {
            matches[row_index] = matched;
        }
        if let Some(column) = outcome.relevance {
            relevance.insert(outcome.key, column);
        }
    }
    Ok(ContextMatchOutput { matches, relevance })
}

fn score_column(
    key: &ColumnKey,
    indices: &[usize],
    rows: &[CandidateRow],
    index: &ContextIndex,
    options: &ContextMatchOptions,
    mode: RelevanceMode<'_>,
) -> ColumnOutcome {
    let matched: Vec<(usize, Vec<Vec<PropertyMatch>>)> = indices
        .iter()
        .map(|&i| {
            let row = &rows[i];
            let positions = if row.ignored {
                Vec::new()
            } else {
                match_row(row, index, &options.thresholds, options.separator)
            };
            (i, positions)
        })
        .collect();

    let relevance = match mode {
        RelevanceMode::Derive { pseudo_gt_only } => {
            let derived = derive_relevance(
                key,
                matched
                    .iter()
                    .map(|(i, positions)| (&rows[*i], positions.as_slice())),
                pseudo_gt_only,
            );
            (!derived.is_empty()).then_some(derived)
        }
        RelevanceMode::Cached(table) => table.column(key).cloned(),
    };
    let Some(relevance) = relevance else {
        debug!(column = %key, "no relevant properties; column scores 0");
        return ColumnOutcome {
            key: key.clone(),
            matches: matched
                .into_iter()
                .map(|(i, _)| (i, ContextMatch::empty()))
                .collect(),
            relevance: None,
        };
    };

    let matches = matched
        .into_iter()
        .map(|(i, positions)| {
            let row = &rows[i];
            let known = row.has_candidate() && index.contains(&row.kg_id);
            let scored = if row.ignored || !known {
                ContextMatch::empty()
            } else {
                fold(relevance.ranked(), &positions, &row.kg_id, index, options)
            };
            (i, scored)
        })
        .collect();
    ColumnOutcome {
        key: key.clone(),
        matches,
        relevance: Some(relevance),
    }
}

/// Best similarity of each of the candidate's properties at each row
/// position.
///
/// Element `p` lists the properties that matched position `p`, strongest
/// first (ties by property id). Similarities are rounded to four decimals.
pub fn match_row(
    row: &CandidateRow,
    index: &ContextIndex,
    thresholds: &Thresholds,
    separator: char,
) -> Vec<Vec<PropertyMatch>> {
    row.context
        .iter()
        .map(|value| {
            if value.trim().is_empty() {
                return Vec::new();
            }
            let mut matched: Vec<PropertyMatch> = index
                .entries(&row.kg_id)
                .filter_map(|entry| {
                    let similarity = round4(entry_similarity(entry, value, thresholds, separator));
                    (similarity > 0.0).then(|| PropertyMatch {
                        property: entry.property.clone(),
                        similarity,
                    })
                })
                .collect();
            matched.sort_by(|a, b| {
                b.similarity
                    .total_cmp(&a.similarity)
                    .then_with(|| a.property.cmp(&b.property))
            });
            matched
        })
        .collect()
}

/// Significant property of each row position of one column.
///
/// Every eligible row votes, per position, for its best-matching property.
/// A position's significant property is the one with most votes (ties go to
/// the smaller property id).
pub fn derive_relevance<'a, I>(key: &ColumnKey, rows: I, pseudo_gt_only: bool) -> ColumnRelevance
where
    I: IntoIterator<Item = (&'a CandidateRow, &'a [Vec<PropertyMatch>])>,
{
    let mut tallies: BTreeMap<(usize, &'a str), (usize, f64)> = BTreeMap::new();
    for (row, positions) in rows {
        if row.ignored || !row.has_candidate() || (pseudo_gt_only && !row.pseudo_gt) {
            continue;
        }
        for (position, matched) in positions.iter().enumerate() {
            if let Some(best) = matched.first() {
                let tally = tallies
                    .entry((position, best.property.as_str()))
                    .or_insert((0, f64::INFINITY));
                tally.0 += 1;
                tally.1 = tally.1.min(best.similarity);
            }
        }
    }

    let mut significant: BTreeMap<usize, PropertyRelevance> = BTreeMap::new();
    for ((position, property), (matches, min_similarity)) in tallies {
        let stronger = significant
            .get(&position)
            .is_none_or(|current| matches > current.matches);
        if stronger {
            significant.insert(
                position,
                PropertyRelevance {
                    table: key.table.clone(),
                    column: key.column.clone(),
                    position,
                    property: property.to_string(),
                    matches,
                    min_similarity,
                },
            );
        }
    }
    ColumnRelevance::new(significant.into_values().collect())
}

/// Fold a candidate's position matches into one score over the ranked
/// significant positions.
///
/// A position whose significant property the candidate does not carry is
/// imputed as the replacement factor times the weakest similarity with which
/// the column's most significant property matched. The imputed value depends
/// on the relevance only, so admitting more matches never lowers a score.
pub fn fold(
    ranked: &[PropertyRelevance],
    positions: &[Vec<PropertyMatch>],
    kg_id: &str,
    index: &ContextIndex,
    options: &ContextMatchOptions,
) -> ContextMatch {
    enum Slot {
        Matched(f64),
        Missing,
        Unmatched,
    }

    let slots: Vec<Slot> = ranked
        .iter()
        .map(|relevance| {
            let matched = positions.get(relevance.position).and_then(|matched| {
                matched
                    .iter()
                    .find(|m| m.property == relevance.property)
                    .map(|m| m.similarity)
            });
            match matched {
                Some(similarity) => Slot::Matched(similarity),
                None if !index.has_property(kg_id, &relevance.property) => Slot::Missing,
                None => Slot::Unmatched,
            }
        })
        .collect();

    let mut result = ContextMatch::empty();
    for (relevance, slot) in ranked.iter().zip(&slots) {
        if let Slot::Matched(similarity) = slot {
            result.properties.push(relevance.property.clone());
            result.similarities.push(*similarity);
        }
    }
    let anchor = ranked.first().map_or(0.0, |top| top.min_similarity);
    let imputed = options.missing_property_replacement_factor * anchor;

    let mut weighted = 0.0;
    let mut total = 0.0;
    let mut weight = 1.0;
    for slot in &slots {
        weighted += weight
            * match slot {
                Slot::Matched(similarity) => *similarity,
                Slot::Missing => imputed,
                Slot::Unmatched => 0.0,
            };
        total += weight;
        weight *= options.property_rank_decay;
    }
    if total > 0.0 {
        result.score = round4(weighted / total);
    }
    result
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
