//! Semantic class-propagation engine.
//!
//! Seed candidates of a column vote for their classes; every seed is then
//! scored by how much its own classes agree with the column's vote. Each
//! column runs the passes strictly in order:
//!
//! 1. observations: one record per (distinct seed candidate of a cell, class)
//! 2. `class_count`: distinct seed candidates of the same cell sharing the
//!    class
//! 3. `x_i = 1 / class_count`
//! 4. `alpha[class] = Σ x_i / table_length`
//! 5. IDF normalized over the column's seed classes
//! 6. `score = Σ x_i × alpha × idf` over the seed's classes
//!
//! Columns are independent and run on the worker pool.

use std::collections::{BTreeMap, BTreeSet};

use tl_model::{CandidateRow, ColumnKey, Result, SemanticOptions};
use tracing::{debug, warn};

use crate::feature_dict::FeatureDictionary;
use crate::high_confidence::HighConfidence;
use crate::idf::{IdfTable, normalize_high_confidence};
use crate::partition::{partition_by_column, run_partitioned};

const TOP_CLASSES: usize = 5;

/// One class carried by one seed candidate of a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassObservation<'a> {
    /// Input row index of the first seed row holding the candidate.
    pub index: usize,
    /// Cell row id the seed competes for.
    pub row: &'a str,
    pub kg_id: &'a str,
    pub class: &'a str,
}

/// Semantic scores aligned with the input rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticScores {
    pub high_confidence: HighConfidence,
    pub scores: Vec<f64>,
    /// `class:weight` pairs joined by `|`; empty for non-seeds.
    pub top5: Vec<String>,
}

/// Score every row of a candidate table.
///
/// # Errors
///
/// Returns [`tl_model::TlError::Configuration`] when `options` are invalid.
pub fn score_semantics(
    rows: &[CandidateRow],
    dictionary: &FeatureDictionary,
    idf: &IdfTable,
    options: &SemanticOptions,
) -> Result<SemanticScores> {
    options.validate()?;
    let high_confidence = HighConfidence::label(rows);
    if high_confidence.empty_groups > 0 {
        warn!(
            groups = high_confidence.empty_groups,
            "cells without a high-confidence candidate score 0"
        );
    }

    let partitions = partition_by_column(rows);
    debug!(
        rows = rows.len(),
        columns = partitions.len(),
        seeds = high_confidence.flags.iter().filter(|flag| **flag).count(),
        "semantic scoring started"
    );
    let columns = run_partitioned(options.workers, partitions, |key, indices| {
        score_column(key, indices, rows, &high_confidence, dictionary, idf)
    });

    let mut scores = vec![0.0; rows.len()];
    let mut top5 = vec![String::new(); rows.len()];
    for (index, score, explanation) in columns.into_iter().flatten() {
        scores[index] = score;
        top5[index] = explanation;
    }
    Ok(SemanticScores {
        high_confidence,
        scores,
        top5,
    })
}

fn score_column(
    key: &ColumnKey,
    indices: &[usize],
    rows: &[CandidateRow],
    high_confidence: &HighConfidence,
    dictionary: &FeatureDictionary,
    idf: &IdfTable,
) -> Vec<(usize, f64, String)> {
    let seeds: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&i| high_confidence.is_seed(i))
        .collect();
    let observations = class_observations(&seeds, rows, dictionary);
    let counts = count_classes(&observations);
    let x_i = contributions(&observations, &counts);
    let alpha = column_alpha(&observations, &x_i, high_confidence.table_length(key));
    let weights = normalize_high_confidence(observations.iter().map(|obs| obs.class), idf);

    // Keyed by candidate so repeated rows of one candidate share its score.
    let mut per_seed: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for (obs, x) in observations.iter().zip(&x_i) {
        let alpha = alpha.get(obs.class).copied().unwrap_or(0.0);
        let weight = weights.get(obs.class).copied().unwrap_or(0.0);
        *per_seed.entry((obs.row, obs.kg_id)).or_default() += x * alpha * weight;
    }
    debug!(
        column = %key,
        seeds = seeds.len(),
        classes = alpha.len(),
        "column scored"
    );

    seeds
        .into_iter()
        .map(|i| {
            let row = &rows[i];
            let score = per_seed
                .get(&(row.cell.row.as_str(), row.kg_id.as_str()))
                .copied()
                .unwrap_or(0.0);
            let explanation = top_classes(dictionary.classes(&rows[i].kg_id), &weights);
            (i, score, explanation)
        })
        .collect()
}

/// One observation per class of every distinct seed candidate.
///
/// A candidate proposed twice for the same cell (for example by exact and
/// fuzzy retrieval) is observed once.
pub fn class_observations<'a>(
    seeds: &[usize],
    rows: &'a [CandidateRow],
    dictionary: &'a FeatureDictionary,
) -> Vec<ClassObservation<'a>> {
    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    seeds
        .iter()
        .filter(|&&index| {
            let row = &rows[index];
            seen.insert((row.cell.row.as_str(), row.kg_id.as_str()))
        })
        .flat_map(|&index| {
            let row = &rows[index];
            dictionary
                .classes(&row.kg_id)
                .iter()
                .map(move |class| ClassObservation {
                    index,
                    row: row.cell.row.as_str(),
                    kg_id: row.kg_id.as_str(),
                    class: class.as_str(),
                })
        })
        .collect()
}

/// Number of seeds of each cell row carrying each class.
pub fn count_classes<'a>(
    observations: &[ClassObservation<'a>],
) -> BTreeMap<(&'a str, &'a str), usize> {
    let mut counts = BTreeMap::new();
    for obs in observations {
        *counts.entry((obs.row, obs.class)).or_default() += 1;
    }
    counts
}

/// `x_i` of every observation: the inverse of its class count in its row.
pub fn contributions<'a>(
    observations: &[ClassObservation<'a>],
    counts: &BTreeMap<(&'a str, &'a str), usize>,
) -> Vec<f64> {
    observations
        .iter()
        .map(|obs| {
            let count = counts.get(&(obs.row, obs.class)).copied().unwrap_or(1);
            1.0 / count as f64
        })
        .collect()
}

/// Column-level class weight: summed `x_i` over the column's table length.
pub fn column_alpha<'a>(
    observations: &[ClassObservation<'a>],
    x_i: &[f64],
    table_length: usize,
) -> BTreeMap<&'a str, f64> {
    let mut alpha: BTreeMap<&str, f64> = BTreeMap::new();
    if table_length == 0 {
        return alpha;
    }
    for (obs, x) in observations.iter().zip(x_i) {
        *alpha.entry(obs.class).or_default() += x;
    }
    for value in alpha.values_mut() {
        *value /= table_length as f64;
    }
    alpha
}

/// Top classes by normalized IDF (ties by class id) as `class:0.000|...`.
fn top_classes(classes: &[String], weights: &BTreeMap<String, f64>) -> String {
    let mut ranked: Vec<(&str, f64)> = classes
        .iter()
        .map(|class| (class.as_str(), weights.get(class).copied().unwrap_or(0.0)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(TOP_CLASSES)
        .map(|(class, weight)| format!("{class}:{weight:.3}"))
        .collect::<Vec<_>>()
        .join("|")
}
