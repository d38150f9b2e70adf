//! Selection of trustworthy seed candidates per table cell.

use std::collections::BTreeMap;

use tl_model::{CandidateRow, CellKey, ColumnKey, Method};

/// Seed labels for a candidate table, aligned with the input rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighConfidence {
    pub flags: Vec<bool>,
    /// `pagerank × retrieval_score` per row; `NaN` when a score is missing.
    pub pgr_rts: Vec<f64>,
    /// Number of cells with at least one candidate, per column.
    pub table_lengths: BTreeMap<ColumnKey, usize>,
    /// Cells with candidates but no seed.
    pub empty_groups: usize,
}

impl HighConfidence {
    /// Label every row.
    ///
    /// A row is a seed when its method is exact-match, or when it is
    /// fuzzy-augmented and carries its cell's largest finite `pgr_rts`
    /// among fuzzy-augmented rows (every tied row is a seed). Rows without
    /// a candidate id are never seeds.
    pub fn label(rows: &[CandidateRow]) -> Self {
        let pgr_rts: Vec<f64> = rows.iter().map(CandidateRow::pgr_rts).collect();
        let mut flags = vec![false; rows.len()];
        let mut table_lengths: BTreeMap<ColumnKey, usize> = BTreeMap::new();
        let mut empty_groups = 0;

        let mut cells: BTreeMap<&CellKey, Vec<usize>> = BTreeMap::new();
        for (index, row) in rows.iter().enumerate() {
            cells.entry(&row.cell).or_default().push(index);
        }

        for (cell, indices) in cells {
            let candidates: Vec<usize> = indices
                .into_iter()
                .filter(|&i| rows[i].has_candidate())
                .collect();
            if candidates.is_empty() {
                continue;
            }
            *table_lengths.entry(cell.column_key()).or_default() += 1;

            let best_fuzzy = candidates
                .iter()
                .filter(|&&i| rows[i].method == Method::FuzzyAugmented && pgr_rts[i].is_finite())
                .map(|&i| pgr_rts[i])
                .reduce(f64::max);

            let mut seeded = false;
            for &i in &candidates {
                let seed = match rows[i].method {
                    Method::ExactMatch => true,
                    Method::FuzzyAugmented => best_fuzzy.is_some_and(|best| pgr_rts[i] == best),
                    Method::Other(_) => false,
                };
                flags[i] = seed;
                seeded |= seed;
            }
            if !seeded {
                empty_groups += 1;
            }
        }

        Self {
            flags,
            pgr_rts,
            table_lengths,
            empty_groups,
        }
    }

    pub fn is_seed(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub fn table_length(&self, key: &ColumnKey) -> usize {
        self.table_lengths.get(key).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuzzy(row: &str, kg_id: &str, pagerank: f64, retrieval: f64) -> CandidateRow {
        CandidateRow::new("t", "0", row, kg_id)
            .with_method(Method::FuzzyAugmented)
            .with_scores(pagerank, retrieval)
    }

    #[test]
    fn exact_match_always_seeds() {
        let rows = vec![
            CandidateRow::new("t", "0", "0", "Q1").with_method(Method::ExactMatch),
            fuzzy("0", "Q2", 0.9, 20.0),
        ];
        let labels = HighConfidence::label(&rows);
        assert_eq!(labels.flags, vec![true, true]);
    }

    #[test]
    fn ties_at_the_maximum_all_seed() {
        let rows = vec![
            fuzzy("0", "Q1", 0.5, 2.0),
            fuzzy("0", "Q2", 1.0, 1.0),
            fuzzy("0", "Q3", 0.1, 1.0),
            fuzzy("1", "Q4", 0.1, 1.0),
        ];
        let labels = HighConfidence::label(&rows);
        assert_eq!(labels.flags, vec![true, true, false, true]);
        assert_eq!(labels.table_length(&rows[0].column_key()), 2);
    }

    #[test]
    fn missing_scores_leave_cell_without_seed() {
        let rows = vec![
            fuzzy("0", "Q1", f64::NAN, 1.0),
            CandidateRow::new("t", "0", "0", "Q2").with_method(Method::Other("ngram".into())),
            CandidateRow::new("t", "0", "1", ""),
        ];
        let labels = HighConfidence::label(&rows);
        assert_eq!(labels.flags, vec![false, false, false]);
        assert_eq!(labels.empty_groups, 1);
        assert_eq!(labels.table_length(&rows[0].column_key()), 1);
        assert!(labels.pgr_rts[0].is_nan());
    }
}
