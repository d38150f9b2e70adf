//! Candidate → class dictionary and class document frequencies.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

/// Classes of each candidate, plus the number of distinct candidates
/// carrying each class.
///
/// Built once per run and read-only afterwards. Candidates absent from the
/// dictionary have no classes.
#[derive(Debug, Clone, Default)]
pub struct FeatureDictionary {
    classes: HashMap<String, Vec<String>>,
    counts: BTreeMap<String, usize>,
}

impl FeatureDictionary {
    /// Build from `(candidate id, "C1|C2|...")` records. Repeated candidates
    /// merge their class lists; a class is counted once per candidate.
    pub fn build<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut classes: HashMap<String, Vec<String>> = HashMap::new();
        for (kg_id, raw) in records {
            let kg_id = kg_id.as_ref().trim();
            if kg_id.is_empty() {
                continue;
            }
            let known = classes.entry(kg_id.to_string()).or_default();
            for class in raw.as_ref().split('|').map(str::trim) {
                if !class.is_empty() && !known.iter().any(|c| c == class) {
                    known.push(class.to_string());
                }
            }
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for class in classes.values().flatten() {
            *counts.entry(class.clone()).or_default() += 1;
        }
        debug!(
            candidates = classes.len(),
            classes = counts.len(),
            "feature dictionary built"
        );
        Self { classes, counts }
    }

    /// Classes of a candidate in first-seen order.
    pub fn classes(&self, kg_id: &str) -> &[String] {
        self.classes.get(kg_id).map_or(&[], Vec::as_slice)
    }

    pub fn document_frequency(&self, class: &str) -> usize {
        self.counts.get(class).copied().unwrap_or(0)
    }

    /// Document frequency of every class.
    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_distinct_candidates_per_class() {
        let dict = FeatureDictionary::build([
            ("Q1", "Q5|Q215627"),
            ("Q2", "Q5"),
            ("Q1", "Q5|Q43229"),
            ("", "Q99"),
        ]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.classes("Q1"), ["Q5", "Q215627", "Q43229"]);
        assert_eq!(dict.document_frequency("Q5"), 2);
        assert_eq!(dict.document_frequency("Q43229"), 1);
        assert_eq!(dict.document_frequency("Q99"), 0);
    }

    #[test]
    fn absent_candidate_has_no_classes() {
        let dict = FeatureDictionary::build([("Q1", "Q5")]);
        assert!(dict.classes("Q404").is_empty());
    }
}
