//! Inverse document frequency of classes.

use std::collections::BTreeMap;

/// `idf(class) = ln(N / document_frequency)`, computed once per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    values: BTreeMap<String, f64>,
}

impl IdfTable {
    /// Classes with a zero document frequency are left out.
    pub fn compute(counts: &BTreeMap<String, usize>, total_docs: f64) -> Self {
        let values = counts
            .iter()
            .filter(|(_, df)| **df > 0)
            .map(|(class, df)| (class.clone(), (total_docs / *df as f64).ln()))
            .collect();
        Self { values }
    }

    /// IDF of `class`; 0 for classes never seen.
    pub fn get(&self, class: &str) -> f64 {
        self.values.get(class).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// IDF of each class relative to the largest IDF in `classes`.
///
/// Order preserving; every value is 0 when the largest IDF is not positive.
pub fn normalize_high_confidence<I, S>(classes: I, idf: &IdfTable) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let raw: BTreeMap<String, f64> = classes
        .into_iter()
        .map(|class| {
            let class = class.as_ref();
            (class.to_string(), idf.get(class))
        })
        .collect();
    let max = raw.values().copied().fold(f64::NEG_INFINITY, f64::max);
    raw.into_iter()
        .map(|(class, value)| {
            let normalized = if max > 0.0 { value / max } else { 0.0 };
            (class, normalized)
        })
        .collect()
}
