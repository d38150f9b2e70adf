//! Column partitioning and the worker pool both engines run on.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tl_model::{CandidateRow, ColumnKey};
use tracing::warn;

/// Input row indices of one column, in input order.
pub(crate) type Partition = (ColumnKey, Vec<usize>);

/// Group row indices by column; partitions come out in column order.
pub(crate) fn partition_by_column(rows: &[CandidateRow]) -> Vec<Partition> {
    let mut grouped: BTreeMap<ColumnKey, Vec<usize>> = BTreeMap::new();
    for (index, row) in rows.iter().enumerate() {
        grouped.entry(row.column_key()).or_default().push(index);
    }
    grouped.into_iter().collect()
}

/// Run `f` over every partition on a pool of `workers` threads.
///
/// Results keep partition order. One worker runs inline; a pool that cannot
/// be built falls back to the global rayon pool.
pub(crate) fn run_partitioned<T, F>(workers: usize, partitions: Vec<Partition>, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&ColumnKey, &[usize]) -> T + Sync + Send,
{
    if workers <= 1 {
        return partitions
            .into_iter()
            .map(|(key, indices)| f(&key, &indices))
            .collect();
    }
    let run = || {
        partitions
            .into_par_iter()
            .map(|(key, indices)| f(&key, &indices))
            .collect::<Vec<T>>()
    };
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(run),
        Err(error) => {
            warn!(%error, workers, "worker pool unavailable; using the global pool");
            run()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_keep_input_order_within_column() {
        let rows = vec![
            CandidateRow::new("t", "1", "0", "Q1"),
            CandidateRow::new("t", "0", "0", "Q2"),
            CandidateRow::new("t", "1", "1", "Q3"),
        ];
        let partitions = partition_by_column(&rows);
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].0.column, "0");
        assert_eq!(partitions[1].1, vec![0, 2]);
    }

    #[test]
    fn results_follow_partition_order() {
        let rows: Vec<CandidateRow> = (0..8)
            .map(|i| CandidateRow::new("t", i.to_string(), "0", "Q1"))
            .collect();
        let sizes = run_partitioned(4, partition_by_column(&rows), |key, indices| {
            (key.column.clone(), indices.len())
        });
        let columns: Vec<String> = sizes.into_iter().map(|(column, _)| column).collect();
        assert_eq!(columns, vec!["0", "1", "2", "3", "4", "5", "6", "7"]);
    }
}
