use std::fs;
use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use tl_ingest::{
    CandidateColumns, IngestError, PROPERTY_SCORES_FILE, append_f64_column, append_flag_column,
    append_str_column, extract_candidates, read_candidates, read_context_file, read_feature_file,
    read_relevance, string_column, write_candidates, write_relevance,
};
use tl_model::{Method, PropertyRelevance};

const CANDIDATES: &str = "\
column,row,label,kg_id,method,pagerank,retrieval_score,context,pseudo_gt
0,0,Red Dead,Q548203,exact-match,3.5e-07,12.5,2010-05-18|Rockstar,1
0,0,Red Dead,Q1,fuzzy-augmented,,9.0,2010-05-18|Rockstar,0
0,1,Halo,Q2,fuzzy-augmented,0.5,1,,0
";

#[test]
fn reads_candidate_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("candidates.csv");
    fs::write(&path, CANDIDATES).unwrap();

    let df = read_candidates(Some(&path)).unwrap();
    let columns = CandidateColumns {
        method: Some("method".to_string()),
        pagerank: Some("pagerank".to_string()),
        retrieval_score: Some("retrieval_score".to_string()),
        context: Some("context".to_string()),
        pseudo_gt: Some("pseudo_gt".to_string()),
        ..CandidateColumns::default()
    };
    let rows = extract_candidates(&df, &columns).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].kg_id, "Q548203");
    assert_eq!(rows[0].method, Method::ExactMatch);
    assert!(rows[0].pseudo_gt);
    assert_eq!(rows[0].context, vec!["2010-05-18", "Rockstar"]);
    assert!(rows[1].pagerank.is_nan());
    assert_eq!(rows[1].retrieval_score, 9.0);
    assert!(rows[2].context.is_empty());
    assert_eq!(rows[2].cell.table, "");
}

#[test]
fn missing_required_column_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("candidates.csv");
    fs::write(&path, "column,row\n0,0\n").unwrap();

    let df = read_candidates(Some(&path)).unwrap();
    let error = extract_candidates(&df, &CandidateColumns::default()).unwrap_err();
    assert!(matches!(error, IngestError::MissingColumn { ref column, .. } if column == "kg_id"));
}

#[test]
fn appended_columns_round_trip_untouched_values() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("candidates.csv");
    let output = dir.path().join("scored.csv");
    fs::write(&input, CANDIDATES).unwrap();

    let mut df = read_candidates(Some(&input)).unwrap();
    append_f64_column(&mut df, "context_score", &[1.0, f64::NAN, 0.5]).unwrap();
    append_flag_column(&mut df, "hc_candidate", &[true, false, true]).unwrap();
    append_str_column(
        &mut df,
        "context_property",
        &["P577".to_string(), String::new(), String::new()],
    )
    .unwrap();
    write_candidates(&mut df, Some(&output)).unwrap();

    let written = read_candidates(Some(&output)).unwrap();
    assert_eq!(written.height(), 3);
    assert_eq!(
        string_column(&written, "pagerank").unwrap(),
        vec!["3.5e-07", "", "0.5"]
    );
    assert_eq!(
        string_column(&written, "context_score").unwrap(),
        vec!["1.0", "", "0.5"]
    );
    assert_eq!(
        string_column(&written, "hc_candidate").unwrap(),
        vec!["1", "0", "1"]
    );
}

#[test]
fn reads_gzip_context_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("context.tsv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(b"qnode\tcontext\nQ548203\ts:P1476:\"Red Dead Redemption\"|d:P577:+2010-05-18T00:00:00Z/11\n\t\n")
        .unwrap();
    fs::write(&path, encoder.finish().unwrap()).unwrap();

    let records = read_context_file(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, "Q548203");
    assert!(records[0].1.starts_with("s:P1476:\"Red Dead Redemption\""));
}

#[test]
fn feature_file_needs_feature_column() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("features.tsv");
    fs::write(&path, "qnode\tclass_count\nQ1\tQ5|Q215627\n").unwrap();

    let records = read_feature_file(&path, "class_count").unwrap();
    assert_eq!(records, vec![("Q1".to_string(), "Q5|Q215627".to_string())]);

    let error = read_feature_file(&path, "property_count").unwrap_err();
    assert!(matches!(error, IngestError::MissingColumn { .. }));
}

#[test]
fn relevance_saved_into_directory_round_trips() {
    let dir = TempDir::new().unwrap();
    let records = vec![PropertyRelevance {
        table: "games.csv".to_string(),
        column: "0".to_string(),
        position: 1,
        property: "P577".to_string(),
        matches: 3,
        min_similarity: 0.9,
    }];

    let written = write_relevance(dir.path(), &records).unwrap();
    assert_eq!(written, dir.path().join(PROPERTY_SCORES_FILE));
    assert_eq!(read_relevance(dir.path()).unwrap(), records);
}

#[test]
fn relevance_without_table_column_defaults_to_single_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scores.csv");
    fs::write(
        &path,
        "column,position,property,matches,min_similarity\n0,0,P400,2,0.875\n",
    )
    .unwrap();

    let records = read_relevance(&path).unwrap();
    assert_eq!(records[0].table, "");
    assert_eq!(records[0].property, "P400");
}
