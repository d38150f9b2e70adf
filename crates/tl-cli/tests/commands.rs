//! End-to-end tests for the `tl` subcommands.

use std::fs;
use std::path::Path;

use clap::Parser;
use tempfile::TempDir;
use tl_cli::cli::{Cli, Command};
use tl_cli::commands::run;
use tl_ingest::{PROPERTY_SCORES_FILE, read_candidates, string_column};

const CONTEXT: &str = "qnode\tcontext
Q548203\td:P577:+2010-05-18T00:00:00Z/11|s:P123:\"Rockstar Games\"
";

const GAMES: &str = "\
column,row,label,kg_id,context
0,0,Red Dead,Q548203,2010-05-18|Rockstar Games
0,0,Red Dead,Q1,2010-05-18|Rockstar Games
";

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tl").chain(args.iter().copied())).unwrap()
}

fn column(path: &Path, name: &str) -> Vec<String> {
    let df = read_candidates(Some(path)).unwrap();
    string_column(&df, name).unwrap()
}

fn write_context_fixture(dir: &TempDir) -> (String, String) {
    let context = dir.path().join("context.tsv");
    let input = dir.path().join("games.csv");
    fs::write(&context, CONTEXT).unwrap();
    fs::write(&input, GAMES).unwrap();
    (context.display().to_string(), input.display().to_string())
}

#[test]
fn context_match_defaults() {
    let cli = parse(&["context-match", "--context-file", "context.tsv"]);
    let Command::ContextMatch(args) = cli.command else {
        panic!("expected context-match");
    };
    assert_eq!(args.string_threshold, 0.75);
    assert_eq!(args.context.quantity_threshold, 0.85);
    assert_eq!(args.context.date_threshold, 0.9);
    assert_eq!(args.context.string_separator, ',');
    assert_eq!(args.context.missing_property_replacement_factor, 0.25);
    assert_eq!(args.context.output_column, "context_score");
    assert!(args.table.input.is_none());
    assert!(args.table.workers >= 1);
}

#[test]
fn use_cpus_is_an_alias_for_workers() {
    let cli = parse(&[
        "semantic-feature",
        "--feature-file",
        "f.tsv",
        "--total-docs",
        "10",
        "--use-cpus",
        "3",
    ]);
    let Command::SemanticFeature(args) = cli.command else {
        panic!("expected semantic-feature");
    };
    assert_eq!(args.table.workers, 3);
    assert_eq!(args.method_column, "method");
}

#[test]
fn compute_property_scores_defaults() {
    let cli = parse(&["compute-property-scores", "--context-file", "context.tsv"]);
    let Command::ComputePropertyScores(args) = cli.command else {
        panic!("expected compute-property-scores");
    };
    assert_eq!(args.string_threshold, 0.80);
    assert_eq!(args.pseudo_gt_column, "pseudo_gt");
}

#[test]
fn both_context_files_are_rejected() {
    let cli = parse(&[
        "context-match",
        "--context-file",
        "a.tsv",
        "--custom-context-file",
        "b.tsv",
    ]);
    let error = run(&cli.command).unwrap_err();
    let message = format!("{error:#}");
    assert!(message.starts_with("Command: context-match"));
    assert!(message.contains("mutually exclusive"));
}

#[test]
fn missing_context_source_is_rejected() {
    let cli = parse(&["context-match", "missing.csv"]);
    let error = run(&cli.command).unwrap_err();
    assert!(format!("{error:#}").contains("no context source"));
}

#[test]
fn context_match_scores_and_explains() {
    let dir = TempDir::new().unwrap();
    let (context, input) = write_context_fixture(&dir);
    let output = dir.path().join("scored.csv");

    let cli = parse(&[
        "context-match",
        &input,
        "--context-file",
        &context,
        "--output-file",
        output.to_str().unwrap(),
        "--workers",
        "1",
    ]);
    let summary = run(&cli.command).unwrap();
    assert_eq!(summary.command, "context-match");
    assert_eq!(summary.rows, 2);
    assert!(summary.saved_relevance.is_none());

    assert_eq!(column(&output, "label"), vec!["Red Dead", "Red Dead"]);
    assert_eq!(column(&output, "context_score"), vec!["1.0", "0.0"]);
    assert_eq!(column(&output, "context_property"), vec!["P577|P123", ""]);
    assert_eq!(column(&output, "context_similarity"), vec!["1.0|1.0", ""]);
}

#[test]
fn saved_property_scores_reproduce_the_run() {
    let dir = TempDir::new().unwrap();
    let (context, input) = write_context_fixture(&dir);
    let scores_dir = dir.path().join("scores");
    fs::create_dir(&scores_dir).unwrap();
    let seeded = dir.path().join("seeded.csv");
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    let save = parse(&[
        "compute-property-scores",
        &input,
        "--context-file",
        &context,
        "--pseudo-gt-column-name",
        "label",
        "--save-property-scores-path",
        scores_dir.to_str().unwrap(),
        "--output-file",
        seeded.to_str().unwrap(),
    ]);
    // `label` holds no set flags, so no row votes.
    let summary = run(&save.command).unwrap();
    assert_eq!(
        summary.saved_relevance,
        Some(scores_dir.join(PROPERTY_SCORES_FILE))
    );
    assert_eq!(column(&seeded, "context_score"), vec!["0.0", "0.0"]);

    let derive = parse(&[
        "context-match",
        &input,
        "--context-file",
        &context,
        "--save-property-scores-path",
        scores_dir.to_str().unwrap(),
        "--output-file",
        first.to_str().unwrap(),
    ]);
    run(&derive.command).unwrap();

    let reuse = parse(&[
        "context-match",
        &input,
        "--context-file",
        &context,
        "--use-saved-property-scores-path",
        scores_dir.to_str().unwrap(),
        "--output-file",
        second.to_str().unwrap(),
    ]);
    run(&reuse.command).unwrap();

    for name in ["context_score", "context_property", "context_similarity"] {
        assert_eq!(column(&first, name), column(&second, name), "{name}");
    }
}

#[test]
fn semantic_feature_appends_seed_columns() {
    let dir = TempDir::new().unwrap();
    let features = dir.path().join("classes.tsv");
    let input = dir.path().join("candidates.csv");
    let output = dir.path().join("scored.csv");
    fs::write(&features, "qnode\tclass_count\nQ1\tQ5\nQ2\tQ5\n").unwrap();
    fs::write(
        &input,
        "column,row,kg_id,method,pagerank,retrieval_score\n\
         0,0,Q1,exact-match,0.5,1\n\
         0,1,Q2,fuzzy-augmented,0.2,2\n\
         0,1,Q3,fuzzy-augmented,0.1,1\n",
    )
    .unwrap();

    let cli = parse(&[
        "semantic-feature",
        input.to_str().unwrap(),
        "--feature-file",
        features.to_str().unwrap(),
        "--total-docs",
        "10",
        "--output-file",
        output.to_str().unwrap(),
    ]);
    let summary = run(&cli.command).unwrap();
    assert_eq!(summary.rows, 3);

    assert_eq!(column(&output, "pgr_rts"), vec!["0.5", "0.4", "0.1"]);
    assert_eq!(column(&output, "hc_candidate"), vec!["1", "1", "0"]);
    assert_eq!(column(&output, "semantic_score"), vec!["1.0", "1.0", "0.0"]);
    assert_eq!(
        column(&output, "top5_semantic_score"),
        vec!["Q5:1.000", "Q5:1.000", ""]
    );
}

#[test]
fn semantic_feature_rejects_zero_total_docs() {
    let cli = parse(&[
        "semantic-feature",
        "--feature-file",
        "classes.tsv",
        "--total-docs",
        "0",
    ]);
    let error = run(&cli.command).unwrap_err();
    assert!(format!("{error:#}").contains("total docs must be positive"));
}
