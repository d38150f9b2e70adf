//! Command orchestration: read the candidate table, score it, write it back.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span, warn};

use tl_features::{
    ContextIndex, ContextMatch, ContextMatchOutput, FeatureDictionary, IdfTable, RelevanceMode,
    match_context, score_semantics,
};
use tl_ingest::{
    CandidateColumns, append_f64_column, append_flag_column, append_str_column,
    extract_candidates, read_candidates, read_context_file, read_feature_file, read_relevance,
    write_candidates, write_relevance,
};
use tl_model::{ContextMatchOptions, ContextSource, RelevanceTable, SemanticOptions, Thresholds};

use crate::cli::{
    Command, ComputePropertyScoresArgs, ContextArgs, ContextMatchArgs, SemanticFeatureArgs,
    TableArgs,
};

/// Matched significant properties, in rank order.
pub const CONTEXT_PROPERTY_COLUMN: &str = "context_property";
/// Similarities of [`CONTEXT_PROPERTY_COLUMN`], in the same order.
pub const CONTEXT_SIMILARITY_COLUMN: &str = "context_similarity";
pub const PGR_RTS_COLUMN: &str = "pgr_rts";
pub const HIGH_CONFIDENCE_COLUMN: &str = "hc_candidate";

/// Outcome of one command run.
#[derive(Debug, Clone)]
pub struct CommandSummary {
    pub command: &'static str,
    pub rows: usize,
    pub duration: Duration,
    /// Where property relevance was saved, if requested.
    pub saved_relevance: Option<PathBuf>,
}

/// Run a parsed command.
///
/// # Errors
///
/// Any failure is returned with `Command: <name>` context attached.
pub fn run(command: &Command) -> Result<CommandSummary> {
    let name = command.name();
    let span = info_span!("command", command = name);
    let _guard = span.enter();
    let start = Instant::now();

    let (rows, saved_relevance) = match command {
        Command::ContextMatch(args) => run_context_match(args),
        Command::ComputePropertyScores(args) => run_compute_property_scores(args),
        Command::SemanticFeature(args) => run_semantic_feature(args).map(|rows| (rows, None)),
    }
    .with_context(|| format!("Command: {name}"))?;

    Ok(CommandSummary {
        command: name,
        rows,
        duration: start.elapsed(),
        saved_relevance,
    })
}

impl CommandSummary {
    /// Emit the run record of a finished command.
    pub fn log(&self) {
        let duration_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
        match &self.saved_relevance {
            Some(path) => info!(
                command = self.command,
                rows = self.rows,
                duration_ms,
                property_scores = %path.display(),
                "command finished"
            ),
            None => info!(
                command = self.command,
                rows = self.rows,
                duration_ms,
                "command finished"
            ),
        }
    }
}

fn run_context_match(args: &ContextMatchArgs) -> Result<(usize, Option<PathBuf>)> {
    let source = ContextSource::from_flags(
        args.context.context_file.clone(),
        args.context.custom_context_file.clone(),
        args.use_saved_property_scores_path.clone(),
    )?;
    let thresholds = thresholds(&args.context, args.string_threshold);
    let columns = CandidateColumns {
        context: Some(args.context.context_column.clone()),
        pseudo_gt: args.pseudo_gt_column.clone(),
        ignore: args.ignore_column.clone(),
        ..CandidateColumns::default()
    };
    let cached = match source.relevance_path() {
        Some(path) => {
            let records = read_relevance(path).context("load saved property scores")?;
            Some(RelevanceTable::from_records(records))
        }
        None => None,
    };
    let mode = match &cached {
        Some(table) => RelevanceMode::Cached(table),
        None => RelevanceMode::Derive {
            pseudo_gt_only: args.pseudo_gt_column.is_some(),
        },
    };
    score_context(&args.table, &args.context, &source, thresholds, &columns, mode)
}

fn run_compute_property_scores(
    args: &ComputePropertyScoresArgs,
) -> Result<(usize, Option<PathBuf>)> {
    let source = ContextSource::from_flags(
        args.context.context_file.clone(),
        args.context.custom_context_file.clone(),
        None,
    )?;
    let thresholds = thresholds(&args.context, args.string_threshold);
    let columns = CandidateColumns {
        context: Some(args.context.context_column.clone()),
        pseudo_gt: Some(args.pseudo_gt_column.clone()),
        ..CandidateColumns::default()
    };
    let mode = RelevanceMode::Derive {
        pseudo_gt_only: true,
    };
    score_context(&args.table, &args.context, &source, thresholds, &columns, mode)
}

fn thresholds(args: &ContextArgs, string: f64) -> Thresholds {
    Thresholds {
        string,
        quantity: args.quantity_threshold,
        date: args.date_threshold,
    }
}

fn score_context(
    table: &TableArgs,
    context: &ContextArgs,
    source: &ContextSource,
    thresholds: Thresholds,
    columns: &CandidateColumns,
    mode: RelevanceMode<'_>,
) -> Result<(usize, Option<PathBuf>)> {
    let options = ContextMatchOptions {
        thresholds,
        separator: context.string_separator,
        missing_property_replacement_factor: context.missing_property_replacement_factor,
        property_rank_decay: context.property_rank_decay,
        output_column: context.output_column.clone(),
        workers: table.workers,
    };
    options.validate()?;

    let values_path = source.values_path()?;
    debug!(source = source.kind(), path = %values_path.display(), "loading context");
    let records = read_context_file(values_path).context("load context file")?;
    let index = ContextIndex::from_records(records);
    if index.skipped() > 0 {
        warn!(skipped = index.skipped(), "malformed context entries skipped");
    }

    let mut df = read_candidates(table.input.as_deref()).context("read candidate table")?;
    let rows = extract_candidates(&df, columns)?;
    let ContextMatchOutput { matches, relevance } = match_context(&rows, &index, &options, mode)?;

    let saved = match &context.save_property_scores_path {
        Some(path) => Some(
            write_relevance(path, &relevance.records()).context("save property scores")?,
        ),
        None => None,
    };

    let scores: Vec<f64> = matches.iter().map(|matched| matched.score).collect();
    let properties: Vec<String> = matches.iter().map(ContextMatch::property_list).collect();
    let similarities: Vec<String> = matches.iter().map(ContextMatch::similarity_list).collect();
    append_f64_column(&mut df, &options.output_column, &scores)?;
    append_str_column(&mut df, CONTEXT_PROPERTY_COLUMN, &properties)?;
    append_str_column(&mut df, CONTEXT_SIMILARITY_COLUMN, &similarities)?;
    finish(&mut df, table)?;
    Ok((rows.len(), saved))
}

fn run_semantic_feature(args: &SemanticFeatureArgs) -> Result<usize> {
    let options = SemanticOptions {
        output_column: args.output_column.clone(),
        feature_name: args.feature_name.clone(),
        total_docs: args.total_docs,
        workers: args.table.workers,
    };
    options.validate()?;

    let records =
        read_feature_file(&args.feature_file, &options.feature_name).context("load feature file")?;
    let dictionary = FeatureDictionary::build(records);
    let idf = IdfTable::compute(dictionary.counts(), options.total_docs);
    debug!(
        candidates = dictionary.len(),
        classes = idf.len(),
        "feature dictionary built"
    );

    let columns = CandidateColumns {
        method: Some(args.method_column.clone()),
        pagerank: Some(args.pagerank_column.clone()),
        retrieval_score: Some(args.retrieval_score_column.clone()),
        ..CandidateColumns::default()
    };
    let mut df = read_candidates(args.table.input.as_deref()).context("read candidate table")?;
    let rows = extract_candidates(&df, &columns)?;
    let scored = score_semantics(&rows, &dictionary, &idf, &options)?;

    append_f64_column(&mut df, PGR_RTS_COLUMN, &scored.high_confidence.pgr_rts)?;
    append_flag_column(&mut df, HIGH_CONFIDENCE_COLUMN, &scored.high_confidence.flags)?;
    append_f64_column(&mut df, &options.output_column, &scored.scores)?;
    append_str_column(&mut df, &options.top5_column(), &scored.top5)?;
    finish(&mut df, &args.table)?;
    Ok(rows.len())
}

fn finish(df: &mut DataFrame, table: &TableArgs) -> Result<()> {
    write_candidates(df, table.output_file.as_deref()).context("write scored table")?;
    Ok(())
}
