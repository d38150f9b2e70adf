//! CLI argument definitions for the table linker.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tl",
    version,
    about = "Table linker - score candidate entities for table cells",
    long_about = "Score knowledge-graph candidates proposed for table cells.\n\n\
                  context-match compares candidate property values with the rest of the row;\n\
                  semantic-feature compares candidate classes with the column's confident picks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score candidates by how well their property values match the row context.
    ContextMatch(ContextMatchArgs),

    /// Learn property relevance from pseudo ground truth rows and score with it.
    ComputePropertyScores(ComputePropertyScoresArgs),

    /// Score candidates by class agreement with the column's high-confidence candidates.
    SemanticFeature(SemanticFeatureArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContextMatch(_) => "context-match",
            Self::ComputePropertyScores(_) => "compute-property-scores",
            Self::SemanticFeature(_) => "semantic-feature",
        }
    }
}

/// Candidate table input and output shared by every command.
#[derive(Args)]
pub struct TableArgs {
    /// Candidate table (CSV); read from stdin when omitted or `-`.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Write the scored table here instead of stdout.
    #[arg(long = "output-file", value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Worker threads used to score columns in parallel.
    #[arg(long = "workers", alias = "use-cpus", default_value_t = default_workers())]
    pub workers: usize,
}

/// Context lookup and matching knobs shared by the context commands.
#[derive(Args)]
pub struct ContextArgs {
    /// Context file (qnode, context; TSV, optionally gzip-compressed).
    #[arg(long = "context-file", value_name = "PATH")]
    pub context_file: Option<PathBuf>,

    /// Custom context file with the same layout as --context-file.
    #[arg(long = "custom-context-file", value_name = "PATH")]
    pub custom_context_file: Option<PathBuf>,

    /// Minimum similarity for quantity matches.
    #[arg(long = "similarity-quantity-threshold", default_value_t = 0.85)]
    pub quantity_threshold: f64,

    /// Minimum similarity for date matches.
    #[arg(long = "similarity-date-threshold", default_value_t = 0.9)]
    pub date_threshold: f64,

    /// Separator of the substrings within one context value.
    #[arg(long = "string-separator", default_value_t = ',')]
    pub string_separator: char,

    /// Multiplied with the weakest matched similarity to impute a missing property.
    #[arg(long = "missing-property-replacement-factor", default_value_t = 0.25)]
    pub missing_property_replacement_factor: f64,

    /// Weight ratio between consecutive property ranks.
    #[arg(long = "property-rank-decay", default_value_t = 0.5)]
    pub property_rank_decay: f64,

    /// Column holding the row context (`|`-separated cell values).
    #[arg(long = "context-column-name", default_value = "context")]
    pub context_column: String,

    /// Name of the score column.
    #[arg(short = 'o', long = "output-column-name", default_value = "context_score")]
    pub output_column: String,

    /// Save the property relevance used for scoring (file or directory).
    #[arg(long = "save-property-scores-path", value_name = "PATH")]
    pub save_property_scores_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ContextMatchArgs {
    #[command(flatten)]
    pub table: TableArgs,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Minimum similarity for string matches.
    #[arg(long = "similarity-string-threshold", default_value_t = 0.75)]
    pub string_threshold: f64,

    /// Rows with this column set to 1 are not matched.
    #[arg(long = "ignore-column-name")]
    pub ignore_column: Option<String>,

    /// Derive property relevance only from rows with this column set to 1.
    #[arg(long = "pseudo-gt-column-name")]
    pub pseudo_gt_column: Option<String>,

    /// Reuse property relevance saved by an earlier run (file or directory).
    #[arg(long = "use-saved-property-scores-path", value_name = "PATH")]
    pub use_saved_property_scores_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ComputePropertyScoresArgs {
    #[command(flatten)]
    pub table: TableArgs,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Minimum similarity for string matches.
    #[arg(long = "similarity-string-threshold", default_value_t = 0.80)]
    pub string_threshold: f64,

    /// Pseudo ground truth column; only rows set to 1 vote for relevance.
    #[arg(long = "pseudo-gt-column-name", default_value = "pseudo_gt")]
    pub pseudo_gt_column: String,
}

#[derive(Args)]
pub struct SemanticFeatureArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Feature file (qnode plus a `|`-separated class column).
    #[arg(long = "feature-file", value_name = "PATH")]
    pub feature_file: PathBuf,

    /// Column of the feature file holding the classes.
    #[arg(long = "feature-name", default_value = "class_count")]
    pub feature_name: String,

    /// Total document count used for IDF.
    #[arg(long = "total-docs")]
    pub total_docs: f64,

    /// Candidate generation method column.
    #[arg(long = "method-column-name", default_value = "method")]
    pub method_column: String,

    /// Pagerank column.
    #[arg(long = "pagerank-column", default_value = "pagerank")]
    pub pagerank_column: String,

    /// Retrieval score column.
    #[arg(long = "retrieval-score-column", default_value = "retrieval_score")]
    pub retrieval_score_column: String,

    /// Name of the score column; the explanation goes to `top5_<name>`.
    #[arg(short = 'o', long = "output-column-name", default_value = "semantic_score")]
    pub output_column: String,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
