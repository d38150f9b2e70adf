//! Configuration options for the scoring engines.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TlError};

/// Minimum similarities below which a comparison counts as no match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub string: f64,
    pub quantity: f64,
    pub date: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            string: 0.75,
            quantity: 0.85,
            date: 0.9,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("string", self.string),
            ("quantity", self.quantity),
            ("date", self.date),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(TlError::configuration(format!(
                    "{name} similarity threshold must be in (0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Where candidate property values (and optionally property relevance) come from.
///
/// Resolved once from the command line; exactly one variant is active per run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContextSource {
    Standard(PathBuf),
    Custom(PathBuf),
    /// Reuse a saved relevance table; property values still come from `context`.
    CachedRelevance {
        relevance: PathBuf,
        context: PathBuf,
    },
    #[default]
    None,
}

impl ContextSource {
    /// Resolve the mutually exclusive context flags.
    ///
    /// # Errors
    ///
    /// Returns [`TlError::Configuration`] when both context files are given,
    /// or when cached relevance is requested without a context file.
    pub fn from_flags(
        context_file: Option<PathBuf>,
        custom_context_file: Option<PathBuf>,
        saved_relevance: Option<PathBuf>,
    ) -> Result<Self> {
        let values = match (context_file, custom_context_file) {
            (Some(_), Some(_)) => {
                return Err(TlError::configuration(
                    "--context-file and --custom-context-file are mutually exclusive",
                ));
            }
            (Some(path), None) => Some((path, false)),
            (None, Some(path)) => Some((path, true)),
            (None, None) => None,
        };
        match (saved_relevance, values) {
            (Some(relevance), Some((context, _))) => Ok(Self::CachedRelevance { relevance, context }),
            (Some(_), None) => Err(TlError::configuration(
                "saved property scores need a context file for property values",
            )),
            (None, Some((path, false))) => Ok(Self::Standard(path)),
            (None, Some((path, true))) => Ok(Self::Custom(path)),
            (None, None) => Ok(Self::None),
        }
    }

    /// File holding candidate property values.
    ///
    /// # Errors
    ///
    /// Returns [`TlError::MissingContextSource`] for [`ContextSource::None`].
    pub fn values_path(&self) -> Result<&Path> {
        match self {
            Self::Standard(path) | Self::Custom(path) => Ok(path),
            Self::CachedRelevance { context, .. } => Ok(context),
            Self::None => Err(TlError::MissingContextSource),
        }
    }

    pub fn relevance_path(&self) -> Option<&Path> {
        match self {
            Self::CachedRelevance { relevance, .. } => Some(relevance),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Standard(_) => "standard",
            Self::Custom(_) => "custom",
            Self::CachedRelevance { .. } => "cached-relevance",
            Self::None => "none",
        }
    }
}

/// Options for the context-matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMatchOptions {
    pub thresholds: Thresholds,
    /// Splits multi-valued strings into comparable pieces.
    pub separator: char,
    /// Multiplied with the candidate's weakest matched similarity to impute
    /// a position whose significant property the candidate lacks.
    pub missing_property_replacement_factor: f64,
    /// Weight of rank `r` is `property_rank_decay^r`.
    pub property_rank_decay: f64,
    pub output_column: String,
    pub workers: usize,
}

impl Default for ContextMatchOptions {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            separator: ',',
            missing_property_replacement_factor: 0.25,
            property_rank_decay: 0.5,
            output_column: "context_score".to_string(),
            workers: 1,
        }
    }
}

impl ContextMatchOptions {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        check_unit_interval(
            "missing property replacement factor",
            self.missing_property_replacement_factor,
        )?;
        check_unit_interval("property rank decay", self.property_rank_decay)?;
        if self.property_rank_decay == 0.0 {
            return Err(TlError::configuration("property rank decay must be positive"));
        }
        check_output_column(&self.output_column)?;
        check_workers(self.workers)
    }
}

/// Options for the semantic class-propagation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticOptions {
    pub output_column: String,
    /// Column of the feature file holding the class list.
    pub feature_name: String,
    /// Total document count `N` used for IDF.
    pub total_docs: f64,
    pub workers: usize,
}

impl Default for SemanticOptions {
    fn default() -> Self {
        Self {
            output_column: "semantic_score".to_string(),
            feature_name: "class_count".to_string(),
            total_docs: 1.0,
            workers: 1,
        }
    }
}

impl SemanticOptions {
    pub fn validate(&self) -> Result<()> {
        check_output_column(&self.output_column)?;
        if self.feature_name.trim().is_empty() {
            return Err(TlError::configuration("feature name must not be empty"));
        }
        if !(self.total_docs.is_finite() && self.total_docs > 0.0) {
            return Err(TlError::configuration(format!(
                "total docs must be positive, got {}",
                self.total_docs
            )));
        }
        check_workers(self.workers)
    }

    pub fn top5_column(&self) -> String {
        format!("top5_{}", self.output_column)
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TlError::configuration(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

fn check_output_column(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(TlError::configuration("output column name must not be empty"))
    } else {
        Ok(())
    }
}

fn check_workers(workers: usize) -> Result<()> {
    if workers == 0 {
        Err(TlError::configuration("worker count must be positive"))
    } else {
        Ok(())
    }
}
