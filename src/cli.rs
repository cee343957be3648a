//! CLI argument parsing for egrastats

use crate::analysis::{AnalysisConfig, GroupDimension, DEFAULT_ID_COLUMN};
use crate::catalog::Locale;
use crate::narrative::NarrativeKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV table of group statistics
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "egrastats")]
#[command(version)]
#[command(
    about = "Group comparison, reliability and benchmark scoring for EGRA/EGMA assessment data",
    long_about = None
)]
pub struct Cli {
    /// CSV dataset (header row, one student per row)
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Grouping dimension: school, gender, language, ses, home_support,
    /// terciles:<column> or any column name
    #[arg(short = 'g', long = "group", value_name = "DIMENSION")]
    pub group: Option<GroupDimension>,

    /// Second dimension for a mean-per-cell cross-tabulation with --group
    #[arg(long = "cross", value_name = "DIMENSION")]
    pub cross: Option<GroupDimension>,

    /// Print one student's report card instead of the group comparison
    #[arg(long = "student", value_name = "ID")]
    pub student: Option<String>,

    /// Column holding student identifiers
    #[arg(long = "id-column", value_name = "COLUMN", default_value = DEFAULT_ID_COLUMN)]
    pub id_column: String,

    /// Metric columns to analyse (comma separated); default: every known metric present
    #[arg(short = 'm', long = "metrics", value_name = "CODES", value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Pairwise correlation and regression between metrics
    #[arg(long = "correlation")]
    pub correlation: bool,

    /// Cronbach's alpha over the metric set and each assessment
    #[arg(long = "reliability")]
    pub reliability: bool,

    /// Count students scoring exactly zero
    #[arg(long = "zero-scores")]
    pub zero_scores: bool,

    /// Compare dataset means with international reference scores
    #[arg(long = "international")]
    pub international: bool,

    /// Run every optional analysis
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Minimum |r| for a strong correlation (default: 0.5)
    #[arg(long = "strong-threshold", value_name = "R")]
    pub strong_threshold: Option<f64>,

    /// Significance level for group tests (default: 0.05)
    #[arg(long = "significance-level", value_name = "ALPHA")]
    pub significance_level: Option<f64>,

    /// TOML configuration file ([analysis] table and [[metric]] overrides)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Locale for metric display names
    #[arg(long = "locale", value_enum, default_value = "en")]
    pub locale: Locale,

    /// Append a narrative interpretation
    #[arg(long = "narrative", value_enum, value_name = "KIND")]
    pub narrative: Option<NarrativeKind>,

    /// Seed for narrative recommendation sampling
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Log engine decisions to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a file (or default) configuration
    pub fn analysis_config(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(group) = &self.group {
            config.group_by = group.clone();
        }
        if let Some(cross) = &self.cross {
            config.cross_by = Some(cross.clone());
        }
        if !self.metrics.is_empty() {
            config.metrics = self.metrics.clone();
        }
        config.correlation |= self.correlation || self.all;
        config.reliability |= self.reliability || self.all;
        config.zero_scores |= self.zero_scores || self.all;
        config.international |= self.international || self.all;
        if let Some(threshold) = self.strong_threshold {
            config.strong_threshold = threshold;
        }
        if let Some(level) = self.significance_level {
            config.significance_level = level;
        }
        config
    }
}
