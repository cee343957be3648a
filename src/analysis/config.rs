// Configuration for a single comparison request
//
// Defaults follow the dashboards: alpha = 0.05 for significance and
// |r| >= 0.5 for a "strong" correlation. Both are overridable.

use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conventional significance level
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Conventional correlation strength cut-off
pub const DEFAULT_STRONG_THRESHOLD: f64 = 0.5;

/// Dimension used to partition students into groups
///
/// The named dimensions map to the column names used by EGRA/EGMA exports;
/// `Column` groups by any raw column and `Terciles` cuts any numeric column
/// into Low/Medium/High.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupDimension {
    #[default]
    School,
    /// `stgender`, normalised to Boy/Girl
    Gender,
    /// `language_teaching`
    Language,
    /// `ses`, split into Low/Medium/High terciles
    Ses,
    /// `home_support`, split into Low/Medium/High terciles
    HomeSupport,
    Column(String),
    Terciles(String),
}

impl GroupDimension {
    /// Dataset column the dimension reads
    pub fn column_name(&self) -> &str {
        match self {
            GroupDimension::School => "school",
            GroupDimension::Gender => "stgender",
            GroupDimension::Language => "language_teaching",
            GroupDimension::Ses => "ses",
            GroupDimension::HomeSupport => "home_support",
            GroupDimension::Column(name) | GroupDimension::Terciles(name) => name,
        }
    }

    /// True when labels come from 0.33/0.67 quantile cuts
    pub fn is_tercile(&self) -> bool {
        matches!(
            self,
            GroupDimension::Ses | GroupDimension::HomeSupport | GroupDimension::Terciles(_)
        )
    }
}

impl FromStr for GroupDimension {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::configuration("empty grouping dimension"));
        }
        if let Some(column) = trimmed.strip_prefix("terciles:") {
            let column = column.trim();
            if column.is_empty() {
                return Err(AnalysisError::configuration("terciles: needs a column name"));
            }
            return Ok(GroupDimension::Terciles(column.to_string()));
        }
        Ok(match trimmed.to_ascii_lowercase().as_str() {
            "school" => GroupDimension::School,
            "gender" => GroupDimension::Gender,
            "language" => GroupDimension::Language,
            "ses" => GroupDimension::Ses,
            "home_support" | "home-support" => GroupDimension::HomeSupport,
            _ => GroupDimension::Column(trimmed.to_string()),
        })
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupDimension::School => write!(f, "school"),
            GroupDimension::Gender => write!(f, "gender"),
            GroupDimension::Language => write!(f, "language"),
            GroupDimension::Ses => write!(f, "ses"),
            GroupDimension::HomeSupport => write!(f, "home_support"),
            GroupDimension::Column(name) => write!(f, "{}", name),
            GroupDimension::Terciles(name) => write!(f, "terciles:{}", name),
        }
    }
}

/// What to compute for one dataset
///
/// # Example
/// ```
/// use egrastats::analysis::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.significance_level, 0.05);
/// assert_eq!(config.strong_threshold, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub group_by: GroupDimension,

    /// Second dimension for the mean-per-cell cross-tabulation
    pub cross_by: Option<GroupDimension>,

    /// Metric columns to analyse; empty means every catalog metric present in the dataset
    pub metrics: Vec<String>,

    /// Pairwise Pearson/Spearman correlation and OLS regression
    pub correlation: bool,

    /// Cronbach's alpha over the metric set and each assessment family
    pub reliability: bool,

    /// Share of students scoring exactly zero
    pub zero_scores: bool,

    /// Dataset means against international reference scores
    pub international: bool,

    /// Minimum |r| for the strong-correlation view
    pub strong_threshold: f64,

    /// p-value below which a group difference is significant
    pub significance_level: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            group_by: GroupDimension::School,
            cross_by: None,
            metrics: Vec::new(),
            correlation: false,
            reliability: false,
            zero_scores: false,
            international: false,
            strong_threshold: DEFAULT_STRONG_THRESHOLD,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl AnalysisConfig {
    /// Everything switched on
    pub fn full(group_by: GroupDimension) -> Self {
        Self {
            group_by,
            correlation: true,
            reliability: true,
            zero_scores: true,
            international: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(AnalysisError::configuration(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }

        if !(0.0..=1.0).contains(&self.strong_threshold) {
            return Err(AnalysisError::configuration(format!(
                "strong_threshold must be in [0, 1], got {}",
                self.strong_threshold
            )));
        }

        if self.cross_by.as_ref() == Some(&self.group_by) {
            return Err(AnalysisError::configuration(format!(
                "cross_by repeats the grouping dimension {}",
                self.group_by
            )));
        }

        if self.metrics.iter().any(|m| m.trim().is_empty()) {
            return Err(AnalysisError::configuration("empty metric name"));
        }

        Ok(())
    }
}
