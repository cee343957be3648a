// Report card for a single student
//
// Each catalog metric present in the dataset is scored against its
// thresholds and set beside the mean of the student's reference group
// (school by default). When the reference column is absent the whole
// dataset is the reference.

use super::benchmark::{classify_option, BenchmarkStatus};
use super::config::GroupDimension;
use super::grouping::group_labels;
use crate::catalog::{Assessment, MetricCatalog};
use crate::dataset::Dataset;
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats::mean;
use serde::Serialize;

/// Default column holding student identifiers
pub const DEFAULT_ID_COLUMN: &str = "pupil_id";

/// One metric on a student's report card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorStatus {
    pub metric: String,
    pub assessment: Assessment,
    /// `None` when the student has no score for this metric
    pub score: Option<f64>,
    /// Mastery threshold
    pub standard: f64,
    pub status: BenchmarkStatus,
    pub reference_mean: Option<f64>,
    /// score - reference_mean
    pub difference: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    pub id_column: String,
    pub id: String,
    /// Zero-based data row
    pub row: usize,
    pub reference_dimension: GroupDimension,
    /// Student's label on the reference dimension; `None` means whole dataset
    pub reference_group: Option<String>,
    pub indicators: Vec<IndicatorStatus>,
    /// Catalog metrics present but not numeric
    pub warnings: Vec<AnalysisError>,
}

impl StudentProfile {
    pub fn assessment(&self, assessment: Assessment) -> impl Iterator<Item = &IndicatorStatus> {
        self.indicators
            .iter()
            .filter(move |i| i.assessment == assessment)
    }

    pub fn indicator(&self, metric: &str) -> Option<&IndicatorStatus> {
        self.indicators.iter().find(|i| i.metric == metric)
    }

    pub fn count(&self, status: BenchmarkStatus) -> usize {
        self.indicators.iter().filter(|i| i.status == status).count()
    }
}

/// Locate the student whose `id_column` equals `id` and build their profile
///
/// Repeated identifiers resolve to the first matching row.
///
/// # Example
/// ```
/// use egrastats::analysis::{student_profile, BenchmarkStatus, GroupDimension};
/// use egrastats::catalog::MetricCatalog;
/// use egrastats::dataset::Dataset;
///
/// let ds = Dataset::from_csv_str("pupil_id,school,addition\np1,A,12\np2,A,4\n").unwrap();
/// let profile = student_profile(
///     &ds,
///     &MetricCatalog::builtin(),
///     "pupil_id",
///     "p1",
///     &GroupDimension::School,
/// )
/// .unwrap();
///
/// let addition = profile.indicator("addition").unwrap();
/// assert_eq!(addition.status, BenchmarkStatus::Mastery);
/// assert_eq!(addition.reference_mean, Some(8.0));
/// ```
pub fn student_profile(
    dataset: &Dataset,
    catalog: &MetricCatalog,
    id_column: &str,
    id: &str,
    reference: &GroupDimension,
) -> AnalysisResult<StudentProfile> {
    let ids = dataset.column(id_column)?;
    let wanted = id.trim();
    let matches: Vec<usize> = ids
        .iter()
        .enumerate()
        .filter(|(_, v)| v.label().is_some_and(|label| label.trim() == wanted))
        .map(|(row, _)| row)
        .collect();
    let Some(&row) = matches.first() else {
        return Err(AnalysisError::UnknownStudent {
            column: id_column.to_string(),
            id: wanted.to_string(),
        });
    };
    if matches.len() > 1 {
        tracing::warn!(
            "{} rows have {} = {}, using row {}",
            matches.len(),
            id_column,
            wanted,
            row
        );
    }

    // rows sharing the student's reference label
    let (reference_group, peers): (Option<String>, Vec<bool>) =
        match group_labels(dataset, reference) {
            Ok(labels) => {
                let own = labels[row].clone();
                let peers = labels
                    .iter()
                    .map(|label| own.is_none() || *label == own)
                    .collect();
                (own, peers)
            }
            Err(e) => {
                tracing::debug!("Reference {} unavailable ({}), using whole dataset", reference, e);
                (None, vec![true; dataset.len()])
            }
        };

    let mut indicators = Vec::new();
    let mut warnings = Vec::new();
    for definition in catalog.iter() {
        if !dataset.has_column(&definition.code) {
            continue;
        }
        let values = match dataset.numeric_column(&definition.code) {
            Ok(values) => values,
            Err(e) => {
                warnings.push(e);
                continue;
            }
        };

        let score = values[row];
        let peer_scores: Vec<f64> = values
            .iter()
            .zip(&peers)
            .filter_map(|(v, peer)| v.filter(|_| *peer))
            .collect();
        let reference_mean = mean(&peer_scores);

        indicators.push(IndicatorStatus {
            metric: definition.code.clone(),
            assessment: definition.assessment,
            score,
            standard: definition.mastery,
            status: classify_option(score, definition),
            reference_mean,
            difference: score.zip(reference_mean).map(|(s, m)| s - m),
        });
    }

    Ok(StudentProfile {
        id_column: id_column.to_string(),
        id: wanted.to_string(),
        row,
        reference_dimension: reference.clone(),
        reference_group,
        indicators,
        warnings,
    })
}
