// Proficiency classification against metric thresholds

use crate::catalog::{MetricCatalog, MetricDefinition};
use crate::dataset::{Dataset, Value};
use crate::error::AnalysisError;
use crate::stats::{mean, round_to};
use serde::Serialize;

/// Proficiency band of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BenchmarkStatus {
    Mastery,
    Developing,
    Emerging,
    /// Outside every band, non-numeric or missing
    Unknown,
}

impl BenchmarkStatus {
    pub const ALL: [BenchmarkStatus; 4] = [
        BenchmarkStatus::Mastery,
        BenchmarkStatus::Developing,
        BenchmarkStatus::Emerging,
        BenchmarkStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkStatus::Mastery => "Mastery",
            BenchmarkStatus::Developing => "Developing",
            BenchmarkStatus::Emerging => "Emerging",
            BenchmarkStatus::Unknown => "Unknown",
        }
    }
}

/// Total over every f64; NaN is `Unknown`
///
/// # Example
/// ```
/// use egrastats::analysis::{classify, BenchmarkStatus};
/// use egrastats::catalog::MetricCatalog;
///
/// let catalog = MetricCatalog::builtin();
/// let addition = catalog.get("addition").unwrap();
/// assert_eq!(classify(10.0, addition), BenchmarkStatus::Mastery);
/// assert_eq!(classify(7.0, addition), BenchmarkStatus::Developing);
/// assert_eq!(classify(-1.0, addition), BenchmarkStatus::Unknown);
/// ```
pub fn classify(score: f64, metric: &MetricDefinition) -> BenchmarkStatus {
    if score >= metric.mastery {
        BenchmarkStatus::Mastery
    } else if metric.developing.contains(score) {
        BenchmarkStatus::Developing
    } else if metric.emerging.contains(score) {
        BenchmarkStatus::Emerging
    } else {
        BenchmarkStatus::Unknown
    }
}

pub fn classify_option(score: Option<f64>, metric: &MetricDefinition) -> BenchmarkStatus {
    score.map_or(BenchmarkStatus::Unknown, |s| classify(s, metric))
}

pub fn classify_value(value: &Value, metric: &MetricDefinition) -> BenchmarkStatus {
    classify_option(value.as_f64(), metric)
}

/// Students per band for one group and metric
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BandDistribution {
    pub mastery: usize,
    pub developing: usize,
    pub emerging: usize,
    pub unknown: usize,
}

impl BandDistribution {
    pub fn add(&mut self, status: BenchmarkStatus) {
        match status {
            BenchmarkStatus::Mastery => self.mastery += 1,
            BenchmarkStatus::Developing => self.developing += 1,
            BenchmarkStatus::Emerging => self.emerging += 1,
            BenchmarkStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn count(&self, status: BenchmarkStatus) -> usize {
        match status {
            BenchmarkStatus::Mastery => self.mastery,
            BenchmarkStatus::Developing => self.developing,
            BenchmarkStatus::Emerging => self.emerging,
            BenchmarkStatus::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.mastery + self.developing + self.emerging + self.unknown
    }

    /// Percentage of students at Mastery, `None` without students
    pub fn mastery_percent(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| round_to(self.mastery as f64 * 100.0 / total as f64, 1))
    }
}

/// Band counts over non-missing scores
pub fn band_distribution(scores: &[f64], metric: &MetricDefinition) -> BandDistribution {
    let mut dist = BandDistribution::default();
    for &s in scores {
        dist.add(classify(s, metric));
    }
    dist
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InternationalCategory {
    Critical,
    Concerning,
    Approaching,
    Meeting,
}

impl InternationalCategory {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            InternationalCategory::Meeting
        } else if percent >= 85.0 {
            InternationalCategory::Approaching
        } else if percent >= 70.0 {
            InternationalCategory::Concerning
        } else {
            InternationalCategory::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InternationalCategory::Critical => "critical",
            InternationalCategory::Concerning => "concerning",
            InternationalCategory::Approaching => "approaching",
            InternationalCategory::Meeting => "meeting",
        }
    }
}

/// Dataset mean against a metric's international reference score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternationalComparison {
    pub metric: String,
    pub mean: f64,
    pub standard: f64,
    pub gap: f64,
    pub percent_of_standard: f64,
    pub category: InternationalCategory,
}

/// `None` when the metric has no international standard
pub fn compare_international(
    metric: &MetricDefinition,
    mean: f64,
) -> Option<InternationalComparison> {
    let standard = metric.international_standard?;
    let percent = round_to(mean / standard * 100.0, 1);
    Some(InternationalComparison {
        metric: metric.code.clone(),
        mean,
        standard,
        gap: mean - standard,
        percent_of_standard: percent,
        category: InternationalCategory::from_percent(percent),
    })
}

/// International comparison for each metric with a standard and at least one score
pub fn international_comparisons(
    dataset: &Dataset,
    catalog: &MetricCatalog,
    metrics: &[String],
) -> (Vec<InternationalComparison>, Vec<AnalysisError>) {
    let mut comparisons = Vec::new();
    let mut warnings = Vec::new();

    for code in metrics {
        let Some(def) = catalog.get(code) else {
            continue;
        };
        let values: Vec<f64> = match dataset.numeric_column(code) {
            Ok(col) => col.into_iter().flatten().collect(),
            Err(e) => {
                warnings.push(e);
                continue;
            }
        };
        if let Some(comparison) = mean(&values).and_then(|m| compare_international(def, m)) {
            comparisons.push(comparison);
        }
    }

    (comparisons, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addition() -> MetricDefinition {
        MetricCatalog::builtin().get("addition").unwrap().clone()
    }

    #[test]
    fn test_classify_addition() {
        let m = addition();
        assert_eq!(classify(10.0, &m), BenchmarkStatus::Mastery);
        assert_eq!(classify(15.0, &m), BenchmarkStatus::Mastery);
        assert_eq!(classify(7.0, &m), BenchmarkStatus::Developing);
        assert_eq!(classify(3.0, &m), BenchmarkStatus::Emerging);
        assert_eq!(classify(0.0, &m), BenchmarkStatus::Emerging);
        assert_eq!(classify(-1.0, &m), BenchmarkStatus::Unknown);
    }

    #[test]
    fn test_classify_gap_between_bands() {
        let m = addition();
        // 5.5 falls between Emerging (0..=5) and Developing (6..=9)
        assert_eq!(classify(5.5, &m), BenchmarkStatus::Unknown);
        assert_eq!(classify(9.5, &m), BenchmarkStatus::Unknown);
    }

    #[test]
    fn test_classify_non_numeric() {
        let m = addition();
        assert_eq!(classify(f64::NAN, &m), BenchmarkStatus::Unknown);
        assert_eq!(classify(f64::INFINITY, &m), BenchmarkStatus::Mastery);
        assert_eq!(classify_value(&Value::Missing, &m), BenchmarkStatus::Unknown);
        assert_eq!(classify_value(&"absent".into(), &m), BenchmarkStatus::Unknown);
        assert_eq!(classify_option(Some(8.0), &m), BenchmarkStatus::Developing);
    }

    #[test]
    fn test_band_distribution() {
        let dist = band_distribution(&[12.0, 10.0, 7.0, 2.0, 5.5], &addition());
        assert_eq!(dist.mastery, 2);
        assert_eq!(dist.developing, 1);
        assert_eq!(dist.emerging, 1);
        assert_eq!(dist.unknown, 1);
        assert_eq!(dist.total(), 5);
        assert_eq!(dist.mastery_percent(), Some(40.0));
        assert_eq!(BandDistribution::default().mastery_percent(), None);
    }

    #[test]
    fn test_international_categories() {
        let m = addition(); // standard 16
        let c = compare_international(&m, 8.0).unwrap();
        assert_eq!(c.percent_of_standard, 50.0);
        assert_eq!(c.gap, -8.0);
        assert_eq!(c.category, InternationalCategory::Critical);

        assert_eq!(
            compare_international(&m, 12.0).unwrap().category,
            InternationalCategory::Concerning
        );
        assert_eq!(
            compare_international(&m, 14.0).unwrap().category,
            InternationalCategory::Approaching
        );
        assert_eq!(
            compare_international(&m, 16.0).unwrap().category,
            InternationalCategory::Meeting
        );
    }

    #[test]
    fn test_no_international_standard() {
        let mut m = addition();
        m.international_standard = None;
        assert!(compare_international(&m, 10.0).is_none());
    }

    #[test]
    fn test_international_comparisons_over_dataset() {
        let ds = Dataset::from_columns(vec![
            ("addition", vec![8.0.into(), 24.0.into(), Value::Missing]),
            ("custom", vec![1.0.into(), 2.0.into(), 3.0.into()]),
        ])
        .unwrap();
        let metrics = vec![
            "addition".to_string(),
            "custom".to_string(),
            "subtraction".to_string(),
        ];

        let (comparisons, warnings) =
            international_comparisons(&ds, &MetricCatalog::builtin(), &metrics);
        assert_eq!(comparisons.len(), 1);
        assert_eq!(comparisons[0].mean, 16.0);
        assert_eq!(comparisons[0].category, InternationalCategory::Meeting);
        assert_eq!(warnings, vec![AnalysisError::missing_column("subtraction")]);
    }
}
