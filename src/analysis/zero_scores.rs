// Students scoring exactly zero per metric

use crate::dataset::Dataset;
use crate::error::AnalysisError;
use crate::stats::round_to;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZeroScoreSummary {
    pub metric: String,
    pub zero_count: usize,
    /// Share of every dataset row, not only observed ones
    pub percent: f64,
}

/// Zero-score count and percentage per metric
///
/// Percentages are over all rows, rounded to two decimals. Missing and
/// non-numeric metrics go to the warnings list.
pub fn zero_scores(
    dataset: &Dataset,
    metrics: &[String],
) -> (Vec<ZeroScoreSummary>, Vec<AnalysisError>) {
    let total = dataset.len();
    let mut summaries = Vec::new();
    let mut warnings = Vec::new();

    for metric in metrics {
        match dataset.numeric_column(metric) {
            Ok(values) => {
                let zero_count = values.iter().filter(|v| **v == Some(0.0)).count();
                let percent = if total == 0 {
                    0.0
                } else {
                    round_to(zero_count as f64 * 100.0 / total as f64, 2)
                };
                summaries.push(ZeroScoreSummary {
                    metric: metric.clone(),
                    zero_count,
                    percent,
                });
            }
            Err(e) => warnings.push(e),
        }
    }

    (summaries, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    #[test]
    fn test_zero_scores_over_all_rows() {
        let ds = Dataset::from_columns(vec![
            ("clpm", vec![0.0.into(), 0.0.into(), 5.0.into(), Value::Missing, 3.0.into(), 0.0.into()]),
            ("orf", vec![1.0.into(); 6]),
        ])
        .unwrap();

        let (summaries, warnings) =
            zero_scores(&ds, &["clpm".to_string(), "orf".to_string(), "x".to_string()]);

        assert_eq!(summaries[0].zero_count, 3);
        assert_eq!(summaries[0].percent, 50.0);
        assert_eq!(summaries[1].zero_count, 0);
        assert_eq!(summaries[1].percent, 0.0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_percent_rounding() {
        let ds = Dataset::from_columns(vec![(
            "clpm",
            vec![0.0.into(), 1.0.into(), 2.0.into()],
        )])
        .unwrap();
        let (summaries, _) = zero_scores(&ds, &["clpm".to_string()]);
        assert_eq!(summaries[0].percent, 33.33);
    }
}
