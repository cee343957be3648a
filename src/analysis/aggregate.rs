// Per-group descriptive statistics
//
// Missing group values exclude a row from every group. Metric columns that
// are absent or not numeric are reported as warnings and skipped.

use super::config::GroupDimension;
use super::grouping::{excluded_count, group_labels, partition};
use crate::dataset::Dataset;
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats::Summary;
use serde::Serialize;
use std::collections::BTreeMap;

/// Descriptive statistics of one metric within one group
///
/// With no observations `count` is 0 and every other field is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStatistics {
    pub group: String,
    pub metric: String,
    #[serde(flatten)]
    pub summary: Summary,
}

impl GroupStatistics {
    pub fn count(&self) -> usize {
        self.summary.count
    }

    pub fn mean(&self) -> Option<f64> {
        self.summary.mean
    }

    pub fn is_defined(&self) -> bool {
        self.summary.count > 0
    }
}

/// Highest and lowest group mean for a metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRanking {
    pub metric: String,
    pub highest_group: String,
    pub highest_mean: f64,
    pub lowest_group: String,
    pub lowest_mean: f64,
    pub range: f64,
}

/// Output of [`aggregate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub group_column: String,
    /// Metrics that were numeric and present, in request order
    pub metrics: Vec<String>,
    /// group -> metric -> statistics
    pub groups: BTreeMap<String, BTreeMap<String, GroupStatistics>>,
    /// Rows dropped because their group value was missing
    pub excluded_rows: usize,
    /// Skipped metric columns (missing or non-numeric)
    pub warnings: Vec<AnalysisError>,
}

impl Aggregation {
    pub fn get(&self, group: &str, metric: &str) -> Option<&GroupStatistics> {
        self.groups.get(group)?.get(metric)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Best and worst group by mean, over groups with a defined mean
    pub fn ranking(&self, metric: &str) -> Option<GroupRanking> {
        let means: Vec<(&str, f64)> = self
            .groups
            .iter()
            .filter_map(|(g, m)| Some((g.as_str(), m.get(metric)?.mean()?)))
            .collect();

        // first wins on ties, giving the lexically smallest group
        let mut highest = *means.first()?;
        let mut lowest = highest;
        for &(group, mean) in &means[1..] {
            if mean > highest.1 {
                highest = (group, mean);
            }
            if mean < lowest.1 {
                lowest = (group, mean);
            }
        }

        Some(GroupRanking {
            metric: metric.to_string(),
            highest_group: highest.0.to_string(),
            highest_mean: highest.1,
            lowest_group: lowest.0.to_string(),
            lowest_mean: lowest.1,
            range: highest.1 - lowest.1,
        })
    }
}

/// Group-wise count, mean, sample std, min, quartiles, p90 and max per metric
///
/// # Example
/// ```
/// use egrastats::analysis::{aggregate, GroupDimension};
/// use egrastats::dataset::Dataset;
///
/// let ds = Dataset::from_columns(vec![
///     ("school", vec!["A".into(), "A".into(), "B".into()]),
///     ("clpm", vec![10.0.into(), 20.0.into(), 40.0.into()]),
/// ])
/// .unwrap();
///
/// let agg = aggregate(&ds, &GroupDimension::School, &["clpm".to_string()]).unwrap();
/// assert_eq!(agg.get("A", "clpm").unwrap().mean(), Some(15.0));
/// ```
pub fn aggregate(
    dataset: &Dataset,
    dimension: &GroupDimension,
    metrics: &[String],
) -> AnalysisResult<Aggregation> {
    let labels = group_labels(dataset, dimension)?;
    Ok(aggregate_labels(
        dataset,
        dimension.column_name(),
        &labels,
        metrics,
    ))
}

pub(crate) fn aggregate_labels(
    dataset: &Dataset,
    group_column: &str,
    labels: &[Option<String>],
    metrics: &[String],
) -> Aggregation {
    let excluded_rows = excluded_count(labels);
    if excluded_rows > 0 {
        tracing::info!(
            "{} rows excluded from grouping: missing {}",
            excluded_rows,
            group_column
        );
    }

    let mut groups: BTreeMap<String, BTreeMap<String, GroupStatistics>> = labels
        .iter()
        .flatten()
        .map(|g| (g.clone(), BTreeMap::new()))
        .collect();
    let mut used = Vec::new();
    let mut warnings = Vec::new();

    for metric in metrics {
        let values = match dataset.numeric_column(metric) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Skipping metric {}: {}", metric, e);
                warnings.push(e);
                continue;
            }
        };

        for (group, group_values) in partition(labels, &values) {
            let stats = GroupStatistics {
                group: group.clone(),
                metric: metric.clone(),
                summary: Summary::from_values(&group_values),
            };
            groups.entry(group).or_default().insert(metric.clone(), stats);
        }
        used.push(metric.clone());
    }

    Aggregation {
        group_column: group_column.to_string(),
        metrics: used,
        groups,
        excluded_rows,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            (
                "school",
                vec![
                    "A".into(),
                    "A".into(),
                    "A".into(),
                    "B".into(),
                    "B".into(),
                    "B".into(),
                    Value::Missing,
                ],
            ),
            (
                "clpm",
                vec![
                    10.0.into(),
                    20.0.into(),
                    30.0.into(),
                    40.0.into(),
                    50.0.into(),
                    60.0.into(),
                    99.0.into(),
                ],
            ),
            (
                "orf",
                vec![
                    Value::Missing,
                    Value::Missing,
                    Value::Missing,
                    1.0.into(),
                    2.0.into(),
                    Value::Missing,
                    3.0.into(),
                ],
            ),
            (
                "enumerator",
                vec!["x".into(); 7],
            ),
        ])
        .unwrap()
    }

    fn metrics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_means() {
        let agg = aggregate(&dataset(), &GroupDimension::School, &metrics(&["clpm"])).unwrap();

        assert_eq!(agg.get("A", "clpm").unwrap().mean(), Some(20.0));
        assert_eq!(agg.get("B", "clpm").unwrap().mean(), Some(50.0));
        assert_eq!(agg.get("A", "clpm").unwrap().summary.std, Some(10.0));
        assert_eq!(agg.get("B", "clpm").unwrap().summary.p25, Some(45.0));
    }

    #[test]
    fn test_missing_group_rows_excluded() {
        let agg = aggregate(&dataset(), &GroupDimension::School, &metrics(&["clpm"])).unwrap();

        assert_eq!(agg.excluded_rows, 1);
        assert_eq!(agg.groups.len(), 2);
        // 99.0 belongs to the unlabelled row
        assert_eq!(agg.get("B", "clpm").unwrap().summary.max, Some(60.0));
    }

    #[test]
    fn test_empty_group_is_undefined_not_zero() {
        let agg = aggregate(&dataset(), &GroupDimension::School, &metrics(&["orf"])).unwrap();

        let a = agg.get("A", "orf").unwrap();
        assert_eq!(a.count(), 0);
        assert_eq!(a.mean(), None);
        assert_eq!(a.summary.std, None);
        assert_eq!(a.summary.min, None);
        assert!(!a.is_defined());
    }

    #[test]
    fn test_non_numeric_and_missing_metrics_warn() {
        let agg = aggregate(
            &dataset(),
            &GroupDimension::School,
            &metrics(&["clpm", "enumerator", "cwpm"]),
        )
        .unwrap();

        assert_eq!(agg.metrics, vec!["clpm"]);
        assert_eq!(agg.warnings.len(), 2);
        assert!(agg.warnings.contains(&AnalysisError::NonNumericColumn {
            column: "enumerator".to_string()
        }));
        assert!(agg
            .warnings
            .contains(&AnalysisError::missing_column("cwpm")));
    }

    #[test]
    fn test_missing_group_column_fails() {
        let result = aggregate(&dataset(), &GroupDimension::Gender, &metrics(&["clpm"]));
        assert!(matches!(result, Err(AnalysisError::MissingColumn { .. })));
    }

    #[test]
    fn test_ranking() {
        let agg = aggregate(&dataset(), &GroupDimension::School, &metrics(&["clpm", "orf"])).unwrap();

        let ranking = agg.ranking("clpm").unwrap();
        assert_eq!(ranking.highest_group, "B");
        assert_eq!(ranking.lowest_group, "A");
        assert_eq!(ranking.range, 30.0);

        // only B has orf scores
        let orf = agg.ranking("orf").unwrap();
        assert_eq!(orf.highest_group, "B");
        assert_eq!(orf.lowest_group, "B");
        assert_eq!(orf.range, 0.0);

        assert!(agg.ranking("cwpm").is_none());
    }
}
