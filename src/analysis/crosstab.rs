// Mean of each metric over the cells of two grouping dimensions
//
// A row enters a cell only when it is labelled on both dimensions. Each side
// needs at least two levels among those rows.

use super::config::GroupDimension;
use super::grouping::{group_labels, TERCILE_HIGH, TERCILE_LOW, TERCILE_MEDIUM};
use crate::dataset::Dataset;
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats::mean;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Students and mean score in one row/column cell
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossCell {
    pub count: usize,
    /// `None` for an empty cell
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTabulation {
    pub row_dimension: GroupDimension,
    pub column_dimension: GroupDimension,
    /// Row levels in display order (Low/Medium/High for terciles)
    pub row_levels: Vec<String>,
    pub column_levels: Vec<String>,
    /// Rows labelled on both dimensions
    pub labelled_rows: usize,
    /// metric -> row level -> column level -> cell
    pub cells: BTreeMap<String, BTreeMap<String, BTreeMap<String, CrossCell>>>,
    /// Skipped metric columns
    pub warnings: Vec<AnalysisError>,
}

impl CrossTabulation {
    pub fn cell(&self, metric: &str, row: &str, column: &str) -> Option<&CrossCell> {
        self.cells.get(metric)?.get(row)?.get(column)
    }
}

/// Cross `rows` with `columns` and average every metric per cell
///
/// # Example
/// ```
/// use egrastats::analysis::{cross_tabulate, GroupDimension};
/// use egrastats::dataset::Dataset;
///
/// let ds = Dataset::from_csv_str(
///     "school,stgender,clpm\nA,1,10\nA,0,20\nB,1,30\nB,0,50\n",
/// )
/// .unwrap();
///
/// let table = cross_tabulate(
///     &ds,
///     &GroupDimension::School,
///     &GroupDimension::Gender,
///     &["clpm".to_string()],
/// )
/// .unwrap();
/// assert_eq!(table.cell("clpm", "B", "Girl").unwrap().mean, Some(50.0));
/// ```
pub fn cross_tabulate(
    dataset: &Dataset,
    rows: &GroupDimension,
    columns: &GroupDimension,
    metrics: &[String],
) -> AnalysisResult<CrossTabulation> {
    let row_labels = group_labels(dataset, rows)?;
    let column_labels = group_labels(dataset, columns)?;

    let pairs: Vec<Option<(&str, &str)>> = row_labels
        .iter()
        .zip(&column_labels)
        .map(|(r, c)| Some((r.as_deref()?, c.as_deref()?)))
        .collect();

    let row_levels = ordered_levels(pairs.iter().flatten().map(|(r, _)| *r), rows);
    let column_levels = ordered_levels(pairs.iter().flatten().map(|(_, c)| *c), columns);
    for (dimension, levels) in [(rows, &row_levels), (columns, &column_levels)] {
        if levels.len() < 2 {
            return Err(AnalysisError::InsufficientGroups {
                metric: format!("cross-tabulation by {}", dimension),
                found: levels.len(),
            });
        }
    }

    let mut cells = BTreeMap::new();
    let mut warnings = Vec::new();
    for metric in metrics {
        let values = match dataset.numeric_column(metric) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Excluding {} from cross-tabulation: {}", metric, e);
                warnings.push(e);
                continue;
            }
        };

        let mut buckets: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
        for (pair, value) in pairs.iter().zip(&values) {
            if let (Some(pair), Some(v)) = (pair, value) {
                buckets.entry(*pair).or_default().push(*v);
            }
        }

        let mut table: BTreeMap<String, BTreeMap<String, CrossCell>> = BTreeMap::new();
        for row in &row_levels {
            let line = table.entry(row.clone()).or_default();
            for column in &column_levels {
                let cell = buckets
                    .get(&(row.as_str(), column.as_str()))
                    .map(|scores| CrossCell {
                        count: scores.len(),
                        mean: mean(scores),
                    })
                    .unwrap_or_default();
                line.insert(column.clone(), cell);
            }
        }
        cells.insert(metric.clone(), table);
    }

    Ok(CrossTabulation {
        row_dimension: rows.clone(),
        column_dimension: columns.clone(),
        row_levels,
        column_levels,
        labelled_rows: pairs.iter().flatten().count(),
        cells,
        warnings,
    })
}

/// Distinct labels; tercile levels run Low, Medium, High, others sort lexically
fn ordered_levels<'a>(
    labels: impl Iterator<Item = &'a str>,
    dimension: &GroupDimension,
) -> Vec<String> {
    let distinct: BTreeSet<&str> = labels.collect();
    if dimension.is_tercile() {
        return [TERCILE_LOW, TERCILE_MEDIUM, TERCILE_HIGH]
            .into_iter()
            .filter(|level| distinct.contains(level))
            .map(str::to_string)
            .collect();
    }
    distinct.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            (
                "ses",
                vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into(), 5.0.into(), 6.0.into()],
            ),
            (
                "home_support",
                vec![6.0.into(), 5.0.into(), 4.0.into(), 3.0.into(), 2.0.into(), Value::Missing],
            ),
            (
                "orf",
                vec![10.0.into(), 20.0.into(), 30.0.into(), 40.0.into(), 50.0.into(), 60.0.into()],
            ),
            ("school", vec!["A".into(); 6]),
        ])
        .unwrap()
    }

    #[test]
    fn test_ses_by_home_support() {
        let table = cross_tabulate(
            &dataset(),
            &GroupDimension::Ses,
            &GroupDimension::HomeSupport,
            &["orf".to_string()],
        )
        .unwrap();

        // ses over 1..=6: q33 = 2.65, q67 = 4.35
        // home_support over [2, 3, 4, 5, 6]: q33 = 3.32, q67 = 4.68
        assert_eq!(table.row_levels, vec!["Low", "Medium", "High"]);
        assert_eq!(table.column_levels, vec!["Low", "Medium", "High"]);
        assert_eq!(table.labelled_rows, 5);

        let low_high = table.cell("orf", "Low", "High").unwrap();
        assert_eq!(low_high.count, 2);
        assert_eq!(low_high.mean, Some(15.0));

        let high_low = table.cell("orf", "High", "Low").unwrap();
        assert_eq!(high_low.count, 1);
        assert_eq!(high_low.mean, Some(50.0));

        let empty = table.cell("orf", "Low", "Low").unwrap();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
    }

    #[test]
    fn test_single_level_side_is_insufficient() {
        let err = cross_tabulate(
            &dataset(),
            &GroupDimension::Ses,
            &GroupDimension::School,
            &["orf".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientGroups { found: 1, .. }));
    }

    #[test]
    fn test_missing_dimension_column() {
        let err = cross_tabulate(
            &dataset(),
            &GroupDimension::Ses,
            &GroupDimension::Gender,
            &["orf".to_string()],
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::missing_column("stgender"));
    }

    #[test]
    fn test_non_numeric_metric_is_warned() {
        let table = cross_tabulate(
            &dataset(),
            &GroupDimension::Ses,
            &GroupDimension::HomeSupport,
            &["school".to_string(), "orf".to_string()],
        )
        .unwrap();
        assert_eq!(table.warnings, vec![AnalysisError::NonNumericColumn {
            column: "school".to_string()
        }]);
        assert!(table.cells.contains_key("orf"));
        assert!(!table.cells.contains_key("school"));
    }
}
