// Row -> group label assignment for each grouping dimension
//
// Rows whose group value is missing (or, for gender, unrecognised) get no
// label and are excluded from every group. They are never bucketed as
// "unknown".

use super::config::GroupDimension;
use crate::dataset::{Dataset, Value};
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats;
use std::collections::BTreeMap;

pub const BOY: &str = "Boy";
pub const GIRL: &str = "Girl";

pub const TERCILE_LOW: &str = "Low";
pub const TERCILE_MEDIUM: &str = "Medium";
pub const TERCILE_HIGH: &str = "High";

/// Minimum numeric values needed to cut terciles
pub const MIN_TERCILE_VALUES: usize = 3;

/// Group label per row, `None` for excluded rows
pub fn group_labels(
    dataset: &Dataset,
    dimension: &GroupDimension,
) -> AnalysisResult<Vec<Option<String>>> {
    let cells = dataset.column(dimension.column_name())?;

    let labels = match dimension {
        GroupDimension::Gender => cells
            .iter()
            .map(|v| normalize_gender(v).map(str::to_string))
            .collect(),
        GroupDimension::Ses | GroupDimension::HomeSupport | GroupDimension::Terciles(_) => {
            terciles(&cells, dimension.column_name())?
        }
        GroupDimension::School | GroupDimension::Language | GroupDimension::Column(_) => {
            cells.iter().map(|v| v.label()).collect()
        }
    };

    Ok(labels)
}

/// Map gender codes (1/0, boy/girl, male/female, m/f) to Boy/Girl
pub fn normalize_gender(value: &Value) -> Option<&'static str> {
    match value {
        Value::Number(n) if *n == 1.0 => Some(BOY),
        Value::Number(n) if *n == 0.0 => Some(GIRL),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "boy" | "male" | "m" | "1" => Some(BOY),
            "girl" | "female" | "f" | "0" => Some(GIRL),
            _ => None,
        },
        _ => None,
    }
}

/// Low/Medium/High split at the 0.33 and 0.67 quantiles of `column`
///
/// Values at a cut point fall into the lower tercile. Text cells and gaps get
/// no label.
pub fn terciles(cells: &[&Value], column: &str) -> AnalysisResult<Vec<Option<String>>> {
    let values: Vec<f64> = cells.iter().filter_map(|v| v.as_f64()).collect();
    let insufficient = || {
        AnalysisError::insufficient_data(
            format!("{} terciles", column),
            MIN_TERCILE_VALUES,
            values.len(),
        )
    };
    if values.len() < MIN_TERCILE_VALUES {
        return Err(insufficient());
    }

    let sorted = stats::sorted(&values);
    let (Some(q33), Some(q67)) = (
        stats::percentile(&sorted, 33.0),
        stats::percentile(&sorted, 67.0),
    ) else {
        return Err(insufficient());
    };

    Ok(cells
        .iter()
        .map(|v| {
            v.as_f64().map(|x| {
                let label = if x <= q33 {
                    TERCILE_LOW
                } else if x <= q67 {
                    TERCILE_MEDIUM
                } else {
                    TERCILE_HIGH
                };
                label.to_string()
            })
        })
        .collect())
}

/// Number of rows without a group label
pub fn excluded_count(labels: &[Option<String>]) -> usize {
    labels.iter().filter(|l| l.is_none()).count()
}

/// Non-missing metric values per group; every labelled group appears, even if empty
pub fn partition(labels: &[Option<String>], values: &[Option<f64>]) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (label, value) in labels.iter().zip(values) {
        let Some(label) = label else {
            continue;
        };
        let entry = groups.entry(label.clone()).or_default();
        if let Some(v) = value {
            entry.push(*v);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_gender() {
        assert_eq!(normalize_gender(&Value::Number(1.0)), Some(BOY));
        assert_eq!(normalize_gender(&Value::Number(0.0)), Some(GIRL));
        assert_eq!(normalize_gender(&"Female".into()), Some(GIRL));
        assert_eq!(normalize_gender(&"m".into()), Some(BOY));
        assert_eq!(normalize_gender(&"other".into()), None);
        assert_eq!(normalize_gender(&Value::Number(2.0)), None);
        assert_eq!(normalize_gender(&Value::Missing), None);
    }

    #[test]
    fn test_school_labels_exclude_missing() {
        let ds = Dataset::from_columns(vec![(
            "school",
            vec!["A".into(), Value::Missing, "B".into()],
        )])
        .unwrap();

        let labels = group_labels(&ds, &GroupDimension::School).unwrap();
        assert_eq!(
            labels,
            vec![Some("A".to_string()), None, Some("B".to_string())]
        );
        assert_eq!(excluded_count(&labels), 1);
    }

    #[test]
    fn test_missing_group_column() {
        let ds = Dataset::from_columns(vec![("clpm", vec![1.0.into()])]).unwrap();
        let err = group_labels(&ds, &GroupDimension::Language).unwrap_err();
        assert_eq!(err, AnalysisError::missing_column("language_teaching"));
    }

    #[test]
    fn test_ses_terciles() {
        let ses: Vec<Value> = (1..=9).map(|i| Value::from(i as f64)).collect();
        let ds = Dataset::from_columns(vec![("ses", ses)]).unwrap();

        let labels = group_labels(&ds, &GroupDimension::Ses).unwrap();
        let low = labels.iter().filter(|l| l.as_deref() == Some(TERCILE_LOW)).count();
        let high = labels.iter().filter(|l| l.as_deref() == Some(TERCILE_HIGH)).count();
        assert_eq!(low, 3);
        assert_eq!(high, 3);
        assert_eq!(labels[0].as_deref(), Some(TERCILE_LOW));
        assert_eq!(labels[8].as_deref(), Some(TERCILE_HIGH));
    }

    #[test]
    fn test_ses_needs_three_values() {
        let ds = Dataset::from_columns(vec![("ses", vec![1.0.into(), Value::Missing])]).unwrap();
        assert!(matches!(
            group_labels(&ds, &GroupDimension::Ses),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_home_support_and_any_column_terciles() {
        let ds = Dataset::from_columns(vec![
            (
                "home_support",
                vec![
                    0.5.into(),
                    1.5.into(),
                    2.5.into(),
                    Value::Missing,
                    "n/a".into(),
                    3.5.into(),
                ],
            ),
            ("age", vec![6.0.into(), 7.0.into(), 8.0.into(), 9.0.into(), 10.0.into(), 11.0.into()]),
        ])
        .unwrap();

        // q33 = 1.49, q67 = 2.51 over [0.5, 1.5, 2.5, 3.5]
        let labels = group_labels(&ds, &GroupDimension::HomeSupport).unwrap();
        assert_eq!(labels[0].as_deref(), Some(TERCILE_LOW));
        assert_eq!(labels[1].as_deref(), Some(TERCILE_MEDIUM));
        assert_eq!(labels[2].as_deref(), Some(TERCILE_MEDIUM));
        assert_eq!(labels[3], None);
        assert_eq!(labels[4], None);
        assert_eq!(labels[5].as_deref(), Some(TERCILE_HIGH));

        let labels = group_labels(&ds, &GroupDimension::Terciles("age".to_string())).unwrap();
        assert_eq!(
            labels.iter().filter(|l| l.as_deref() == Some(TERCILE_LOW)).count(),
            2
        );
        assert_eq!(excluded_count(&labels), 0);
    }

    #[test]
    fn test_tercile_error_names_the_column() {
        let ds = Dataset::from_columns(vec![("home_support", vec![1.0.into(), 2.0.into()])]).unwrap();
        assert_eq!(
            group_labels(&ds, &GroupDimension::HomeSupport).unwrap_err(),
            AnalysisError::insufficient_data("home_support terciles", 3, 2)
        );
    }

    #[test]
    fn test_partition_keeps_empty_groups() {
        let labels = vec![
            Some("A".to_string()),
            Some("B".to_string()),
            None,
            Some("A".to_string()),
        ];
        let values = vec![Some(1.0), None, Some(5.0), Some(3.0)];

        let groups = partition(&labels, &values);
        assert_eq!(groups["A"], vec![1.0, 3.0]);
        assert!(groups["B"].is_empty());
        assert_eq!(groups.len(), 2);
    }
}
