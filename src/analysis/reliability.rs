// Cronbach's alpha for internal consistency
//
// Listwise deletion: only rows observed on every selected item take part.
// Repeated item names count once. Alpha is undefined when the row totals
// do not vary.

use crate::dataset::Dataset;
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats::{has_spread, sample_variance};
use serde::Serialize;

pub const MIN_ITEMS: usize = 2;
pub const MIN_COMPLETE_ROWS: usize = 2;

/// Ordinal reliability scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityLevel {
    Unacceptable,
    Poor,
    Questionable,
    Acceptable,
    Good,
    Excellent,
}

impl ReliabilityLevel {
    /// Negative alpha lands in `Unacceptable`
    pub fn from_alpha(alpha: f64) -> Self {
        if alpha < 0.5 {
            ReliabilityLevel::Unacceptable
        } else if alpha < 0.6 {
            ReliabilityLevel::Poor
        } else if alpha < 0.7 {
            ReliabilityLevel::Questionable
        } else if alpha < 0.8 {
            ReliabilityLevel::Acceptable
        } else if alpha < 0.9 {
            ReliabilityLevel::Good
        } else {
            ReliabilityLevel::Excellent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReliabilityLevel::Unacceptable => "unacceptable",
            ReliabilityLevel::Poor => "poor",
            ReliabilityLevel::Questionable => "questionable",
            ReliabilityLevel::Acceptable => "acceptable",
            ReliabilityLevel::Good => "good",
            ReliabilityLevel::Excellent => "excellent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityResult {
    pub items: Vec<String>,
    pub item_count: usize,
    /// Complete-case rows used
    pub sample_size: usize,
    /// `None` when the total score has no variance
    pub alpha: Option<f64>,
    pub reliability_level: Option<ReliabilityLevel>,
}

/// Cronbach's alpha over `items`
///
/// alpha = k / (k - 1) * (1 - sum(item variances) / variance(row totals)),
/// sample variances throughout.
///
/// # Example
/// ```
/// use egrastats::analysis::{cronbach_alpha, ReliabilityLevel};
/// use egrastats::dataset::Dataset;
///
/// let ds = Dataset::from_columns(vec![
///     ("clpm", vec![1.0.into(), 2.0.into(), 3.0.into()]),
///     ("orf", vec![1.0.into(), 2.0.into(), 3.0.into()]),
/// ])
/// .unwrap();
///
/// let result = cronbach_alpha(&ds, &["clpm".to_string(), "orf".to_string()]).unwrap();
/// assert!((result.alpha.unwrap() - 1.0).abs() < 1e-9);
/// assert_eq!(result.reliability_level, Some(ReliabilityLevel::Excellent));
/// ```
pub fn cronbach_alpha(dataset: &Dataset, items: &[String]) -> AnalysisResult<ReliabilityResult> {
    let mut unique: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(item) {
            unique.push(item.clone());
        }
    }
    let items = unique.as_slice();

    if items.len() < MIN_ITEMS {
        return Err(AnalysisError::insufficient_data(
            "reliability items",
            MIN_ITEMS,
            items.len(),
        ));
    }

    let columns = items
        .iter()
        .map(|item| dataset.numeric_column(item))
        .collect::<AnalysisResult<Vec<_>>>()?;

    // rows observed on every item
    let complete: Vec<Vec<f64>> = (0..dataset.len())
        .filter_map(|row| columns.iter().map(|col| col[row]).collect())
        .collect();

    if complete.len() < MIN_COMPLETE_ROWS {
        return Err(AnalysisError::insufficient_data(
            "reliability complete rows",
            MIN_COMPLETE_ROWS,
            complete.len(),
        ));
    }

    let k = items.len();
    let item_variance_sum: f64 = (0..k)
        .filter_map(|j| {
            let item: Vec<f64> = complete.iter().map(|row| row[j]).collect();
            sample_variance(&item)
        })
        .sum();
    let totals: Vec<f64> = complete.iter().map(|row| row.iter().sum()).collect();
    let total_variance = sample_variance(&totals).unwrap_or(0.0);

    let alpha = if has_spread(&totals) && total_variance > 0.0 {
        let kf = k as f64;
        Some(kf / (kf - 1.0) * (1.0 - item_variance_sum / total_variance))
    } else {
        tracing::info!("reliability undefined: total score has zero variance");
        None
    };

    Ok(ReliabilityResult {
        items: items.to_vec(),
        item_count: k,
        sample_size: complete.len(),
        alpha,
        reliability_level: alpha.map(ReliabilityLevel::from_alpha),
    })
}
