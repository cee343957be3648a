// Pairwise correlation and simple linear regression between metrics
//
// Each unordered pair is computed on the rows where both metrics are present
// (pairwise deletion). Pairs with fewer than 3 such rows are emitted with
// every statistic undefined and an InsufficientData marker.

use crate::dataset::Dataset;
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats::{average_ranks, has_spread, pearson};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;
use std::cmp::Ordering;

/// Minimum paired observations for a correlation
pub const MIN_PAIRED_OBSERVATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    VeryWeak,
}

impl CorrelationStrength {
    pub fn from_r(r: f64) -> Self {
        let r = r.abs();
        if r >= 0.7 {
            CorrelationStrength::VeryStrong
        } else if r >= 0.5 {
            CorrelationStrength::Strong
        } else if r >= 0.3 {
            CorrelationStrength::Moderate
        } else if r >= 0.1 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::VeryWeak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationStrength::VeryStrong => "very strong",
            CorrelationStrength::Strong => "strong",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Weak => "weak",
            CorrelationStrength::VeryWeak => "very weak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn from_r(r: f64) -> Self {
        if r < 0.0 {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
        }
    }
}

/// `***` below 0.001, `**` below 0.01, `*` below 0.05, empty otherwise
pub fn significance_stars(p_value: f64) -> &'static str {
    if p_value < 0.001 {
        "***"
    } else if p_value < 0.01 {
        "**"
    } else if p_value < 0.05 {
        "*"
    } else {
        ""
    }
}

/// Correlation and regression between two metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub metric_a: String,
    pub metric_b: String,
    /// Rows where both metrics are present
    pub observations: usize,
    pub pearson_r: Option<f64>,
    pub pearson_p: Option<f64>,
    pub spearman_rho: Option<f64>,
    pub spearman_p: Option<f64>,
    /// OLS of `metric_b` on `metric_a`
    pub regression_slope: Option<f64>,
    pub regression_intercept: Option<f64>,
    pub r_squared: Option<f64>,
    pub strength: Option<CorrelationStrength>,
    pub direction: Option<Direction>,
    pub significance: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
}

impl CorrelationPair {
    fn undefined(metric_a: &str, metric_b: &str, observations: usize) -> Self {
        Self {
            metric_a: metric_a.to_string(),
            metric_b: metric_b.to_string(),
            observations,
            pearson_r: None,
            pearson_p: None,
            spearman_rho: None,
            spearman_p: None,
            regression_slope: None,
            regression_intercept: None,
            r_squared: None,
            strength: None,
            direction: None,
            significance: None,
            error: None,
        }
    }

    /// Statistics for one pair of aligned, fully observed samples
    pub fn compute(metric_a: &str, metric_b: &str, x: &[f64], y: &[f64]) -> Self {
        let n = x.len().min(y.len());
        let mut pair = Self::undefined(metric_a, metric_b, n);

        if n < MIN_PAIRED_OBSERVATIONS {
            pair.error = Some(AnalysisError::insufficient_data(
                format!("correlation {}/{}", metric_a, metric_b),
                MIN_PAIRED_OBSERVATIONS,
                n,
            ));
            return pair;
        }
        let (x, y) = (&x[..n], &y[..n]);

        pair.pearson_r = pearson(x, y);
        pair.pearson_p = pair.pearson_r.map(|r| correlation_p_value(r, n));
        pair.spearman_rho = pearson(&average_ranks(x), &average_ranks(y));
        pair.spearman_p = pair.spearman_rho.map(|rho| correlation_p_value(rho, n));

        if let Some((slope, intercept)) = linear_regression(x, y) {
            pair.regression_slope = Some(slope);
            pair.regression_intercept = Some(intercept);
        }

        if let Some(r) = pair.pearson_r {
            pair.r_squared = Some(r * r);
            pair.strength = Some(CorrelationStrength::from_r(r));
            pair.direction = Some(Direction::from_r(r));
            pair.significance = pair.pearson_p.map(significance_stars);
        }

        pair
    }

    pub fn is_defined(&self) -> bool {
        self.pearson_r.is_some()
    }
}

/// Every pair among the numeric requested metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub metrics: Vec<String>,
    pub pairs: Vec<CorrelationPair>,
    pub warnings: Vec<AnalysisError>,
}

impl CorrelationMatrix {
    /// Pair for two metrics in either order
    pub fn get(&self, a: &str, b: &str) -> Option<&CorrelationPair> {
        self.pairs.iter().find(|p| {
            (p.metric_a == a && p.metric_b == b) || (p.metric_a == b && p.metric_b == a)
        })
    }

    pub fn strong_pairs(&self, threshold: f64) -> Vec<CorrelationPair> {
        strong_pairs(&self.pairs, threshold)
    }
}

/// Correlate every unordered pair (i < j) of `metrics`
///
/// Repeated codes are collapsed so a metric is never paired with itself.
pub fn correlate(dataset: &Dataset, metrics: &[String]) -> CorrelationMatrix {
    let mut columns: Vec<(&str, Vec<Option<f64>>)> = Vec::new();
    let mut warnings = Vec::new();

    for metric in metrics {
        if columns.iter().any(|(m, _)| *m == metric.as_str()) {
            continue;
        }
        match dataset.numeric_column(metric) {
            Ok(values) => columns.push((metric.as_str(), values)),
            Err(e) => {
                tracing::warn!("Excluding {} from correlation: {}", metric, e);
                warnings.push(e);
            }
        }
    }

    let mut pairs = Vec::new();
    for (i, (a, xs)) in columns.iter().enumerate() {
        for (b, ys) in &columns[i + 1..] {
            let (x, y): (Vec<f64>, Vec<f64>) = xs
                .iter()
                .zip(ys)
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .unzip();

            let pair = CorrelationPair::compute(a, b, &x, &y);
            if let Some(e) = &pair.error {
                tracing::info!("{}", e);
            }
            pairs.push(pair);
        }
    }

    CorrelationMatrix {
        metrics: columns.iter().map(|(m, _)| m.to_string()).collect(),
        pairs,
        warnings,
    }
}

/// Pairs with |r| >= `threshold`, strongest first, ties in metric-code order
pub fn strong_pairs(pairs: &[CorrelationPair], threshold: f64) -> Vec<CorrelationPair> {
    let mut strong: Vec<CorrelationPair> = pairs
        .iter()
        .filter(|p| p.pearson_r.is_some_and(|r| r.abs() >= threshold))
        .cloned()
        .collect();

    strong.sort_by(|p, q| {
        let rp = p.pearson_r.map_or(0.0, f64::abs);
        let rq = q.pearson_r.map_or(0.0, f64::abs);
        rq.partial_cmp(&rp)
            .unwrap_or(Ordering::Equal)
            .then_with(|| unordered_key(p).cmp(&unordered_key(q)))
    });
    strong
}

/// Pair names in lexical order, so (a, b) and (b, a) sort alike
fn unordered_key(pair: &CorrelationPair) -> (&str, &str) {
    let (a, b) = (pair.metric_a.as_str(), pair.metric_b.as_str());
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Slope and intercept of y on x; `None` when x has no variance
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 || !has_spread(x) {
        return None;
    }
    let slope = x.iter().covariance(y.iter()) / x.iter().variance();
    let intercept = y.iter().mean() - slope * x.iter().mean();
    (slope.is_finite() && intercept.is_finite()).then_some((slope, intercept))
}

/// Two-sided p-value for a correlation coefficient on n observations
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < MIN_PAIRED_OBSERVATIONS {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    StudentsT::new(0.0, 1.0, df)
        .map(|dist| (2.0 * dist.sf(t.abs())).min(1.0))
        .unwrap_or(1.0)
}

/// Pearson correlation for two columns; convenience for single pairs
pub fn correlate_pair(dataset: &Dataset, a: &str, b: &str) -> AnalysisResult<CorrelationPair> {
    let xs = dataset.numeric_column(a)?;
    let ys = dataset.numeric_column(b)?;
    let (x, y): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(&ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    Ok(CorrelationPair::compute(a, b, &x, &y))
}
