//! Descriptive statistics primitives
//!
//! Everything here works on `f64` slices that have already had missing values
//! removed. Functions return `None` where a statistic is undefined so callers
//! never mistake "no data" for a real zero.
//!
//! Moments and ranks come from `statrs::statistics`. Percentiles stay on
//! linear interpolation between closest ranks (R-7), which `statrs`
//! `OrderStatistics::quantile` does not use.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, RankTieBreaker, Statistics};

/// Summary statistics for one sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (ddof = 1)
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let sorted = sorted(values);

        Self {
            count: values.len(),
            mean: mean(values),
            std: sample_std(values),
            min: sorted.first().copied(),
            p25: percentile(&sorted, 25.0),
            p50: percentile(&sorted, 50.0),
            p75: percentile(&sorted, 75.0),
            p90: percentile(&sorted, 90.0),
            max: sorted.last().copied(),
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Sample variance with Bessel's correction; undefined below two values
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    if !has_spread(values) {
        return Some(0.0);
    }
    Some(values.iter().variance())
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// True when at least two values differ
///
/// Compares the raw extremes, so a constant column such as `[0.1; 7]` has no
/// spread even though its floating-point sum of squares is not exactly zero.
pub fn has_spread(values: &[f64]) -> bool {
    Statistics::min(values.iter()) < Statistics::max(values.iter())
}

/// Ascending copy of the input
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Percentile (0-100) of sorted data, linear interpolation between closest ranks
pub fn percentile(sorted_data: &[f64], percentile: f64) -> Option<f64> {
    if sorted_data.is_empty() {
        return None;
    }
    if sorted_data.len() == 1 {
        return Some(sorted_data[0]);
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        Some(sorted_data[lower])
    } else {
        let weight = index - lower as f64;
        Some(sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight)
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Quantile (0-1) of unsorted data
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    percentile(&sorted(values), q * 100.0)
}

/// 1-based ranks, ties receive the average of the ranks they span
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    Data::new(values.to_vec()).ranks(RankTieBreaker::Average)
}

/// Sum of t^3 - t over groups of tied values
pub fn tie_term(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    let mut total = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        total += t * t * t - t;
        i = j + 1;
    }
    total
}

/// Pearson product-moment correlation; `None` when either side has no variance
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || !has_spread(x) || !has_spread(y) {
        return None;
    }
    let covariance = x.iter().covariance(y.iter());
    let r = covariance / (x.iter().std_dev() * y.iter().std_dev());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(mean(&v).unwrap(), 5.0));
        // sample variance = 32 / 7
        assert!(approx(sample_variance(&v).unwrap(), 32.0 / 7.0));
    }

    #[test]
    fn test_variance_needs_two_values() {
        assert_eq!(sample_variance(&[3.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 50.0), Some(2.5));
        assert_eq!(percentile(&sorted, 0.0), Some(1.0));
        assert_eq!(percentile(&sorted, 100.0), Some(4.0));
        assert!(approx(percentile(&sorted, 25.0).unwrap(), 1.75));
        assert!(approx(percentile(&sorted, 90.0).unwrap(), 3.7));
    }

    #[test]
    fn test_percentile_single_and_empty() {
        assert_eq!(percentile(&[42.0], 90.0), Some(42.0));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_summary_from_values() {
        let s = Summary::from_values(&[30.0, 10.0, 20.0]);
        assert_eq!(s.count, 3);
        assert_eq!(s.mean, Some(20.0));
        assert_eq!(s.std, Some(10.0));
        assert_eq!(s.min, Some(10.0));
        assert_eq!(s.p50, Some(20.0));
        assert_eq!(s.max, Some(30.0));
    }

    #[test]
    fn test_summary_empty_is_undefined() {
        let s = Summary::from_values(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, None);
        assert_eq!(s.min, None);
        assert_eq!(s.p90, None);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_tie_term() {
        assert_eq!(tie_term(&[1.0, 2.0, 3.0]), 0.0);
        // one pair (8 - 2 = 6) and one triple (27 - 3 = 24)
        assert_eq!(tie_term(&[1.0, 1.0, 2.0, 2.0, 2.0]), 30.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.345_6, 2), 12.35);
        assert_eq!(round_to(87.549, 1), 87.5);
        assert_eq!(round_to(-0.05, 1), -0.1);
    }

    #[test]
    fn test_quantile() {
        let q = quantile(&[5.0, 1.0, 3.0], 0.5).unwrap();
        assert_eq!(q, 3.0);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0));
        assert!(approx(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0));
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), None);
    }

    #[test]
    fn test_constant_fractional_column_has_no_spread() {
        let constant = [0.1; 7];
        assert!(!has_spread(&constant));
        assert_eq!(sample_variance(&constant), Some(0.0));
        assert_eq!(pearson(&constant, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0]), None);
        assert!(has_spread(&[0.1, 0.1, 0.2]));
        assert!(!has_spread(&[]));
    }
}
