// Rank-based significance tests across groups
//
// Two groups: Mann-Whitney U, two-sided. Exact null distribution when the
// smaller sample has at most 8 values and there are no ties, normal
// approximation with tie and continuity correction otherwise.
//
// Three or more groups: Kruskal-Wallis H with tie correction, p-value from
// the chi-squared distribution with k - 1 degrees of freedom.
//
// Degenerate inputs (every value identical) yield p = 1.0 instead of NaN.

use super::config::GroupDimension;
use super::grouping::{group_labels, partition};
use crate::dataset::Dataset;
use crate::error::{AnalysisError, AnalysisResult};
use crate::stats::{average_ranks, tie_term};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use std::collections::BTreeMap;

/// Largest smaller-sample size for which the exact U distribution is used
const EXACT_MAX_SIZE: usize = 8;

/// Which test produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    MannWhitneyU,
    KruskalWallisH,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::MannWhitneyU => "Mann-Whitney U",
            TestKind::KruskalWallisH => "Kruskal-Wallis H",
        }
    }
}

/// Magnitude label of a rank-biserial style effect size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    pub fn from_r(r: f64) -> Self {
        let r = r.abs();
        if r < 0.1 {
            EffectMagnitude::Negligible
        } else if r < 0.3 {
            EffectMagnitude::Small
        } else if r < 0.5 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        }
    }
}

/// `r = z / sqrt(N)` for a two-group comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectSize {
    pub r: f64,
    pub magnitude: EffectMagnitude,
}

impl EffectSize {
    pub fn new(r: f64) -> Self {
        Self {
            r,
            magnitude: EffectMagnitude::from_r(r),
        }
    }
}

/// Outcome of one group comparison
///
/// `significant` is derived from `p_value` and the significance level at
/// construction and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceResult {
    metric: String,
    test: TestKind,
    statistic: f64,
    p_value: f64,
    significant: bool,
    groups_compared: usize,
    significance_level: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    effect_size: Option<EffectSize>,
}

impl SignificanceResult {
    pub fn new(
        metric: impl Into<String>,
        test: TestKind,
        statistic: f64,
        p_value: f64,
        groups_compared: usize,
        significance_level: f64,
    ) -> Self {
        let p_value = if p_value.is_finite() {
            p_value.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            metric: metric.into(),
            test,
            statistic,
            p_value,
            significant: p_value < significance_level,
            groups_compared,
            significance_level,
            effect_size: None,
        }
    }

    pub fn with_effect_size(mut self, effect_size: Option<EffectSize>) -> Self {
        self.effect_size = effect_size;
        self
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn test(&self) -> TestKind {
        self.test
    }

    pub fn statistic(&self) -> f64 {
        self.statistic
    }

    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    pub fn significant(&self) -> bool {
        self.significant
    }

    pub fn groups_compared(&self) -> usize {
        self.groups_compared
    }

    pub fn significance_level(&self) -> f64 {
        self.significance_level
    }

    pub fn effect_size(&self) -> Option<EffectSize> {
        self.effect_size
    }
}

/// Compare the distribution of `metric` across the groups of `dimension`
pub fn test_groups(
    dataset: &Dataset,
    dimension: &GroupDimension,
    metric: &str,
    significance_level: f64,
) -> AnalysisResult<SignificanceResult> {
    let labels = group_labels(dataset, dimension)?;
    let values = dataset.numeric_column(metric)?;
    test_partition(metric, &partition(&labels, &values), significance_level)
}

/// Run the test appropriate for the number of non-empty groups
///
/// # Example
/// ```
/// use egrastats::analysis::{test_partition, TestKind};
/// use std::collections::BTreeMap;
///
/// let mut groups = BTreeMap::new();
/// groups.insert("A".to_string(), vec![10.0, 20.0, 30.0]);
/// groups.insert("B".to_string(), vec![40.0, 50.0, 60.0]);
///
/// let result = test_partition("clpm", &groups, 0.05).unwrap();
/// assert_eq!(result.test(), TestKind::MannWhitneyU);
/// assert!((result.p_value() - 0.1).abs() < 1e-9);
/// assert!(!result.significant());
/// ```
pub fn test_partition(
    metric: &str,
    groups: &BTreeMap<String, Vec<f64>>,
    significance_level: f64,
) -> AnalysisResult<SignificanceResult> {
    let samples: Vec<&[f64]> = groups
        .values()
        .filter(|v| !v.is_empty())
        .map(Vec::as_slice)
        .collect();

    match samples.len() {
        0 | 1 => Err(AnalysisError::InsufficientGroups {
            metric: metric.to_string(),
            found: samples.len(),
        }),
        2 => {
            let mw = mann_whitney_u(samples[0], samples[1]);
            tracing::debug!(
                "{}: U = {}, p = {} (exact = {})",
                metric,
                mw.u1,
                mw.p_value,
                mw.exact
            );
            Ok(SignificanceResult::new(
                metric,
                TestKind::MannWhitneyU,
                mw.u1,
                mw.p_value,
                2,
                significance_level,
            )
            .with_effect_size(mw.effect_size()))
        }
        k => {
            let kw = kruskal_wallis(&samples);
            tracing::debug!("{}: H = {}, p = {}", metric, kw.h, kw.p_value);
            Ok(SignificanceResult::new(
                metric,
                TestKind::KruskalWallisH,
                kw.h,
                kw.p_value,
                k,
                significance_level,
            ))
        }
    }
}

/// Raw Mann-Whitney U output
#[derive(Debug, Clone, PartialEq)]
pub struct MannWhitney {
    /// U statistic of the first sample
    pub u1: f64,
    pub p_value: f64,
    pub exact: bool,
    /// Normal approximation of U1, `None` when its variance is zero
    pub z: Option<f64>,
    pub n: usize,
}

impl MannWhitney {
    pub fn effect_size(&self) -> Option<EffectSize> {
        let z = self.z?;
        Some(EffectSize::new(z / (self.n as f64).sqrt()))
    }
}

/// Two-sided Mann-Whitney U test
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> MannWhitney {
    let n1 = x.len();
    let n2 = y.len();
    let n = n1 + n2;

    let combined: Vec<f64> = x.iter().chain(y).copied().collect();
    let ranks = average_ranks(&combined);
    let r1: f64 = ranks[..n1].iter().sum();

    let n1f = n1 as f64;
    let n2f = n2 as f64;
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;
    let u_max = u1.max(u2);

    let ties = tie_term(&combined);
    let mu = n1f * n2f / 2.0;
    let nf = n as f64;
    let variance = n1f * n2f / 12.0 * ((nf + 1.0) - ties / (nf * (nf - 1.0)));
    let s = variance.max(0.0).sqrt();
    let z = (s > 0.0).then(|| (u1 - mu) / s);

    let exact = ties == 0.0 && n1.min(n2) <= EXACT_MAX_SIZE;
    let p_value = if exact {
        2.0 * exact_upper_tail(n1, n2, u_max)
    } else if s > 0.0 {
        let zc = (u_max - mu - 0.5) / s;
        2.0 * standard_normal_sf(zc)
    } else {
        1.0
    };

    MannWhitney {
        u1,
        p_value: p_value.min(1.0),
        exact,
        z,
        n,
    }
}

/// P(U >= u) under the null hypothesis for sample sizes n1, n2
///
/// The number of arrangements giving each U is a coefficient of the Gaussian
/// binomial [n1 + n2 choose m]_q with m = min(n1, n2), built as the product of
/// (1 - q^(n - m + i)) / (1 - q^i) for i in 1..=m.
fn exact_upper_tail(n1: usize, n2: usize, u: f64) -> f64 {
    let m = n1.min(n2);
    let other = n1.max(n2);
    let max_u = m * other;

    let mut coeffs: Vec<i128> = vec![0; max_u + 1];
    coeffs[0] = 1;
    for i in 1..=m {
        let shift = other + i;
        for k in (shift..=max_u).rev() {
            coeffs[k] -= coeffs[k - shift];
        }
        for k in i..=max_u {
            coeffs[k] += coeffs[k - i];
        }
    }

    let total: f64 = coeffs.iter().map(|&c| c as f64).sum();
    let start = u.ceil().max(0.0) as usize;
    if start > max_u {
        return 0.0;
    }
    let upper: f64 = coeffs[start..].iter().map(|&c| c as f64).sum();
    upper / total
}

/// Raw Kruskal-Wallis output
#[derive(Debug, Clone, PartialEq)]
pub struct KruskalWallis {
    pub h: f64,
    pub p_value: f64,
    pub df: usize,
}

/// Kruskal-Wallis H test over non-empty samples
pub fn kruskal_wallis(samples: &[&[f64]]) -> KruskalWallis {
    let combined: Vec<f64> = samples.iter().flat_map(|s| s.iter().copied()).collect();
    let n = combined.len() as f64;
    let ranks = average_ranks(&combined);
    let df = samples.len().saturating_sub(1);

    let mut offset = 0;
    let mut sum_sq = 0.0;
    for sample in samples {
        let rank_sum: f64 = ranks[offset..offset + sample.len()].iter().sum();
        sum_sq += rank_sum * rank_sum / sample.len() as f64;
        offset += sample.len();
    }
    let h = 12.0 / (n * (n + 1.0)) * sum_sq - 3.0 * (n + 1.0);

    let correction = 1.0 - tie_term(&combined) / (n * n * n - n);
    if correction <= 0.0 || df == 0 {
        return KruskalWallis {
            h: h.max(0.0),
            p_value: 1.0,
            df,
        };
    }

    let h = (h / correction).max(0.0);
    let p_value = ChiSquared::new(df as f64)
        .map(|chi| chi.sf(h))
        .unwrap_or(1.0);

    KruskalWallis { h, p_value, df }
}

fn standard_normal_sf(z: f64) -> f64 {
    Normal::new(0.0, 1.0).map(|d| d.sf(z)).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(data: &[(&str, &[f64])]) -> BTreeMap<String, Vec<f64>> {
        data.iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_exact_complete_separation_three_by_three() {
        let mw = mann_whitney_u(&[10.0, 20.0, 30.0], &[40.0, 50.0, 60.0]);
        assert!(mw.exact);
        assert_eq!(mw.u1, 0.0);
        // 2 * (1 / C(6,3))
        assert!((mw.p_value - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_exact_tail_distribution() {
        // n1 = n2 = 2: U in {0,1,2,2,3,4} over C(4,2) = 6 arrangements
        assert!((exact_upper_tail(2, 2, 4.0) - 1.0 / 6.0).abs() < 1e-12);
        assert!((exact_upper_tail(2, 2, 2.0) - 4.0 / 6.0).abs() < 1e-12);
        assert!((exact_upper_tail(2, 2, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_with_unbalanced_sizes() {
        // one small sample against a larger one still uses the exact test
        let x = [1.0, 2.0];
        let y: Vec<f64> = (10..30).map(|v| v as f64).collect();
        let mw = mann_whitney_u(&x, &y);
        assert!(mw.exact);
        // complete separation: 2 / C(22, 2)
        assert!((mw.p_value - 2.0 / 231.0).abs() < 1e-12);
    }

    #[test]
    fn test_asymptotic_with_ties() {
        let x = [1.0, 2.0, 2.0, 3.0, 4.0];
        let y = [3.0, 4.0, 5.0, 5.0, 6.0];
        let mw = mann_whitney_u(&x, &y);
        assert!(!mw.exact);
        assert!(mw.p_value > 0.0 && mw.p_value < 1.0);
        // U1 = 2, tie-corrected z = 2.1147 with continuity correction
        assert_eq!(mw.u1, 2.0);
        assert!((mw.p_value - 0.034_45).abs() < 1e-4);
    }

    #[test]
    fn test_identical_values_give_p_one() {
        let result = test_partition(
            "clpm",
            &groups(&[("A", &[5.0, 5.0, 5.0]), ("B", &[5.0, 5.0])]),
            0.05,
        )
        .unwrap();
        assert_eq!(result.p_value(), 1.0);
        assert!(!result.significant());
        assert!(result.effect_size().is_none());
    }

    #[test]
    fn test_kruskal_wallis_three_groups() {
        let result = test_partition(
            "orf",
            &groups(&[
                ("A", &[1.0, 2.0, 3.0, 4.0]),
                ("B", &[10.0, 11.0, 12.0, 13.0]),
                ("C", &[20.0, 21.0, 22.0, 23.0]),
            ]),
            0.05,
        )
        .unwrap();

        assert_eq!(result.test(), TestKind::KruskalWallisH);
        assert_eq!(result.groups_compared(), 3);
        // H = 12/(12*13) * (100 + 676 + 1764)/4 - 39 = 9.846...
        assert!((result.statistic() - 9.846_153_846).abs() < 1e-6);
        assert!(result.p_value() < 0.01);
        assert!(result.significant());
    }

    #[test]
    fn test_kruskal_wallis_all_tied() {
        let kw = kruskal_wallis(&[&[3.0, 3.0], &[3.0], &[3.0, 3.0]]);
        assert_eq!(kw.p_value, 1.0);
        assert_eq!(kw.h, 0.0);
    }

    #[test]
    fn test_empty_groups_are_ignored() {
        let result = test_partition(
            "clpm",
            &groups(&[("A", &[1.0, 2.0]), ("B", &[]), ("C", &[7.0, 8.0])]),
            0.05,
        )
        .unwrap();
        assert_eq!(result.test(), TestKind::MannWhitneyU);
        assert_eq!(result.groups_compared(), 2);
    }

    #[test]
    fn test_single_group_is_insufficient() {
        let err = test_partition("clpm", &groups(&[("A", &[1.0]), ("B", &[])]), 0.05)
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientGroups {
                metric: "clpm".to_string(),
                found: 1
            }
        );
    }

    #[test]
    fn test_significant_is_derived() {
        let result = SignificanceResult::new("x", TestKind::MannWhitneyU, 0.0, 0.049, 2, 0.05);
        assert!(result.significant());

        let result = SignificanceResult::new("x", TestKind::MannWhitneyU, 0.0, 0.05, 2, 0.05);
        assert!(!result.significant());

        let result = SignificanceResult::new("x", TestKind::MannWhitneyU, 0.0, f64::NAN, 2, 0.05);
        assert_eq!(result.p_value(), 1.0);
    }

    #[test]
    fn test_effect_size_magnitude() {
        assert_eq!(EffectMagnitude::from_r(0.05), EffectMagnitude::Negligible);
        assert_eq!(EffectMagnitude::from_r(-0.2), EffectMagnitude::Small);
        assert_eq!(EffectMagnitude::from_r(0.45), EffectMagnitude::Medium);
        assert_eq!(EffectMagnitude::from_r(-0.8), EffectMagnitude::Large);

        let mw = mann_whitney_u(&[10.0, 20.0, 30.0], &[40.0, 50.0, 60.0]);
        let effect = mw.effect_size().unwrap();
        assert!(effect.r < 0.0);
        assert_eq!(effect.magnitude, EffectMagnitude::Large);
    }
}
