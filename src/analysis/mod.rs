// Statistical comparison and benchmark scoring engine
//
// Given a dataset and a grouping dimension (school, gender, language, SES or
// home-support terciles, or any column) the engine computes per-group
// descriptive statistics, tests group differences, correlates metrics,
// measures reliability and classifies scores against proficiency thresholds.
// It also crosses two dimensions and builds single-student report cards.
//
// Methods:
// - Mann, H. B., & Whitney, D. R. (1947). On a test of whether one of two
//   random variables is stochastically larger than the other.
// - Kruskal, W. H., & Wallis, W. A. (1952). Use of ranks in one-criterion
//   variance analysis. JASA 47(260).
// - Cronbach, L. J. (1951). Coefficient alpha and the internal structure of
//   tests. Psychometrika 16(3).
//
// The engine is locale-independent and never renders or writes files.
// Moments, ranks and distribution functions come from statrs.

mod aggregate;
mod benchmark;
mod config;
mod correlation;
mod crosstab;
mod grouping;
mod profile;
mod reliability;
mod report;
mod significance;
mod zero_scores;

pub use aggregate::{aggregate, Aggregation, GroupRanking, GroupStatistics};
pub use benchmark::{
    band_distribution, classify, classify_option, classify_value, compare_international,
    international_comparisons, BandDistribution, BenchmarkStatus, InternationalCategory,
    InternationalComparison,
};
pub use config::{
    AnalysisConfig, GroupDimension, DEFAULT_SIGNIFICANCE_LEVEL, DEFAULT_STRONG_THRESHOLD,
};
pub use correlation::{
    correlate, correlate_pair, correlation_p_value, linear_regression, significance_stars,
    strong_pairs, CorrelationMatrix, CorrelationPair, CorrelationStrength, Direction,
    MIN_PAIRED_OBSERVATIONS,
};
pub use crosstab::{cross_tabulate, CrossCell, CrossTabulation};
pub use grouping::{
    group_labels, normalize_gender, partition, terciles, TERCILE_HIGH, TERCILE_LOW,
    TERCILE_MEDIUM,
};
pub use profile::{student_profile, IndicatorStatus, StudentProfile, DEFAULT_ID_COLUMN};
pub use reliability::{cronbach_alpha, ReliabilityLevel, ReliabilityResult};
pub use report::{ComparisonReport, Outcome, ALL_METRICS_SCALE};
pub use significance::{
    kruskal_wallis, mann_whitney_u, test_groups, test_partition, EffectMagnitude, EffectSize,
    KruskalWallis, MannWhitney, SignificanceResult, TestKind,
};
pub use zero_scores::{zero_scores, ZeroScoreSummary};
