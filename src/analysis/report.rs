// Orchestration of one comparison request
//
// Sequential and stateless: group statistics, one significance test per
// metric, optional correlation and reliability, then benchmark statuses of
// the group means. A failing metric or pair becomes a `NotComputable` marker
// in the report. Only a missing grouping column (or an invalid config) aborts
// the whole build.

use super::aggregate::{aggregate_labels, GroupRanking, GroupStatistics};
use super::benchmark::{
    band_distribution, classify_option, international_comparisons, BandDistribution,
    BenchmarkStatus, InternationalComparison,
};
use super::config::{AnalysisConfig, GroupDimension};
use super::correlation::{correlate, CorrelationMatrix, CorrelationPair};
use super::crosstab::{cross_tabulate, CrossTabulation};
use super::grouping::{group_labels, partition};
use super::reliability::{cronbach_alpha, ReliabilityResult, MIN_ITEMS};
use super::significance::{test_partition, SignificanceResult};
use super::zero_scores::{zero_scores, ZeroScoreSummary};
use crate::catalog::{Assessment, MetricCatalog};
use crate::dataset::Dataset;
use crate::error::{AnalysisError, AnalysisResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Reliability scale covering every analysed metric
pub const ALL_METRICS_SCALE: &str = "all";

/// Per-metric result or the reason it could not be computed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Computed(T),
    NotComputable { error: AnalysisError },
}

impl<T> Outcome<T> {
    pub fn computed(&self) -> Option<&T> {
        match self {
            Outcome::Computed(value) => Some(value),
            Outcome::NotComputable { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match self {
            Outcome::Computed(_) => None,
            Outcome::NotComputable { error } => Some(error),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Outcome::Computed(_))
    }
}

impl<T> From<AnalysisResult<T>> for Outcome<T> {
    fn from(result: AnalysisResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::Computed(value),
            Err(error) => Outcome::NotComputable { error },
        }
    }
}

/// Everything computed for one dataset and configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub group_by: GroupDimension,
    pub group_column: String,
    pub dataset_rows: usize,
    /// Rows without a group value
    pub excluded_rows: usize,
    /// Requested (or discovered) metrics, after de-duplication
    pub metrics: Vec<String>,
    /// Numeric metrics that made it into the statistics
    pub analysed_metrics: Vec<String>,
    /// group -> metric -> statistics
    pub group_stats: BTreeMap<String, BTreeMap<String, GroupStatistics>>,
    pub rankings: Vec<GroupRanking>,
    /// metric -> group comparison
    pub significance: BTreeMap<String, Outcome<SignificanceResult>>,
    /// group -> metric -> status of the group mean
    pub benchmark_statuses: BTreeMap<String, BTreeMap<String, BenchmarkStatus>>,
    /// group -> metric -> students per band
    pub band_distributions: BTreeMap<String, BTreeMap<String, BandDistribution>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlations: Option<CorrelationMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong_correlations: Option<Vec<CorrelationPair>>,
    /// scale name -> alpha
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reliability: Option<BTreeMap<String, Outcome<ReliabilityResult>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_scores: Option<Vec<ZeroScoreSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub international: Option<Vec<InternationalComparison>>,
    /// Metric means over `group_by` x `cross_by`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_tabulation: Option<Outcome<CrossTabulation>>,
    /// Warning-level conditions (skipped columns)
    pub warnings: Vec<AnalysisError>,
    pub significance_level: f64,
    pub strong_threshold: f64,
}

impl ComparisonReport {
    /// Run every requested analysis over `dataset`
    ///
    /// # Example
    /// ```
    /// use egrastats::analysis::{AnalysisConfig, ComparisonReport};
    /// use egrastats::catalog::MetricCatalog;
    /// use egrastats::dataset::Dataset;
    ///
    /// let ds = Dataset::from_csv_str("school,clpm\nA,10\nA,20\nB,40\nB,50\n").unwrap();
    /// let report = ComparisonReport::build(&ds, &AnalysisConfig::default(), &MetricCatalog::builtin()).unwrap();
    ///
    /// assert_eq!(report.analysed_metrics, vec!["clpm"]);
    /// assert!(report.significance["clpm"].is_computed());
    /// ```
    pub fn build(
        dataset: &Dataset,
        config: &AnalysisConfig,
        catalog: &MetricCatalog,
    ) -> AnalysisResult<Self> {
        config.validate()?;

        let group_column = config.group_by.column_name().to_string();
        let labels = group_labels(dataset, &config.group_by)?;
        let metrics = resolve_metrics(dataset, config, catalog);
        tracing::info!(
            "Building report: {} rows grouped by {}, {} metrics",
            dataset.len(),
            config.group_by,
            metrics.len()
        );

        let aggregation = aggregate_labels(dataset, &group_column, &labels, &metrics);
        let mut warnings = aggregation.warnings.clone();

        let mut significance = BTreeMap::new();
        let mut benchmark_statuses: BTreeMap<String, BTreeMap<String, BenchmarkStatus>> =
            BTreeMap::new();
        let mut band_distributions: BTreeMap<String, BTreeMap<String, BandDistribution>> =
            BTreeMap::new();

        for metric in &metrics {
            let values = match dataset.numeric_column(metric) {
                Ok(values) => values,
                Err(error) => {
                    significance.insert(metric.clone(), Outcome::NotComputable { error });
                    continue;
                }
            };
            let groups = partition(&labels, &values);

            let outcome: Outcome<_> =
                test_partition(metric, &groups, config.significance_level).into();
            if let Some(e) = outcome.error() {
                tracing::warn!("Significance test failed for {}: {}", metric, e);
            }
            significance.insert(metric.clone(), outcome);

            let definition = catalog.get(metric);
            for (group, group_values) in &groups {
                let mean = aggregation.get(group, metric).and_then(|s| s.mean());
                let status = definition.map_or(BenchmarkStatus::Unknown, |def| {
                    classify_option(mean, def)
                });
                benchmark_statuses
                    .entry(group.clone())
                    .or_default()
                    .insert(metric.clone(), status);

                if let Some(def) = definition {
                    band_distributions
                        .entry(group.clone())
                        .or_default()
                        .insert(metric.clone(), band_distribution(group_values, def));
                }
            }
        }

        let analysed = aggregation.metrics.clone();
        let rankings = analysed
            .iter()
            .filter_map(|m| aggregation.ranking(m))
            .collect();

        let (correlations, strong_correlations) = if config.correlation {
            let matrix = correlate(dataset, &analysed);
            let strong = matrix.strong_pairs(config.strong_threshold);
            (Some(matrix), Some(strong))
        } else {
            (None, None)
        };

        let reliability = config
            .reliability
            .then(|| reliability_scales(dataset, catalog, &analysed));

        let zero_scores = config.zero_scores.then(|| {
            let (summaries, _) = zero_scores(dataset, &analysed);
            summaries
        });

        let international = config.international.then(|| {
            let (comparisons, skipped) = international_comparisons(dataset, catalog, &analysed);
            warnings.extend(skipped);
            comparisons
        });

        let cross_tabulation = config.cross_by.as_ref().map(|cross_by| {
            let outcome: Outcome<_> =
                cross_tabulate(dataset, &config.group_by, cross_by, &analysed).into();
            if let Some(e) = outcome.error() {
                tracing::warn!("Cross-tabulation by {} not computable: {}", cross_by, e);
            }
            outcome
        });

        Ok(Self {
            group_by: config.group_by.clone(),
            group_column,
            dataset_rows: dataset.len(),
            excluded_rows: aggregation.excluded_rows,
            metrics,
            analysed_metrics: analysed,
            group_stats: aggregation.groups,
            rankings,
            significance,
            benchmark_statuses,
            band_distributions,
            correlations,
            strong_correlations,
            reliability,
            zero_scores,
            international,
            cross_tabulation,
            warnings,
            significance_level: config.significance_level,
            strong_threshold: config.strong_threshold,
        })
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.group_stats.keys().map(String::as_str)
    }

    pub fn stats(&self, group: &str, metric: &str) -> Option<&GroupStatistics> {
        self.group_stats.get(group)?.get(metric)
    }

    pub fn status(&self, group: &str, metric: &str) -> Option<BenchmarkStatus> {
        self.benchmark_statuses.get(group)?.get(metric).copied()
    }

    /// Metrics whose group comparison is significant
    pub fn significant_metrics(&self) -> Vec<&str> {
        self.significance
            .iter()
            .filter(|(_, o)| o.computed().is_some_and(|r| r.significant()))
            .map(|(m, _)| m.as_str())
            .collect()
    }
}

/// Explicit metric list, de-duplicated; otherwise catalog metrics present in the dataset
fn resolve_metrics(
    dataset: &Dataset,
    config: &AnalysisConfig,
    catalog: &MetricCatalog,
) -> Vec<String> {
    if config.metrics.is_empty() {
        return catalog
            .codes()
            .into_iter()
            .filter(|code| dataset.has_column(code))
            .map(str::to_string)
            .collect();
    }

    let mut metrics: Vec<String> = Vec::new();
    for m in &config.metrics {
        let m = m.trim();
        if !metrics.iter().any(|existing| existing == m) {
            metrics.push(m.to_string());
        }
    }
    metrics
}

/// Alpha for the full metric set and each assessment family with at least two items
fn reliability_scales(
    dataset: &Dataset,
    catalog: &MetricCatalog,
    metrics: &[String],
) -> BTreeMap<String, Outcome<ReliabilityResult>> {
    let mut scales: BTreeMap<String, Outcome<ReliabilityResult>> = BTreeMap::new();
    scales.insert(
        ALL_METRICS_SCALE.to_string(),
        cronbach_alpha(dataset, metrics).into(),
    );

    for assessment in [Assessment::Egra, Assessment::Egma] {
        let items: Vec<String> = metrics
            .iter()
            .filter(|m| catalog.get(m).is_some_and(|d| d.assessment == assessment))
            .cloned()
            .collect();
        if items.len() >= MIN_ITEMS {
            scales.insert(
                assessment.as_str().to_string(),
                cronbach_alpha(dataset, &items).into(),
            );
        }
    }

    for (scale, outcome) in &scales {
        if let Some(e) = outcome.error() {
            tracing::warn!("Reliability not computable for {}: {}", scale, e);
        }
    }
    scales
}
