//! CSV output of per-group statistics
//!
//! One row per (group, metric). Undefined statistics are empty cells so a
//! spreadsheet never shows a fabricated zero. A student report card is one
//! row per indicator.

use crate::analysis::{BenchmarkStatus, ComparisonReport, GroupStatistics, StudentProfile};

/// CSV record for one group and metric
#[derive(Debug, Clone)]
pub struct CsvGroupStat {
    pub stats: GroupStatistics,
    pub status: Option<BenchmarkStatus>,
}

/// Group statistics CSV formatter
#[derive(Debug, Default)]
pub struct CsvOutput {
    rows: Vec<CsvGroupStat>,
    group_column: String,
}

const STAT_COLUMNS: [&str; 10] = [
    "metric", "count", "mean", "std", "min", "p25", "p50", "p75", "p90", "max",
];

impl CsvOutput {
    pub fn new(group_column: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            group_column: group_column.into(),
        }
    }

    /// Every group/metric cell of a report, groups sorted, metrics in analysis order
    pub fn from_report(report: &ComparisonReport) -> Self {
        let mut output = Self::new(report.group_column.clone());
        for group in report.group_names() {
            for metric in &report.analysed_metrics {
                if let Some(stats) = report.stats(group, metric) {
                    output.add_stat(CsvGroupStat {
                        stats: stats.clone(),
                        status: report.status(group, metric),
                    });
                }
            }
        }
        output
    }

    pub fn add_stat(&mut self, stat: CsvGroupStat) {
        self.rows.push(stat);
    }

    fn header(&self) -> String {
        let mut headers = vec![Self::escape_field(&self.group_column)];
        headers.extend(STAT_COLUMNS.iter().map(|h| h.to_string()));
        headers.push("status".to_string());
        headers.join(",")
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn number(value: Option<f64>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    fn format_row(&self, row: &CsvGroupStat) -> String {
        let s = &row.stats.summary;
        let fields = [
            Self::escape_field(&row.stats.group),
            Self::escape_field(&row.stats.metric),
            s.count.to_string(),
            Self::number(s.mean),
            Self::number(s.std),
            Self::number(s.min),
            Self::number(s.p25),
            Self::number(s.p50),
            Self::number(s.p75),
            Self::number(s.p90),
            Self::number(s.max),
            row.status.map(|st| st.as_str().to_string()).unwrap_or_default(),
        ];
        fields.join(",")
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&self.format_row(row));
            output.push('\n');
        }

        output
    }
}

const STUDENT_COLUMNS: [&str; 7] = [
    "metric",
    "assessment",
    "score",
    "standard",
    "status",
    "reference_mean",
    "difference",
];

/// One row per indicator of a student profile
pub fn student_to_csv(profile: &StudentProfile) -> String {
    let mut output = STUDENT_COLUMNS.join(",");
    output.push('\n');
    for i in &profile.indicators {
        let fields = [
            CsvOutput::escape_field(&i.metric),
            i.assessment.as_str().to_string(),
            CsvOutput::number(i.score),
            i.standard.to_string(),
            i.status.as_str().to_string(),
            CsvOutput::number(i.reference_mean),
            CsvOutput::number(i.difference),
        ];
        output.push_str(&fields.join(","));
        output.push('\n');
    }
    output
}
