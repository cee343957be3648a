//! Human-readable report rendering
//!
//! Metric display names follow the requested locale; undefined values print
//! as `n/a` and failed analyses as "not computable".

use crate::analysis::{ComparisonReport, Outcome, StudentProfile};
use crate::catalog::{Assessment, Locale, MetricCatalog};
use std::fmt::Write as _;

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}

pub struct TextReport<'a> {
    report: &'a ComparisonReport,
    catalog: &'a MetricCatalog,
    locale: Locale,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a ComparisonReport, catalog: &'a MetricCatalog, locale: Locale) -> Self {
        Self {
            report,
            catalog,
            locale,
        }
    }

    fn name(&self, code: &str) -> String {
        let display = self.catalog.display_name(code, self.locale);
        if display == code {
            code.to_string()
        } else {
            format!("{} ({})", display, code)
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.header(&mut out);
        self.group_stats(&mut out);
        self.rankings(&mut out);
        self.significance(&mut out);
        self.correlations(&mut out);
        self.reliability(&mut out);
        self.zero_scores(&mut out);
        self.international(&mut out);
        self.cross_tabulation(&mut out);
        self.warnings(&mut out);
        out
    }

    fn header(&self, out: &mut String) {
        let r = self.report;
        let _ = writeln!(
            out,
            "EGRA/EGMA COMPARISON BY {} (column: {})",
            r.group_by.to_string().to_uppercase(),
            r.group_column
        );
        let _ = writeln!(
            out,
            "Rows: {} (excluded, no group value: {})",
            r.dataset_rows, r.excluded_rows
        );
        let _ = writeln!(out, "Significance level: {}", r.significance_level);
    }

    fn group_stats(&self, out: &mut String) {
        let r = self.report;
        let _ = writeln!(out, "\n📊 Group statistics:");
        for metric in &r.analysed_metrics {
            let _ = writeln!(out, "  {}", self.name(metric));
            for group in r.group_names() {
                let Some(stats) = r.stats(group, metric) else {
                    continue;
                };
                let s = &stats.summary;
                if s.count == 0 {
                    let _ = writeln!(out, "    {}: n=0 (no data)", group);
                    continue;
                }
                let status = r
                    .status(group, metric)
                    .map(|st| format!(" [{}]", st.as_str()))
                    .unwrap_or_default();
                let mastery = r
                    .band_distributions
                    .get(group)
                    .and_then(|m| m.get(metric))
                    .and_then(|d| d.mastery_percent())
                    .map(|p| format!(" mastery={:.1}%", p))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "    {}: n={} mean={} std={} min={} median={} max={}{}{}",
                    group,
                    s.count,
                    opt(s.mean, 2),
                    opt(s.std, 2),
                    opt(s.min, 2),
                    opt(s.p50, 2),
                    opt(s.max, 2),
                    status,
                    mastery
                );
            }
        }
    }

    fn rankings(&self, out: &mut String) {
        if self.report.rankings.is_empty() {
            return;
        }
        let _ = writeln!(out, "\n🏆 Rankings:");
        for rank in &self.report.rankings {
            let _ = writeln!(
                out,
                "  {}: highest {} ({:.2}), lowest {} ({:.2}), range {:.2}",
                self.name(&rank.metric),
                rank.highest_group,
                rank.highest_mean,
                rank.lowest_group,
                rank.lowest_mean,
                rank.range
            );
        }
    }

    fn significance(&self, out: &mut String) {
        let _ = writeln!(out, "\n🔬 Significance tests:");
        for metric in &self.report.metrics {
            let Some(outcome) = self.report.significance.get(metric) else {
                continue;
            };
            match outcome {
                Outcome::Computed(result) => {
                    let verdict = if result.significant() {
                        "significant"
                    } else {
                        "not significant"
                    };
                    let effect = result
                        .effect_size()
                        .map(|e| format!(", effect r = {:.2} ({})", e.r, e.magnitude.as_str()))
                        .unwrap_or_default();
                    let _ = writeln!(
                        out,
                        "  {}: {} = {:.3}, p = {:.4} ({}){}",
                        self.name(metric),
                        result.test().as_str(),
                        result.statistic(),
                        result.p_value(),
                        verdict,
                        effect
                    );
                }
                Outcome::NotComputable { error } => {
                    let _ = writeln!(out, "  {}: not computable ({})", self.name(metric), error);
                }
            }
        }
    }

    fn correlations(&self, out: &mut String) {
        let Some(strong) = &self.report.strong_correlations else {
            return;
        };
        let _ = writeln!(
            out,
            "\n📈 Strong correlations (|r| >= {:.2}):",
            self.report.strong_threshold
        );
        if strong.is_empty() {
            let _ = writeln!(out, "  none");
        }
        for pair in strong {
            let label = match (pair.strength, pair.direction) {
                (Some(s), Some(d)) => format!(" ({}, {})", s.as_str(), d.as_str()),
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "  {} ~ {}: r = {} {}{}, rho = {}, slope = {}, R² = {}, n = {}",
                self.name(&pair.metric_a),
                self.name(&pair.metric_b),
                opt(pair.pearson_r, 3),
                pair.significance.unwrap_or(""),
                label,
                opt(pair.spearman_rho, 3),
                opt(pair.regression_slope, 3),
                opt(pair.r_squared, 3),
                pair.observations
            );
        }

        if let Some(matrix) = &self.report.correlations {
            let undefined: Vec<_> = matrix.pairs.iter().filter(|p| !p.is_defined()).collect();
            for pair in undefined {
                let reason = pair
                    .error
                    .as_ref()
                    .map_or_else(|| "zero variance".to_string(), |e| e.to_string());
                let _ = writeln!(
                    out,
                    "  {} ~ {}: not computable ({})",
                    pair.metric_a, pair.metric_b, reason
                );
            }
        }
    }

    fn reliability(&self, out: &mut String) {
        let Some(scales) = &self.report.reliability else {
            return;
        };
        let _ = writeln!(out, "\n🧪 Reliability (Cronbach's alpha):");
        for (scale, outcome) in scales {
            match outcome {
                Outcome::Computed(result) => {
                    let level = result
                        .reliability_level
                        .map_or("undefined", |l| l.as_str());
                    let _ = writeln!(
                        out,
                        "  {}: alpha = {} ({}), {} items, n = {}",
                        scale,
                        opt(result.alpha, 3),
                        level,
                        result.item_count,
                        result.sample_size
                    );
                }
                Outcome::NotComputable { error } => {
                    let _ = writeln!(out, "  {}: not computable ({})", scale, error);
                }
            }
        }
    }

    fn zero_scores(&self, out: &mut String) {
        let Some(zero) = &self.report.zero_scores else {
            return;
        };
        let _ = writeln!(out, "\n0️⃣  Zero scores:");
        for z in zero {
            let _ = writeln!(
                out,
                "  {}: {} students ({:.2}%)",
                self.name(&z.metric),
                z.zero_count,
                z.percent
            );
        }
    }

    fn international(&self, out: &mut String) {
        let Some(comparisons) = &self.report.international else {
            return;
        };
        let _ = writeln!(out, "\n🌍 International comparison:");
        for c in comparisons {
            let _ = writeln!(
                out,
                "  {}: mean {:.2} vs standard {:.0} (gap {:+.2}, {:.1}% of standard, {})",
                self.name(&c.metric),
                c.mean,
                c.standard,
                c.gap,
                c.percent_of_standard,
                c.category.as_str()
            );
        }
    }

    fn cross_tabulation(&self, out: &mut String) {
        let Some(outcome) = &self.report.cross_tabulation else {
            return;
        };
        let table = match outcome {
            Outcome::Computed(table) => table,
            Outcome::NotComputable { error } => {
                let _ = writeln!(out, "\n🧮 Cross-tabulation: not computable ({})", error);
                return;
            }
        };
        let _ = writeln!(
            out,
            "\n🧮 Cross-tabulation ({} x {}, mean per cell):",
            table.row_dimension, table.column_dimension
        );
        for (metric, rows) in &table.cells {
            let _ = writeln!(out, "  {}", self.name(metric));
            let _ = writeln!(out, "    {:<12}{}", "", table.column_levels.join(" | "));
            for row in &table.row_levels {
                let Some(cells) = rows.get(row) else {
                    continue;
                };
                let line: Vec<String> = table
                    .column_levels
                    .iter()
                    .map(|column| {
                        cells.get(column).map_or_else(
                            || "n/a".to_string(),
                            |cell| format!("{} (n={})", opt(cell.mean, 2), cell.count),
                        )
                    })
                    .collect();
                let _ = writeln!(out, "    {:<12}{}", row, line.join(" | "));
            }
        }
    }

    fn warnings(&self, out: &mut String) {
        if self.report.warnings.is_empty() {
            return;
        }
        let _ = writeln!(out, "\n⚠️  Warnings:");
        for w in &self.report.warnings {
            let _ = writeln!(out, "  - {}", w);
        }
    }
}

/// Report card for one student
pub struct StudentCard<'a> {
    profile: &'a StudentProfile,
    catalog: &'a MetricCatalog,
    locale: Locale,
}

impl<'a> StudentCard<'a> {
    pub fn new(profile: &'a StudentProfile, catalog: &'a MetricCatalog, locale: Locale) -> Self {
        Self {
            profile,
            catalog,
            locale,
        }
    }

    pub fn render(&self) -> String {
        let p = self.profile;
        let mut out = String::new();
        let _ = writeln!(out, "STUDENT REPORT CARD: {} = {}", p.id_column, p.id);
        let reference = p.reference_group.as_deref().map_or_else(
            || "whole dataset".to_string(),
            |group| format!("{} {}", p.reference_dimension, group),
        );
        let _ = writeln!(out, "Reference mean: {}", reference);

        for (assessment, icon) in [(Assessment::Egra, "📖"), (Assessment::Egma, "🔢")] {
            let indicators: Vec<_> = p.assessment(assessment).collect();
            if indicators.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{} {}:", icon, assessment.as_str().to_uppercase());
            for i in indicators {
                let _ = writeln!(
                    out,
                    "  {}: score {} / standard {:.0} [{}], reference mean {} ({})",
                    self.catalog.display_name(&i.metric, self.locale),
                    opt(i.score, 1),
                    i.standard,
                    i.status.as_str(),
                    opt(i.reference_mean, 1),
                    i.difference
                        .map_or_else(|| "n/a".to_string(), |d| format!("{:+.1}", d))
                );
            }
        }

        if !p.warnings.is_empty() {
            let _ = writeln!(out, "\n⚠️  Warnings:");
            for w in &p.warnings {
                let _ = writeln!(out, "  - {}", w);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{student_profile, AnalysisConfig, GroupDimension};
    use crate::dataset::Dataset;

    fn render(config: &AnalysisConfig, locale: Locale) -> String {
        let ds = Dataset::from_csv_str(
            "school,clpm,orf,addition,notes\n\
             A,10,12,0,x\n\
             A,20,22,7,y\n\
             A,30,31,10,z\n\
             B,40,41,12,w\n\
             B,50,49,15,v\n\
             B,60,62,,u\n",
        )
        .unwrap();
        let catalog = MetricCatalog::builtin();
        let report = ComparisonReport::build(&ds, config, &catalog).unwrap();
        TextReport::new(&report, &catalog, locale).render()
    }

    #[test]
    fn test_text_basic_sections() {
        let text = render(&AnalysisConfig::default(), Locale::En);
        assert!(text.starts_with("EGRA/EGMA COMPARISON BY SCHOOL (column: school)"));
        assert!(text.contains("Correct Letters Per Minute (clpm)"));
        assert!(text.contains("A: n=3 mean=20.00 std=10.00"));
        assert!(text.contains("Mann-Whitney U = 0.000, p = 0.1000 (not significant)"));
        assert!(text.contains("highest B (50.00), lowest A (20.00)"));
        assert!(!text.contains("Strong correlations"));
    }

    #[test]
    fn test_text_full_sections() {
        let text = render(&AnalysisConfig::full(GroupDimension::School), Locale::En);
        assert!(text.contains("Strong correlations (|r| >= 0.50)"));
        assert!(text.contains("Reliability (Cronbach's alpha)"));
        assert!(text.contains("Addition (addition): 1 students (16.67%)"));
        assert!(text.contains("International comparison"));
    }

    #[test]
    fn test_text_locale_names() {
        let text = render(&AnalysisConfig::default(), Locale::Fr);
        assert!(text.contains("Lettres Correctes Par Minute (clpm)"));
    }

    #[test]
    fn test_text_cross_tabulation() {
        let ds = Dataset::from_csv_str(
            "school,ses,clpm\n\
             A,1,10\n\
             A,2,20\n\
             A,3,30\n\
             B,4,40\n\
             B,5,50\n\
             B,6,60\n",
        )
        .unwrap();
        let config = AnalysisConfig {
            cross_by: Some(GroupDimension::Ses),
            ..AnalysisConfig::default()
        };
        let catalog = MetricCatalog::builtin();
        let report = ComparisonReport::build(&ds, &config, &catalog).unwrap();
        let text = TextReport::new(&report, &catalog, Locale::En).render();

        assert!(text.contains("Cross-tabulation (school x ses, mean per cell):"));
        assert!(text.contains("Low | Medium | High"));
        assert!(text.contains("15.00 (n=2) | 30.00 (n=1) | n/a (n=0)"));
    }

    #[test]
    fn test_text_cross_tabulation_not_computable() {
        let config = AnalysisConfig {
            cross_by: Some(GroupDimension::Gender),
            ..AnalysisConfig::default()
        };
        let text = render(&config, Locale::En);
        assert!(text.contains("Cross-tabulation: not computable (column not found in dataset: stgender)"));
    }

    #[test]
    fn test_student_card() {
        let ds = Dataset::from_csv_str("pupil_id,school,clpm,addition\n7,A,50,3\n8,A,30,\n").unwrap();
        let catalog = MetricCatalog::builtin();
        let profile =
            student_profile(&ds, &catalog, "pupil_id", "7", &GroupDimension::School).unwrap();
        let text = StudentCard::new(&profile, &catalog, Locale::En).render();

        assert!(text.starts_with("STUDENT REPORT CARD: pupil_id = 7"));
        assert!(text.contains("Reference mean: school A"));
        assert!(text.contains(
            "Correct Letters Per Minute: score 50.0 / standard 44 [Mastery], reference mean 40.0 (+10.0)"
        ));
        assert!(text.contains("EGMA:"));
        assert!(text.contains("Addition: score 3.0 / standard 10 [Emerging], reference mean 3.0 (+0.0)"));
    }

    #[test]
    fn test_text_not_computable_marker() {
        let config = AnalysisConfig {
            metrics: vec!["clpm".to_string(), "notes".to_string()],
            ..AnalysisConfig::default()
        };
        let text = render(&config, Locale::En);
        assert!(text.contains("notes: not computable (column is not numeric: notes)"));
        assert!(text.contains("Warnings:"));
    }
}
