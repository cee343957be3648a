//! JSON output of a comparison report or a student report card
//!
//! The report is serialized as-is; per-metric failures appear as
//! `{"status": "not_computable", "error": {...}}` entries.

use crate::analysis::{ComparisonReport, StudentProfile};
use crate::catalog::{Locale, MetricCatalog};
use serde::Serialize;
use std::collections::BTreeMap;

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub locale: Locale,
    /// Display name of each analysed metric in `locale`
    pub metric_names: BTreeMap<String, String>,
    pub report: &'a ComparisonReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl<'a> JsonOutput<'a> {
    pub fn new(report: &'a ComparisonReport, catalog: &MetricCatalog, locale: Locale) -> Self {
        let metric_names = report
            .metrics
            .iter()
            .map(|code| (code.clone(), catalog.display_name(code, locale).to_string()))
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "egrastats-json-v1".to_string(),
            locale,
            metric_names,
            report,
            narrative: None,
        }
    }

    pub fn set_narrative(&mut self, narrative: String) {
        self.narrative = Some(narrative);
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Envelope around one student's profile
#[derive(Debug, Clone, Serialize)]
pub struct StudentJsonOutput<'a> {
    pub version: String,
    pub format: String,
    pub locale: Locale,
    pub metric_names: BTreeMap<String, String>,
    pub student: &'a StudentProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl<'a> StudentJsonOutput<'a> {
    pub fn new(student: &'a StudentProfile, catalog: &MetricCatalog, locale: Locale) -> Self {
        let metric_names = student
            .indicators
            .iter()
            .map(|i| (i.metric.clone(), catalog.display_name(&i.metric, locale).to_string()))
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "egrastats-student-json-v1".to_string(),
            locale,
            metric_names,
            student,
            narrative: None,
        }
    }

    pub fn set_narrative(&mut self, narrative: String) {
        self.narrative = Some(narrative);
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
