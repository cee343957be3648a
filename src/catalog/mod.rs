//! Metric catalog: codes, display names and proficiency thresholds
//!
//! The built-in table covers the seven EGRA and six EGMA subtasks. A TOML
//! configuration may replace thresholds or add metrics; every definition is
//! validated when the catalog is built and a bad one is fatal.

mod builtin;
mod definition;

pub use definition::{Assessment, Band, DisplayNames, Locale, MetricDefinition};

use crate::error::{AnalysisError, AnalysisResult};
use serde::Serialize;

/// Ordered, validated set of metric definitions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCatalog {
    metrics: Vec<MetricDefinition>,
}

impl MetricCatalog {
    /// Catalog with the standard EGRA/EGMA thresholds
    pub fn builtin() -> Self {
        Self {
            metrics: builtin::definitions(),
        }
    }

    /// Build from explicit definitions, validating each and rejecting duplicate codes
    pub fn from_definitions(metrics: Vec<MetricDefinition>) -> AnalysisResult<Self> {
        let catalog = Self { metrics };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Replace definitions with matching codes and append new ones
    pub fn with_overrides(mut self, overrides: Vec<MetricDefinition>) -> AnalysisResult<Self> {
        for def in overrides {
            match self.metrics.iter_mut().find(|m| m.code == def.code) {
                Some(existing) => *existing = def,
                None => self.metrics.push(def),
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        for (i, def) in self.metrics.iter().enumerate() {
            def.validate()?;
            if self.metrics[..i].iter().any(|m| m.code == def.code) {
                return Err(AnalysisError::configuration(format!(
                    "duplicate metric code {}",
                    def.code
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.metrics.iter()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.code.as_str()).collect()
    }

    /// Codes of one assessment family, in catalog order
    pub fn assessment_codes(&self, assessment: Assessment) -> Vec<&str> {
        self.metrics
            .iter()
            .filter(|m| m.assessment == assessment)
            .map(|m| m.code.as_str())
            .collect()
    }

    /// Display name for a code, or the code itself when unknown
    pub fn display_name<'a>(&'a self, code: &'a str, locale: Locale) -> &'a str {
        self.get(code).map_or(code, |m| m.display_name(locale))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
