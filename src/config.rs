//! egrastats.toml configuration file
//!
//! ```toml
//! [analysis]
//! group_by = "gender"
//! metrics = ["clpm", "orf", "addition"]
//! correlation = true
//! strong_threshold = 0.6
//!
//! [[metric]]
//! code = "addition"
//! names = { en = "Addition", fr = "Addition" }
//! assessment = "egma"
//! mastery = 12
//! developing = [7, 11]
//! emerging = [0, 6]
//! international_standard = 16
//! ```
//!
//! `[[metric]]` entries replace built-in metrics with the same code or add new
//! ones. Invalid thresholds are fatal.

use crate::analysis::AnalysisConfig;
use crate::catalog::{MetricCatalog, MetricDefinition};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Root of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,

    /// Catalog overrides and additions
    pub metric: Vec<MetricDefinition>,
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// Built-in catalog with this file's `[[metric]]` entries applied
    pub fn catalog(&self) -> Result<MetricCatalog> {
        let catalog = MetricCatalog::builtin().with_overrides(self.metric.clone())?;
        Ok(catalog)
    }
}
