// Metric definitions and proficiency thresholds

use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

/// Assessment family a metric belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    /// Early Grade Reading Assessment
    Egra,
    /// Early Grade Math Assessment
    Egma,
}

impl Assessment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assessment::Egra => "egra",
            Assessment::Egma => "egma",
        }
    }
}

/// Display locale for presentation layers
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Ar,
}

/// Metric display names; French and Arabic fall back to English
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayNames {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ar: Option<String>,
}

impl DisplayNames {
    pub fn get(&self, locale: Locale) -> &str {
        let localized = match locale {
            Locale::En => None,
            Locale::Fr => self.fr.as_deref(),
            Locale::Ar => self.ar.as_deref(),
        };
        localized.unwrap_or(&self.en)
    }
}

/// Inclusive score range, written `[low, high]` in TOML
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, score: f64) -> bool {
        self.low <= score && score <= self.high
    }
}

impl From<[f64; 2]> for Band {
    fn from([low, high]: [f64; 2]) -> Self {
        Self { low, high }
    }
}

impl From<Band> for [f64; 2] {
    fn from(band: Band) -> Self {
        [band.low, band.high]
    }
}

/// One assessment metric and its benchmark thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub code: String,
    pub names: DisplayNames,
    pub assessment: Assessment,
    /// Minimum score for Mastery
    pub mastery: f64,
    pub developing: Band,
    pub emerging: Band,
    /// Grade 2-3 international reference score, when one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub international_standard: Option<f64>,
}

impl MetricDefinition {
    pub fn display_name(&self, locale: Locale) -> &str {
        self.names.get(locale)
    }

    /// Check `emerging.low <= emerging.high < developing.low <= developing.high < mastery`
    pub fn validate(&self) -> AnalysisResult<()> {
        let invalid = |reason: &str| {
            Err(AnalysisError::configuration(format!(
                "metric {}: {}",
                self.code, reason
            )))
        };

        if self.code.trim().is_empty() {
            return invalid("empty metric code");
        }

        let values = [
            self.mastery,
            self.developing.low,
            self.developing.high,
            self.emerging.low,
            self.emerging.high,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return invalid("thresholds must be finite");
        }

        if self.emerging.low > self.emerging.high {
            return invalid("emerging range is inverted");
        }
        if self.developing.low > self.developing.high {
            return invalid("developing range is inverted");
        }
        if self.emerging.high >= self.developing.low {
            return invalid("emerging range overlaps developing range");
        }
        if self.developing.high >= self.mastery {
            return invalid("developing range reaches mastery threshold");
        }

        if let Some(standard) = self.international_standard {
            if !standard.is_finite() || standard <= 0.0 {
                return invalid("international standard must be positive");
            }
        }

        Ok(())
    }
}
