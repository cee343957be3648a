//! Error taxonomy for the statistics engine
//!
//! Per-metric and per-pair failures are captured in the report as markers.
//! Only dataset-level problems (the grouping column is absent) abort a request.

use serde::Serialize;
use thiserror::Error;

/// Errors produced by the analysis engine
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("column not found in dataset: {column}")]
    MissingColumn { column: String },

    #[error("metric {metric}: need at least 2 non-empty groups, found {found}")]
    InsufficientGroups { metric: String, found: usize },

    #[error("{context}: need at least {required} valid observations, found {found}")]
    InsufficientData {
        context: String,
        required: usize,
        found: usize,
    },

    #[error("column is not numeric: {column}")]
    NonNumericColumn { column: String },

    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    #[error("no student with {column} = {id}")]
    UnknownStudent { column: String, id: String },
}

impl AnalysisError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    pub fn insufficient_data(context: impl Into<String>, required: usize, found: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            found,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::InsufficientGroups {
            metric: "clpm".to_string(),
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "metric clpm: need at least 2 non-empty groups, found 1"
        );

        let err = AnalysisError::insufficient_data("reliability", 2, 1);
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = AnalysisError::missing_column("orf");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "missing_column");
        assert_eq!(json["column"], "orf");
    }

    #[test]
    fn test_unknown_student_message() {
        let err = AnalysisError::UnknownStudent {
            column: "pupil_id".to_string(),
            id: "p9".to_string(),
        };
        assert_eq!(err.to_string(), "no student with pupil_id = p9");
        assert_eq!(serde_json::to_value(&err).unwrap()["kind"], "unknown_student");
    }

    #[test]
    fn test_configuration_serializes() {
        let err = AnalysisError::configuration("bad thresholds");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("configuration"));
    }
}
