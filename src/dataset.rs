//! In-memory tabular dataset
//!
//! Rows x named columns of numeric, text or missing cells. The engine only
//! reads a dataset; loading from CSV lives here so the CLI has something to
//! feed it.

use crate::error::{AnalysisError, AnalysisResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Cell spellings treated as missing (compared case-insensitively)
const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "."];

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw CSV cell
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if MISSING_MARKERS
            .iter()
            .any(|m| trimmed.eq_ignore_ascii_case(m))
        {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Categorical label for grouping; integral numbers render without a fraction
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Missing => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        n.map_or(Value::Missing, Value::Number)
    }
}

/// Row-major table with named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, rejecting rows whose width differs from the header
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                anyhow::bail!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    columns.len()
                );
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a dataset column by column
    ///
    /// # Example
    /// ```
    /// use egrastats::dataset::{Dataset, Value};
    ///
    /// let ds = Dataset::from_columns(vec![
    ///     ("school", vec!["A".into(), "B".into()]),
    ///     ("clpm", vec![Value::from(12.0), Value::Missing]),
    /// ])
    /// .unwrap();
    /// assert_eq!(ds.len(), 2);
    /// ```
    pub fn from_columns(columns: Vec<(&str, Vec<Value>)>) -> Result<Self> {
        let height = columns.first().map_or(0, |(_, v)| v.len());
        if let Some((name, _)) = columns.iter().find(|(_, v)| v.len() != height) {
            anyhow::bail!("column {} length differs from {}", name, height);
        }

        let names = columns.iter().map(|(n, _)| n.to_string()).collect();
        let mut rows = vec![Vec::with_capacity(columns.len()); height];
        for (_, values) in columns {
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
        }
        Self::new(names, rows)
    }

    /// Parse CSV text (header row first)
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut records = parse_csv(content.trim_start_matches('\u{feff}'))?.into_iter();
        let header = records.next().context("CSV input has no header row")?;
        let columns: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

        let rows: Vec<Vec<Value>> = records
            .filter(|r| !(r.len() == 1 && r[0].trim().is_empty()))
            .map(|r| r.iter().map(|cell| Value::parse(cell)).collect::<Vec<_>>())
            .collect();

        Self::new(columns, rows)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_csv_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All cells of a column, in row order
    pub fn column(&self, name: &str) -> AnalysisResult<Vec<&Value>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| AnalysisError::missing_column(name))?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// True when the column exists and holds no text cells
    pub fn is_numeric(&self, name: &str) -> bool {
        self.column(name)
            .map(|cells| cells.iter().all(|v| !matches!(v, Value::Text(_))))
            .unwrap_or(false)
    }

    /// Numeric view of a column; `None` marks a missing cell
    pub fn numeric_column(&self, name: &str) -> AnalysisResult<Vec<Option<f64>>> {
        let cells = self.column(name)?;
        if cells.iter().any(|v| matches!(v, Value::Text(_))) {
            return Err(AnalysisError::NonNumericColumn {
                column: name.to_string(),
            });
        }
        Ok(cells.iter().map(|v| v.as_f64()).collect())
    }
}

/// Minimal RFC 4180 reader: quoted fields, doubled quotes, CRLF, embedded newlines
fn parse_csv(content: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        anyhow::bail!("unterminated quoted field");
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}
