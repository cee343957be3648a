//! egrastats - statistical comparison and benchmark scoring for EGRA/EGMA data
//!
//! This library provides the comparison engine (group statistics, rank-based
//! significance tests, correlation, reliability and proficiency benchmarks)
//! together with the CSV loader, configuration file and report renderers used
//! by the `egrastats` binary.

pub mod analysis;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod dataset;
pub mod error;
pub mod json_output;
pub mod narrative;
pub mod stats;
pub mod text_output;
