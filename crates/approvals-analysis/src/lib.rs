//! Milestone approval analysis over tabular datasets
//!
//! This crate connects raw approval records to the estimators of `approvals-stats`.
//!
//! # Overview
//!
//! 1. **Load Dataset** ([`dataset::Dataset`]): Read a CSV file and validate its columns
//! 2. **Build Cohort** ([`cohort::Cohort`]): Select the records of one milestone, dropping
//!    unusable rows
//! 3. **Analyze** ([`report::analyze`]): Estimate the Kaplan-Meier curve and locate the
//!    percentile thresholds
//!
//! Every step takes its inputs explicitly; nothing is cached between calls, and reports of
//! different milestones share no state.
//!
//! # Examples
//!
//! ```
//! use approvals_analysis::{
//!     dataset::{ColumnSpec, Dataset},
//!     report::analyze_all,
//! };
//! use approvals_stats::threshold::Percentile;
//!
//! let csv = "\
//! Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion
//! IRB,25,1
//! IRB,30,1
//! MOH,40,1
//! MOH,55,0
//! ";
//! let dataset = Dataset::from_reader(csv.as_bytes(), &ColumnSpec::default()).unwrap();
//!
//! for (milestone, report) in analyze_all(&dataset, &Percentile::DECILES) {
//!     let report = report.unwrap();
//!     println!("{milestone}: median {:?} days", report.median_time);
//! }
//! ```

use approvals_stats::survival::{EstimateError, InvalidDurationError};

pub mod cohort;
pub mod dataset;
pub mod report;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum AnalysisError {
    #[display("no records for milestone '{milestone}'")]
    UnknownMilestone { milestone: String },
    #[display("line {line}: {source}")]
    InvalidObservation {
        line: u64,
        source: InvalidDurationError,
    },
    #[display("{_0}")]
    Estimate(EstimateError),
}
