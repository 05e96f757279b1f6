//! Per-milestone approval reports
//!
//! A report bundles everything shown for one milestone: how its cohort was built, the
//! Kaplan-Meier curve and the percentile thresholds located on it.
//!
//! # Examples
//!
//! ```
//! use approvals_analysis::{
//!     dataset::{ColumnSpec, Dataset},
//!     report::{CohortStatus, analyze},
//! };
//! use approvals_stats::threshold::{Percentile, ThresholdStatus};
//!
//! let csv = "Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\nMOH,40,1\nMOH,55,0\n";
//! let dataset = Dataset::from_reader(csv.as_bytes(), &ColumnSpec::default()).unwrap();
//!
//! let report = analyze(&dataset, "MOH", &Percentile::DECILES).unwrap();
//! assert_eq!(report.status, CohortStatus::Ok);
//! assert_eq!(report.thresholds[4].status, ThresholdStatus::Reached); // 50%
//! assert_eq!(report.thresholds[5].status, ThresholdStatus::NotReached); // 60%
//! ```

use approvals_stats::{
    survival::{self, SurvivalCurve},
    threshold::{self, Percentile, ThresholdResult},
};
use serde::Serialize;

use crate::{
    AnalysisError,
    cohort::{Cohort, CohortSummary},
    dataset::Dataset,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CohortStatus {
    Ok,
    /// No approval was observed; the curve is flat at 1.0 and no threshold is reached.
    NoEvents,
}

/// Analysis results for one milestone
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneReport {
    pub milestone: String,
    pub summary: CohortSummary,
    pub status: CohortStatus,
    /// First time at which half of the cohort is estimated to be approved
    pub median_time: Option<f64>,
    pub curve: SurvivalCurve,
    pub thresholds: Vec<ThresholdResult>,
}

impl MilestoneReport {
    /// Estimates the curve of a cohort and locates `percentiles` on it.
    pub fn from_cohort(cohort: Cohort, percentiles: &[Percentile]) -> Result<Self, AnalysisError> {
        let (milestone, observations, summary) = cohort.into_parts();
        let curve = survival::estimate(&observations).map_err(AnalysisError::Estimate)?;

        let status = if curve.has_events() {
            CohortStatus::Ok
        } else {
            tracing::warn!(
                milestone = %milestone,
                observations = observations.len(),
                "no approval events observed"
            );
            CohortStatus::NoEvents
        };

        Ok(Self {
            thresholds: threshold::locate_all(&curve, percentiles),
            median_time: curve.median_time(),
            milestone,
            summary,
            status,
            curve,
        })
    }
}

/// Analyzes a single milestone of the dataset.
pub fn analyze(
    dataset: &Dataset,
    milestone: &str,
    percentiles: &[Percentile],
) -> Result<MilestoneReport, AnalysisError> {
    let cohort = dataset.cohort(milestone)?;
    tracing::debug!(
        milestone,
        usable = cohort.summary().usable,
        records = cohort.summary().records,
        "cohort built"
    );
    MilestoneReport::from_cohort(cohort, percentiles)
}

/// Analyzes every milestone of the dataset independently, in order of first appearance.
///
/// Each milestone gets its own result, so a failing cohort does not hide the others.
#[must_use]
pub fn analyze_all(
    dataset: &Dataset,
    percentiles: &[Percentile],
) -> Vec<(String, Result<MilestoneReport, AnalysisError>)> {
    dataset
        .milestones()
        .into_iter()
        .map(|milestone| {
            (
                milestone.to_owned(),
                analyze(dataset, milestone, percentiles),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approvals_stats::{
        survival::EstimateError,
        threshold::{Percentile, ThresholdStatus},
    };

    use super::*;
    use crate::dataset::ColumnSpec;

    const CSV: &str = "\
Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion
IRB,25,1
MOH,40,1
IRB,30,1
MOH,55,0
IRB,45,1
EC,12,0
EC,20,0
CA,,1
";

    fn load() -> Dataset {
        Dataset::from_reader(CSV.as_bytes(), &ColumnSpec::default()).unwrap()
    }

    fn p(value: u8) -> Percentile {
        Percentile::new(value).unwrap()
    }

    #[test]
    fn test_all_approved_milestone() {
        let report = analyze(&load(), "IRB", &Percentile::DECILES).unwrap();

        assert_eq!(report.status, CohortStatus::Ok);
        assert_eq!(report.summary.usable, 3);
        assert_eq!(report.curve.steps().len(), 3);
        assert_eq!(report.thresholds[0].percentile, p(10));
        assert_eq!(report.thresholds[0].days, 25);
        assert_eq!(report.thresholds[6].days, 45);
        assert!(report.thresholds.iter().all(|t| t.status.is_reached()));
        assert_eq!(report.median_time, Some(30.0));
    }

    #[test]
    fn test_censored_milestone() {
        let report = analyze(&load(), "MOH", &[p(50), p(60)]).unwrap();

        assert_eq!(report.thresholds[0].status, ThresholdStatus::Reached);
        assert_eq!(report.thresholds[0].days, 40);
        assert_eq!(report.thresholds[1].status, ThresholdStatus::NotReached);
        assert_eq!(report.thresholds[1].days, 55);
        assert!((report.thresholds[1].attained_probability - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_events_is_a_valid_report() {
        let report = analyze(&load(), "EC", &Percentile::DECILES).unwrap();

        assert!(report.status.is_no_events());
        assert_eq!(report.median_time, None);
        assert!(report.curve.steps().iter().all(|s| s.survival_prob == 1.0));
        assert!(report.thresholds.iter().all(|t| t.status.is_not_reached()));
    }

    #[test]
    fn test_empty_cohort_after_dropping() {
        let err = analyze(&load(), "CA", &Percentile::DECILES).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Estimate(EstimateError::EmptyCohort)
        ));
    }

    #[test]
    fn test_analyze_all_keeps_going() {
        let results = analyze_all(&load(), &Percentile::DECILES);
        let names = results.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();

        assert_eq!(names, ["IRB", "MOH", "EC", "CA"]);
        assert!(results[0].1.is_ok());
        assert!(results[2].1.is_ok());
        assert!(results[3].1.is_err());
    }

    #[test]
    fn test_report_serializes_status_names() {
        let report = analyze(&load(), "MOH", &[p(60)]).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "OK");
        assert_eq!(json["thresholds"][0]["status"], "NOT_REACHED");
        assert_eq!(json["thresholds"][0]["percentile"], 60);
        assert_eq!(json["curve"]["steps"][1]["censored"], 1);
    }
}
