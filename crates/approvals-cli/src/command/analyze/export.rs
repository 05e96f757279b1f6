//! CSV export of survival curves

use std::path::Path;

use anyhow::Context;
use approvals_analysis::report::MilestoneReport;
use serde::Serialize;

use crate::util::Output;

#[derive(Debug, Serialize)]
struct CurveRow<'a> {
    milestone: &'a str,
    time: f64,
    survival_prob: f64,
    at_risk: usize,
    events: usize,
    censored: usize,
}

/// Save the curve steps of every report to one CSV file
///
/// # Arguments
/// * `path` - Output CSV file
/// * `reports` - Reports whose curves are written, one row per step
pub(super) fn save_curves<'a, I>(path: &Path, reports: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = &'a MilestoneReport>,
{
    let output = Output::open(path.to_path_buf())?;
    let display_path = output.display_path();
    let mut writer = csv::Writer::from_writer(output);

    for report in reports {
        for step in report.curve.steps() {
            writer
                .serialize(CurveRow {
                    milestone: &report.milestone,
                    time: step.time,
                    survival_prob: step.survival_prob,
                    at_risk: step.at_risk,
                    events: step.events,
                    censored: step.censored,
                })
                .with_context(|| {
                    format!(
                        "Failed to write curve of milestone '{}' to {display_path}",
                        report.milestone
                    )
                })?;
        }
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush curve CSV: {display_path}"))?;
    tracing::info!(path = %display_path, "survival curves saved");

    Ok(())
}
