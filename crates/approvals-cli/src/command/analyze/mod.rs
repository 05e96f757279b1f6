//! Approval analysis command
//!
//! Estimates the Kaplan-Meier curve of one or all milestones and reports the day on which
//! each cumulative approval percentile is first reached.

mod export;
mod table;

use std::path::PathBuf;

use anyhow::Context;
use approvals_analysis::{
    AnalysisError,
    dataset::Dataset,
    report::{self, MilestoneReport},
};
use approvals_stats::threshold::Percentile;
use clap::Args;
use serde::Serialize;

use crate::util::{DatasetArg, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalyzeArg {
    #[clap(flatten)]
    dataset: DatasetArg,

    /// Milestone to analyze (defaults to the first milestone of the dataset)
    #[arg(long, conflicts_with = "all")]
    milestone: Option<String>,

    /// Analyze every milestone of the dataset
    #[arg(long)]
    all: bool,

    /// Cumulative approval percentiles to locate (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "10,20,30,40,50,60,70,80,90,100")]
    percentiles: Vec<Percentile>,

    /// Save the survival curve steps to this CSV file
    #[arg(long)]
    curve_output: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Write the JSON report to this file instead of stdout
    #[arg(long, requires = "json")]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ReportEntry<'a> {
    milestone: &'a str,
    #[serde(flatten)]
    outcome: Outcome<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome<'a> {
    Report(&'a MilestoneReport),
    Error(String),
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let dataset = arg.dataset.read()?;

    let results = if arg.all {
        report::analyze_all(&dataset, &arg.percentiles)
    } else {
        let milestone = select_milestone(arg, &dataset)?;
        let result = report::analyze(&dataset, &milestone, &arg.percentiles);
        vec![(milestone, result)]
    };

    if let Some(path) = &arg.curve_output {
        export::save_curves(path, results.iter().filter_map(|(_, r)| r.as_ref().ok()))?;
    }

    if arg.json {
        let entries = results
            .iter()
            .map(|(milestone, result)| ReportEntry {
                milestone,
                outcome: match result {
                    Ok(report) => Outcome::Report(report),
                    Err(err) => Outcome::Error(err.to_string()),
                },
            })
            .collect::<Vec<_>>();
        Output::save_json(&entries, arg.output.clone())?;
    } else {
        table::print_legend();
        for report in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
            println!();
            table::print_report(report);
        }
    }

    report_failures(&results)
}

fn select_milestone(arg: &AnalyzeArg, dataset: &Dataset) -> anyhow::Result<String> {
    if let Some(milestone) = &arg.milestone {
        return Ok(milestone.clone());
    }
    let milestone = dataset
        .milestones()
        .first()
        .map(|m| (*m).to_owned())
        .with_context(|| {
            format!(
                "Dataset has no milestones: {}",
                arg.dataset.dataset.display()
            )
        })?;
    tracing::info!(milestone = %milestone, "no milestone selected, using the first one");
    Ok(milestone)
}

fn report_failures(
    results: &[(String, Result<MilestoneReport, AnalysisError>)],
) -> anyhow::Result<()> {
    let failures = results
        .iter()
        .filter_map(|(milestone, result)| result.as_ref().err().map(|err| (milestone, err)))
        .collect::<Vec<_>>();

    match failures.as_slice() {
        [] => Ok(()),
        [(milestone, err)] if results.len() == 1 => {
            Err(anyhow::Error::new((*err).clone())
                .context(format!("Failed to analyze milestone '{milestone}'")))
        }
        _ => {
            for (milestone, err) in &failures {
                tracing::error!(milestone = %milestone, error = %err, "analysis failed");
            }
            anyhow::bail!(
                "{} of {} milestones could not be analyzed",
                failures.len(),
                results.len()
            )
        }
    }
}
