//! Text rendering of approval reports

use approvals_analysis::{
    cohort::CohortSummary,
    report::{CohortStatus, MilestoneReport},
};
use approvals_stats::{
    survival::SurvivalCurve,
    threshold::{ThresholdResult, ThresholdStatus},
};

/// Print legend explaining table columns
pub(super) fn print_legend() {
    println!("Legend:");
    println!("  At Risk     : Submissions still pending and under observation at that day");
    println!("  Approved    : Approvals recorded on that day");
    println!("  Censored    : Submissions last seen pending on that day");
    println!("  P(Pending)  : Kaplan-Meier probability of no approval yet");
}

pub(super) fn print_report(report: &MilestoneReport) {
    println!(
        "Approval Projection: {} (n={})",
        report.milestone, report.summary.usable
    );
    println!("==========================================");
    print_summary(&report.summary, report.median_time);
    println!();

    println!("Survival Curve");
    print_curve_table(&report.curve);
    println!();

    println!("Approval Probability by Percentile");
    if report.status == CohortStatus::NoEvents {
        println!(
            "  No approval events for {}; the curve stays at 100% pending.",
            report.milestone
        );
    }
    for result in &report.thresholds {
        println!("  {}", threshold_message(result));
    }
}

fn print_summary(summary: &CohortSummary, median_time: Option<f64>) {
    println!(
        "  Records: {} ({} usable, {} dropped for missing values, {} event flags read as pending)",
        summary.records, summary.usable, summary.dropped_missing, summary.coerced_event_flags
    );
    println!(
        "  Approved: {}, Censored: {}",
        summary.events, summary.censored
    );
    let flag_counts = summary
        .event_flag_counts
        .iter()
        .map(|(flag, count)| format!("{flag:?}={count}"))
        .collect::<Vec<_>>()
        .join(", ");
    println!("  Event flag values: {flag_counts}");
    let median_str = median_time.map_or("not reached".to_string(), |m| format!("{m} days"));
    println!("  Median time to approval: {median_str}");
}

fn print_curve_table(curve: &SurvivalCurve) {
    println!(
        "  {:>10} {:>8} {:>9} {:>9} {:>11}",
        "Day", "At Risk", "Approved", "Censored", "P(Pending)"
    );
    // day(10) + at_risk(8) + approved(9) + censored(9) + prob(11) + spaces(4)
    println!("  {}", "-".repeat(51));
    for step in curve.steps() {
        println!(
            "  {:>10} {:>8} {:>9} {:>9} {:>11.3}",
            step.time, step.at_risk, step.events, step.censored, step.survival_prob
        );
    }
}

/// Message shown for one percentile lookup
pub(super) fn threshold_message(result: &ThresholdResult) -> String {
    match result.status {
        ThresholdStatus::Reached => format!(
            "📊 {} approval probability at: {} days",
            result.percentile, result.days
        ),
        ThresholdStatus::NotReached => format!(
            "⚠  {} approval probability: not reached (max {:.1}% at {} days)",
            result.percentile, result.attained_probability, result.days
        ),
    }
}
