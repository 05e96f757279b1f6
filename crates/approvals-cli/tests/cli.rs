use std::{fs, path::PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DATASET: &str = "\
Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion
IRB,25,1
MOH,40,1
IRB,30,1
MOH,55,0
IRB,45,1
EC,12,0
EC,20,0
";

fn write_dataset(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("approvals.csv");
    fs::write(&path, contents).unwrap();
    path
}

fn approvals() -> Command {
    Command::cargo_bin("approvals").unwrap()
}

#[test]
fn help_smoke() {
    approvals().arg("--help").assert().success();
}

#[test]
fn milestones_lists_labels_in_order() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, DATASET);

    approvals()
        .arg("milestones")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("(3 found)"))
        .stdout(predicate::str::is_match(r"(?s)IRB.*3 records \(default\).*MOH.*EC").unwrap());
}

#[test]
fn analyze_defaults_to_first_milestone() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, DATASET);

    approvals()
        .arg("analyze")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Approval Projection: IRB (n=3)"))
        .stdout(predicate::str::contains("10% approval probability at: 25 days"))
        .stdout(predicate::str::contains("70% approval probability at: 45 days"));
}

#[test]
fn analyze_reports_unreached_percentiles() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, DATASET);

    approvals()
        .args(["analyze", "--milestone", "MOH"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("50% approval probability at: 40 days"))
        .stdout(predicate::str::contains(
            "60% approval probability: not reached (max 50.0% at 55 days)",
        ));
}

#[test]
fn analyze_flags_milestones_without_events() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, DATASET);

    approvals()
        .args(["analyze", "--milestone", "EC"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No approval events for EC"));
}

#[test]
fn analyze_unknown_milestone_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, DATASET);

    approvals()
        .args(["analyze", "--milestone", "CA"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no records for milestone 'CA'"));
}

#[test]
fn analyze_all_keeps_reporting_past_failures() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, &format!("{DATASET}CA,,1\n"));

    approvals()
        .args(["analyze", "--all"])
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Approval Projection: IRB (n=3)"))
        .stdout(predicate::str::contains("Approval Projection: MOH (n=2)"))
        .stderr(predicate::str::contains("1 of 4 milestones could not be analyzed"));
}

#[test]
fn analyze_empty_cohort_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(
        &dir,
        "Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\nIRB,,1\nIRB,10,\n",
    );

    approvals()
        .arg("analyze")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cohort has no usable observations"));
}

#[test]
fn missing_columns_are_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, "Milestone,Days\nIRB,10\n");

    approvals()
        .arg("milestones")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "missing required columns: Dias_Hasta_Aprobacion, Estado_Aprobacion",
        ));
}

#[test]
fn custom_column_names() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, "stage,days,approved\nIRB,10,1\n");

    approvals()
        .args([
            "analyze",
            "--milestone-column",
            "stage",
            "--duration-column",
            "days",
            "--event-column",
            "approved",
        ])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("100% approval probability at: 10 days"));
}

#[test]
fn invalid_percentile_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, DATASET);

    approvals()
        .args(["analyze", "--percentiles", "10,150"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("percentile must be within 1..=100"));
}

#[test]
fn json_report_for_all_milestones() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, DATASET);
    let output = dir.path().join("report.json");

    approvals()
        .args(["analyze", "--all", "--json", "--output"])
        .arg(&output)
        .arg(&path)
        .assert()
        .success();

    let contents = fs::read_to_string(&output).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["milestone"], "IRB");
    assert_eq!(entries[1]["report"]["thresholds"][5]["status"], "NOT_REACHED");
    assert_eq!(entries[2]["report"]["status"], "NO_EVENTS");
}

#[test]
fn curve_csv_export() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, DATASET);
    let curve = dir.path().join("curve.csv");

    approvals()
        .args(["analyze", "--milestone", "MOH", "--curve-output"])
        .arg(&curve)
        .arg(&path)
        .assert()
        .success();

    let contents = fs::read_to_string(&curve).unwrap();
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(
        lines,
        [
            "milestone,time,survival_prob,at_risk,events,censored",
            "MOH,40.0,0.5,2,1,0",
            "MOH,55.0,0.5,1,0,1",
        ]
    );
}
