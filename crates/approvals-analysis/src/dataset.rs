//! Tabular approval data loaded from CSV files
//!
//! A dataset holds one [`Record`] per submission, each tagged with the milestone it
//! belongs to. Three columns are required:
//!
//! ```text
//! Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion
//! IRB,25,1
//! IRB,30,1
//! MOH,55,0
//! ```
//!
//! - **Milestone**: label of the regulatory checkpoint (e.g. `IRB`, `MOH`)
//! - **Duration**: days from submission to approval or to the last observation
//! - **Event flag**: `1` if approved at that duration, `0` if still pending (censored)
//!
//! Column names are configurable through [`ColumnSpec`].
//!
//! # Missing and malformed values
//!
//! Empty cells and the usual spreadsheet NA tokens (`NA`, `N/A`, `NaN`, `null`, `1.#IND`, ...)
//! are missing values. A missing duration or event flag excludes the record from its cohort.
//! A duration that is present but not a non-negative number is an ingestion error. An event
//! flag that is present but not numeric is read as "not approved" (see [`EventFlag`]).

use std::{collections::BTreeSet, fs::File, io, path::Path};

use serde::Serialize;

/// Names of the columns read from the CSV header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub milestone: String,
    pub duration: String,
    pub event: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            milestone: "Milestone".to_owned(),
            duration: "Dias_Hasta_Aprobacion".to_owned(),
            event: "Estado_Aprobacion".to_owned(),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum IngestError {
    #[display("failed to read dataset: {_0}")]
    Io(io::Error),
    #[display("malformed CSV: {_0}")]
    Csv(csv::Error),
    #[display("missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[display("line {line}: invalid duration {value:?}, expected a non-negative number of days")]
    InvalidDuration { line: u64, value: String },
}

/// One row of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Line number in the source file (the header is line 1).
    pub line: u64,
    pub milestone: String,
    /// Duration in days, `None` if the cell is missing.
    pub duration: Option<f64>,
    /// Raw event flag cell, trimmed.
    pub event: String,
}

/// Event flag of a record, interpreted.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum EventFlag {
    /// Empty cell or NA token.
    Missing,
    /// Numeric flag (non-zero after truncation means approved) or `true`/`false`.
    Flag(bool),
    /// Any other text; read as "not approved".
    Unparsed(String),
}

impl Record {
    #[must_use]
    pub fn event_flag(&self) -> EventFlag {
        let text = self.event.trim();
        if is_missing(text) {
            return EventFlag::Missing;
        }
        if let Some(value) = text.parse::<f64>().ok().filter(|v| v.is_finite()) {
            return EventFlag::Flag(value.trunc().abs() >= 1.0);
        }
        if text.eq_ignore_ascii_case("true") {
            EventFlag::Flag(true)
        } else if text.eq_ignore_ascii_case("false") {
            EventFlag::Flag(false)
        } else {
            EventFlag::Unparsed(text.to_owned())
        }
    }
}

const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(text: &str) -> bool {
    NA_TOKENS.contains(&text)
}

/// Records loaded from one file.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Reads a dataset from a CSV file.
    pub fn from_path<P>(path: P, columns: &ColumnSpec) -> Result<Self, IngestError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).map_err(IngestError::Io)?;
        Self::from_reader(io::BufReader::new(file), columns)
    }

    /// Reads a dataset from CSV data with a header row.
    ///
    /// Rows without a milestone label cannot belong to any cohort and are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use approvals_analysis::dataset::{ColumnSpec, Dataset};
    ///
    /// let csv = "Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\nIRB,25,1\nMOH,40,1\nIRB,30,0\n";
    /// let dataset = Dataset::from_reader(csv.as_bytes(), &ColumnSpec::default()).unwrap();
    ///
    /// assert_eq!(dataset.len(), 3);
    /// assert_eq!(dataset.milestones(), ["IRB", "MOH"]);
    /// ```
    pub fn from_reader<R>(reader: R, columns: &ColumnSpec) -> Result<Self, IngestError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers().map_err(IngestError::Csv)?.clone();
        let position = |name: &str| headers.iter().position(|header| header == name);
        let (milestone_idx, duration_idx, event_idx) = match (
            position(&columns.milestone),
            position(&columns.duration),
            position(&columns.event),
        ) {
            (Some(m), Some(d), Some(e)) => (m, d, e),
            (m, d, e) => {
                let missing = [
                    (m, &columns.milestone),
                    (d, &columns.duration),
                    (e, &columns.event),
                ]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, name)| name.clone())
                .collect();
                return Err(IngestError::MissingColumns { missing });
            }
        };

        let mut records = vec![];
        for row in reader.records() {
            let row = row.map_err(IngestError::Csv)?;
            let line = row.position().map_or(0, csv::Position::line);

            let milestone = row.get(milestone_idx).unwrap_or_default();
            if is_missing(milestone) {
                tracing::debug!(line, "skipping row without milestone label");
                continue;
            }

            let duration_text = row.get(duration_idx).unwrap_or_default();
            let duration = if is_missing(duration_text) {
                None
            } else {
                match duration_text.parse::<f64>() {
                    Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
                    _ => {
                        return Err(IngestError::InvalidDuration {
                            line,
                            value: duration_text.to_owned(),
                        });
                    }
                }
            };

            records.push(Record {
                line,
                milestone: milestone.to_owned(),
                duration,
                event: row.get(event_idx).unwrap_or_default().to_owned(),
            });
        }

        tracing::debug!(records = records.len(), "dataset loaded");
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct milestone labels, in order of first appearance.
    #[must_use]
    pub fn milestones(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .map(|record| record.milestone.as_str())
            .filter(|milestone| seen.insert(*milestone))
            .collect()
    }

    /// Distinct milestone labels with their record counts, in order of first appearance.
    #[must_use]
    pub fn milestone_counts(&self) -> Vec<(&str, usize)> {
        self.milestones()
            .into_iter()
            .map(|milestone| {
                let count = self
                    .records
                    .iter()
                    .filter(|record| record.milestone == milestone)
                    .count();
                (milestone, count)
            })
            .collect()
    }

    /// Records belonging to `milestone`.
    pub fn records_for<'a>(&'a self, milestone: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records
            .iter()
            .filter(move |record| record.milestone == milestone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<Dataset, IngestError> {
        Dataset::from_reader(csv.as_bytes(), &ColumnSpec::default())
    }

    fn record(event: &str) -> Record {
        Record {
            line: 2,
            milestone: "IRB".to_owned(),
            duration: Some(1.0),
            event: event.to_owned(),
        }
    }

    #[test]
    fn test_reads_records() {
        let dataset = load(
            "Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\n\
             IRB,25,1\n\
             MOH, 40.5 ,0\n",
        )
        .unwrap();

        assert_eq!(
            dataset.records()[1],
            Record {
                line: 3,
                milestone: "MOH".to_owned(),
                duration: Some(40.5),
                event: "0".to_owned(),
            }
        );
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let dataset = load(
            "Study,Estado_Aprobacion,Milestone,Dias_Hasta_Aprobacion\n\
             S1,1,IRB,25\n",
        )
        .unwrap();

        assert_eq!(dataset.records()[0].milestone, "IRB");
        assert_eq!(dataset.records()[0].duration, Some(25.0));
        assert_eq!(dataset.records()[0].event, "1");
    }

    #[test]
    fn test_missing_columns() {
        let err = load("Milestone,Days\nIRB,3\n").unwrap_err();
        match err {
            IngestError::MissingColumns { missing } => {
                assert_eq!(missing, ["Dias_Hasta_Aprobacion", "Estado_Aprobacion"]);
            }
            err => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn test_custom_columns() {
        let columns = ColumnSpec {
            milestone: "stage".to_owned(),
            duration: "days".to_owned(),
            event: "approved".to_owned(),
        };
        let dataset =
            Dataset::from_reader("stage,days,approved\nIRB,3,1\n".as_bytes(), &columns).unwrap();
        assert_eq!(dataset.milestones(), ["IRB"]);
    }

    #[test]
    fn test_missing_duration_is_kept_as_none() {
        let dataset = load(
            "Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\n\
             IRB,,1\n\
             IRB,NA,1\n\
             IRB\n",
        )
        .unwrap();
        assert!(dataset.records().iter().all(|r| r.duration.is_none()));
        assert_eq!(dataset.records()[2].event, "");
    }

    #[test]
    fn test_spreadsheet_na_tokens_are_missing() {
        let dataset = load(
            "Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\n\
             IRB,1.#IND,1\n\
             IRB,-1.#QNAN,1\n\
             IRB,#N/A N/A,1\n\
             IRB,4,#NA\n",
        )
        .unwrap();
        assert_eq!(dataset.len(), 4);
        assert!(dataset.records()[..3].iter().all(|r| r.duration.is_none()));
        assert_eq!(dataset.records()[3].event_flag(), EventFlag::Missing);
    }

    #[test]
    fn test_invalid_duration() {
        for value in ["abc", "-3", "inf"] {
            let csv = format!("Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\nIRB,{value},1\n");
            match load(&csv).unwrap_err() {
                IngestError::InvalidDuration { line, value: v } => {
                    assert_eq!(line, 2);
                    assert_eq!(v, value);
                }
                err => panic!("unexpected error: {err}"),
            }
        }
    }

    #[test]
    fn test_rows_without_milestone_are_skipped() {
        let dataset = load(
            "Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\n\
             ,25,1\n\
             IRB,30,1\n",
        )
        .unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_milestones_in_first_appearance_order() {
        let dataset = load(
            "Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\n\
             MOH,1,1\nIRB,2,1\nMOH,3,0\nEC,4,1\n",
        )
        .unwrap();
        assert_eq!(dataset.milestones(), ["MOH", "IRB", "EC"]);
        assert_eq!(dataset.milestone_counts(), [("MOH", 2), ("IRB", 1), ("EC", 1)]);
        assert_eq!(dataset.records_for("MOH").count(), 2);
    }

    #[test]
    fn test_event_flag() {
        assert_eq!(record("1").event_flag(), EventFlag::Flag(true));
        assert_eq!(record("0").event_flag(), EventFlag::Flag(false));
        assert_eq!(record("1.0").event_flag(), EventFlag::Flag(true));
        assert_eq!(record("0.5").event_flag(), EventFlag::Flag(false));
        assert_eq!(record("2").event_flag(), EventFlag::Flag(true));
        assert_eq!(record("TRUE").event_flag(), EventFlag::Flag(true));
        assert_eq!(record("false").event_flag(), EventFlag::Flag(false));
        assert_eq!(record("").event_flag(), EventFlag::Missing);
        assert_eq!(record("NaN").event_flag(), EventFlag::Missing);
        assert_eq!(
            record("approved").event_flag(),
            EventFlag::Unparsed("approved".to_owned())
        );
    }

    #[test]
    fn test_malformed_csv() {
        let csv = b"Milestone,Dias_Hasta_Aprobacion,Estado_Aprobacion\nIRB,1,\xff\n";
        let err = Dataset::from_reader(&csv[..], &ColumnSpec::default()).unwrap_err();
        assert!(matches!(err, IngestError::Csv(_)));
    }
}
