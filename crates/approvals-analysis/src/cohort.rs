//! Per-milestone cohorts of observations
//!
//! A cohort gathers the records of a single milestone and turns them into the
//! `(duration, approved)` observations consumed by the estimator. Records that cannot be
//! used are dropped here, before estimation, and tallied in a [`CohortSummary`].

use std::collections::BTreeMap;

use approvals_stats::survival::Observation;
use serde::Serialize;

use crate::{
    AnalysisError,
    dataset::{Dataset, EventFlag},
};

/// Observations of one milestone.
#[derive(Debug, Clone)]
pub struct Cohort {
    milestone: String,
    observations: Vec<Observation>,
    summary: CohortSummary,
}

/// Counts describing how a cohort was built
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CohortSummary {
    /// Records carrying the milestone label
    pub records: usize,
    /// Records turned into observations
    pub usable: usize,
    /// Records dropped for a missing duration or event flag
    pub dropped_missing: usize,
    /// Usable records whose non-numeric event flag was read as "not approved"
    pub coerced_event_flags: usize,
    /// Observations with an approval
    pub events: usize,
    /// Censored observations
    pub censored: usize,
    /// Raw event flag values and how often they occur, over all records with a flag
    pub event_flag_counts: BTreeMap<String, usize>,
}

impl Dataset {
    /// Builds the cohort of `milestone`.
    ///
    /// The cohort may hold no observation at all when every record was dropped; the estimator
    /// reports that case as an empty cohort.
    pub fn cohort(&self, milestone: &str) -> Result<Cohort, AnalysisError> {
        let mut summary = CohortSummary::default();
        let mut observations = vec![];

        for record in self.records_for(milestone) {
            summary.records += 1;
            if !record.event_flag().is_missing() {
                *summary
                    .event_flag_counts
                    .entry(record.event.clone())
                    .or_default() += 1;
            }

            let Some(duration) = record.duration else {
                tracing::debug!(
                    line = record.line,
                    milestone,
                    "dropping record without duration"
                );
                summary.dropped_missing += 1;
                continue;
            };
            let approved = match record.event_flag() {
                EventFlag::Missing => {
                    tracing::debug!(
                        line = record.line,
                        milestone,
                        "dropping record without event flag"
                    );
                    summary.dropped_missing += 1;
                    continue;
                }
                EventFlag::Flag(approved) => approved,
                EventFlag::Unparsed(text) => {
                    tracing::debug!(
                        line = record.line,
                        milestone,
                        flag = %text,
                        "reading event flag as not approved"
                    );
                    summary.coerced_event_flags += 1;
                    false
                }
            };

            let observation = Observation::new(duration, approved).map_err(|source| {
                AnalysisError::InvalidObservation {
                    line: record.line,
                    source,
                }
            })?;
            if approved {
                summary.events += 1;
            } else {
                summary.censored += 1;
            }
            observations.push(observation);
        }

        if summary.records == 0 {
            return Err(AnalysisError::UnknownMilestone {
                milestone: milestone.to_owned(),
            });
        }
        summary.usable = observations.len();

        Ok(Cohort {
            milestone: milestone.to_owned(),
            observations,
            summary,
        })
    }
}

impl Cohort {
    #[must_use]
    pub fn milestone(&self) -> &str {
        &self.milestone
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    #[must_use]
    pub fn summary(&self) -> &CohortSummary {
        &self.summary
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Observation>, CohortSummary) {
        (self.milestone, self.observations, self.summary)
    }
}
