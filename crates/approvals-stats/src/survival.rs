//! Kaplan-Meier estimation of time-to-approval curves.
//!
//! The Kaplan-Meier estimator is a non-parametric statistic used to estimate the survival
//! function from lifetime data. It accounts for right-censored data: records whose approval
//! had not happened by the last time they were observed.
//!
//! Here "survival" means "not approved yet". A curve answers the question "what is the
//! probability that a submission is still pending after `t` days?".
//!
//! ```text
//! Approved:  |----x    (approved at day 25)
//! Censored:  |------>  (still pending at day 55, true approval day unknown)
//! ```

use serde::Serialize;

/// A single time-to-event record.
///
/// The duration is validated on construction, so a slice of observations always satisfies
/// the estimator's preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    duration: f64,
    event_observed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display("duration must be a finite non-negative number of days, got {duration}")]
pub struct InvalidDurationError {
    pub duration: f64,
}

impl Observation {
    /// Creates an observation.
    ///
    /// # Arguments
    ///
    /// * `duration` - Elapsed days from submission to approval or to the last observation
    /// * `event_observed` - `true` if the approval happened at `duration`, `false` if the
    ///   record is censored
    ///
    /// # Examples
    ///
    /// ```
    /// # use approvals_stats::survival::Observation;
    /// assert!(Observation::new(25.0, true).is_ok());
    /// assert!(Observation::new(-1.0, true).is_err());
    /// assert!(Observation::new(f64::NAN, false).is_err());
    /// ```
    pub fn new(duration: f64, event_observed: bool) -> Result<Self, InvalidDurationError> {
        if duration.is_finite() && duration >= 0.0 {
            // abs() folds -0.0 into 0.0 so equal durations always tie
            Ok(Self {
                duration: duration.abs(),
                event_observed,
            })
        } else {
            Err(InvalidDurationError { duration })
        }
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn event_observed(&self) -> bool {
        self.event_observed
    }
}

/// One step of a survival curve, together with the life-table counts at that time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveStep {
    /// Distinct observed duration.
    pub time: f64,
    /// Probability of no approval yet, valid from `time` until the next step.
    pub survival_prob: f64,
    /// Number of observations with a duration of at least `time`.
    pub at_risk: usize,
    /// Number of approvals observed exactly at `time`.
    pub events: usize,
    /// Number of censored observations exactly at `time`.
    pub censored: usize,
}

/// Right-continuous step function estimating the probability of no approval yet.
///
/// Steps are strictly increasing in time and non-increasing in probability. An implicit
/// leading step `(0, 1.0)` precedes the first stored step. A curve always holds at least
/// one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurvivalCurve {
    steps: Vec<CurveStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
pub enum CurveError {
    #[display("curve has no steps")]
    NoSteps,
    #[display("step time {time} is not a finite non-negative number")]
    InvalidTime { time: f64 },
    #[display("survival probability {survival_prob} at time {time} is outside [0, 1]")]
    ProbabilityOutOfRange { time: f64, survival_prob: f64 },
    #[display("survival probability increases at time {time}")]
    NotMonotone { time: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
pub enum EstimateError {
    #[display("cohort has no usable observations")]
    EmptyCohort,
    #[display("survival curve construction failed: {_0}")]
    DegenerateCurve(CurveError),
}

/// Computes the Kaplan-Meier survival curve of a cohort.
///
/// Observations sharing a duration are aggregated into one step. At each distinct time
/// `t_i` with `n_i` observations at risk and `d_i` approvals, the survival probability is
/// multiplied by `(n_i - d_i) / n_i`. Censored observations only shrink the risk set of
/// later steps.
///
/// A cohort without any approval yields a flat curve at `1.0`; use
/// [`SurvivalCurve::has_events`] to tell it apart.
///
/// # Errors
///
/// * [`EstimateError::EmptyCohort`] - if `cohort` is empty
/// * [`EstimateError::DegenerateCurve`] - if the computed steps violate the curve invariants
///
/// # Examples
///
/// ```
/// # use approvals_stats::survival::{Observation, estimate};
/// let cohort = [
///     Observation::new(40.0, true).unwrap(),
///     Observation::new(55.0, false).unwrap(),
/// ];
/// let curve = estimate(&cohort).unwrap();
///
/// assert_eq!(curve.survival_at(40.0), Some(0.5));
/// assert_eq!(curve.survival_at(55.0), Some(0.5)); // censoring does not lower S
/// assert_eq!(curve.survival_at(60.0), None); // no extrapolation
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn estimate(cohort: &[Observation]) -> Result<SurvivalCurve, EstimateError> {
    if cohort.is_empty() {
        return Err(EstimateError::EmptyCohort);
    }

    let mut sorted = cohort.to_vec();
    sorted.sort_by(|a, b| a.duration.total_cmp(&b.duration));

    let total = sorted.len();
    let mut steps = Vec::new();
    let mut current_survival = 1.0;
    let mut seen = 0;

    for group in sorted.chunk_by(|a, b| a.duration.total_cmp(&b.duration).is_eq()) {
        let at_risk = total - seen;
        let events = group.iter().filter(|obs| obs.event_observed).count();

        if events > 0 {
            let survival_rate = 1.0 - (events as f64 / at_risk as f64);
            current_survival *= survival_rate;
        }

        steps.push(CurveStep {
            time: group[0].duration,
            survival_prob: current_survival,
            at_risk,
            events,
            censored: group.len() - events,
        });
        seen += group.len();
    }

    SurvivalCurve::from_steps(steps).map_err(EstimateError::DegenerateCurve)
}

impl SurvivalCurve {
    /// Builds a curve from steps computed elsewhere.
    ///
    /// Steps are sorted by time. Steps sharing a time are merged into one, keeping the
    /// lowest survival probability and summing the event and censoring counts.
    ///
    /// # Errors
    ///
    /// Returns a [`CurveError`] if `steps` is empty, a time is negative or not finite, a
    /// probability is outside `[0, 1]`, or the probability increases over time.
    ///
    /// # Examples
    ///
    /// ```
    /// # use approvals_stats::survival::{CurveStep, SurvivalCurve};
    /// let step = |time, survival_prob| CurveStep {
    ///     time,
    ///     survival_prob,
    ///     at_risk: 0,
    ///     events: 0,
    ///     censored: 0,
    /// };
    /// let curve = SurvivalCurve::from_steps(vec![step(30.0, 0.4), step(10.0, 0.8), step(30.0, 0.2)])
    ///     .unwrap();
    ///
    /// assert_eq!(curve.steps().len(), 2);
    /// assert_eq!(curve.survival_at(30.0), Some(0.2));
    /// ```
    pub fn from_steps(mut steps: Vec<CurveStep>) -> Result<Self, CurveError> {
        for step in &steps {
            if !step.time.is_finite() || step.time < 0.0 {
                return Err(CurveError::InvalidTime { time: step.time });
            }
            if !(0.0..=1.0).contains(&step.survival_prob) {
                return Err(CurveError::ProbabilityOutOfRange {
                    time: step.time,
                    survival_prob: step.survival_prob,
                });
            }
        }

        steps.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut merged: Vec<CurveStep> = Vec::with_capacity(steps.len());
        for step in steps {
            if let Some(last) = merged.last_mut() {
                if last.time.total_cmp(&step.time).is_eq() {
                    last.survival_prob = last.survival_prob.min(step.survival_prob);
                    last.at_risk = last.at_risk.max(step.at_risk);
                    last.events += step.events;
                    last.censored += step.censored;
                    continue;
                }
                if step.survival_prob > last.survival_prob {
                    return Err(CurveError::NotMonotone { time: step.time });
                }
            }
            merged.push(step);
        }

        if merged.is_empty() {
            return Err(CurveError::NoSteps);
        }
        Ok(Self { steps: merged })
    }

    /// Steps in ascending time order.
    #[must_use]
    pub fn steps(&self) -> &[CurveStep] {
        &self.steps
    }

    #[must_use]
    pub fn last_step(&self) -> &CurveStep {
        // non-empty by construction
        &self.steps[self.steps.len() - 1]
    }

    /// Largest time covered by the curve.
    #[must_use]
    pub fn max_time(&self) -> f64 {
        self.last_step().time
    }

    /// Survival probability at the largest time covered by the curve.
    #[must_use]
    pub fn final_survival(&self) -> f64 {
        self.last_step().survival_prob
    }

    /// Number of observations the curve was estimated from.
    #[must_use]
    pub fn subjects(&self) -> usize {
        self.steps[0].at_risk
    }

    /// Returns `false` if no approval was observed, in which case the curve is flat at `1.0`.
    #[must_use]
    pub fn has_events(&self) -> bool {
        self.steps.iter().any(|step| step.events > 0)
    }

    /// Returns the survival probability at a specific time.
    ///
    /// The curve is a right-continuous step function: the probability at `time` is that of
    /// the last step at or before `time`, or `1.0` before the first step.
    ///
    /// # Returns
    ///
    /// `None` if `time` is negative, NaN, or beyond [`max_time`](Self::max_time).
    ///
    /// # Examples
    ///
    /// ```
    /// # use approvals_stats::survival::{Observation, estimate};
    /// let cohort = [
    ///     Observation::new(10.0, true).unwrap(),
    ///     Observation::new(20.0, true).unwrap(),
    /// ];
    /// let curve = estimate(&cohort).unwrap();
    ///
    /// assert_eq!(curve.survival_at(5.0), Some(1.0)); // Before first step
    /// assert_eq!(curve.survival_at(15.0), Some(0.5));
    /// assert_eq!(curve.survival_at(25.0), None); // Beyond last step
    /// ```
    #[must_use]
    pub fn survival_at(&self, time: f64) -> Option<f64> {
        if time.is_nan() || time < 0.0 || time > self.max_time() {
            return None;
        }
        let idx = self.steps.partition_point(|step| step.time <= time);
        Some(if idx == 0 {
            1.0
        } else {
            self.steps[idx - 1].survival_prob
        })
    }

    /// Returns the curve as `(time, probability)` pairs for step-chart rendering.
    ///
    /// The implicit `(0, 1.0)` point is included unless the first step is at time zero.
    #[must_use]
    pub fn points(&self) -> Vec<(f64, f64)> {
        let mut points = Vec::with_capacity(self.steps.len() + 1);
        if self.steps[0].time > 0.0 {
            points.push((0.0, 1.0));
        }
        points.extend(self.steps.iter().map(|step| (step.time, step.survival_prob)));
        points
    }
}
