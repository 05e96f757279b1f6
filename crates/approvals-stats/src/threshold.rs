//! Percentile threshold lookup on survival curves.
//!
//! For a cumulative-approval percentile `p`, the threshold is the first curve step whose
//! survival probability is at or below `(100 - p) / 100`.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::survival::SurvivalCurve;

/// Cumulative approval percentile, an integer in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Percentile(u8);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PercentileError {
    #[display("percentile must be an integer, got {value:?}")]
    NotAnInteger { value: String },
    #[display("percentile must be within 1..=100, got {value}")]
    OutOfRange { value: u64 },
}

impl Percentile {
    pub const MEDIAN: Self = Self(50);

    /// The ten deciles 10%, 20%, ..., 100%.
    pub const DECILES: [Self; 10] = [
        Self(10),
        Self(20),
        Self(30),
        Self(40),
        Self(50),
        Self(60),
        Self(70),
        Self(80),
        Self(90),
        Self(100),
    ];

    pub fn new(value: u8) -> Result<Self, PercentileError> {
        if (1..=100).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PercentileError::OutOfRange {
                value: u64::from(value),
            })
        }
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Survival probability that must be reached or undercut.
    #[must_use]
    pub fn target_survival(self) -> f64 {
        f64::from(100 - self.0) / 100.0
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for Percentile {
    type Err = PercentileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = s
            .strip_suffix('%')
            .unwrap_or(s)
            .parse::<u64>()
            .map_err(|_| PercentileError::NotAnInteger {
                value: s.to_owned(),
            })?;
        u8::try_from(value)
            .map_err(|_| PercentileError::OutOfRange { value })
            .and_then(Self::new)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThresholdStatus {
    Reached,
    NotReached,
}

/// Outcome of a percentile lookup.
///
/// When the percentile is reached, `time` is the first step at which it is reached. When it
/// is not, `time` is the largest time of the curve and `attained_probability` tells how far
/// the curve got.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdResult {
    pub percentile: Percentile,
    pub status: ThresholdStatus,
    /// Step time, in days.
    pub time: f64,
    /// `time` truncated to whole days.
    pub days: u64,
    /// Cumulative approval probability at `time`, in percent.
    pub attained_probability: f64,
}

/// Finds the first time at which the cumulative approval probability reaches `percentile`.
///
/// Earliest-crossing semantics: the first step whose survival probability is at or below
/// the target is returned, never a later or a closer one.
///
/// # Examples
///
/// ```
/// # use approvals_stats::{survival::{Observation, estimate}, threshold::{Percentile, locate}};
/// let cohort = [
///     Observation::new(40.0, true).unwrap(),
///     Observation::new(55.0, false).unwrap(),
/// ];
/// let curve = estimate(&cohort).unwrap();
///
/// let half = locate(&curve, Percentile::new(50).unwrap());
/// assert!(half.status.is_reached());
/// assert_eq!(half.days, 40);
///
/// let sixty = locate(&curve, Percentile::new(60).unwrap());
/// assert!(sixty.status.is_not_reached());
/// assert_eq!(sixty.days, 55);
/// assert_eq!(sixty.attained_probability, 50.0);
/// ```
// Absorbs rounding in the running Kaplan-Meier product, so S landing on a target counts
const CROSSING_TOLERANCE: f64 = 1e-12;

#[must_use]
pub fn locate(curve: &SurvivalCurve, percentile: Percentile) -> ThresholdResult {
    let target = percentile.target_survival();
    let steps = curve.steps();

    // survival probabilities are non-increasing, so the predicate is partitioned
    let idx = steps.partition_point(|step| step.survival_prob > target + CROSSING_TOLERANCE);
    let (status, step) = match steps.get(idx) {
        Some(step) => (ThresholdStatus::Reached, step),
        None => (ThresholdStatus::NotReached, curve.last_step()),
    };

    ThresholdResult {
        percentile,
        status,
        time: step.time,
        days: whole_days(step.time),
        attained_probability: (1.0 - step.survival_prob) * 100.0,
    }
}

/// Locates each percentile on the same curve.
#[must_use]
pub fn locate_all(curve: &SurvivalCurve, percentiles: &[Percentile]) -> Vec<ThresholdResult> {
    percentiles.iter().map(|&p| locate(curve, p)).collect()
}

impl SurvivalCurve {
    /// Returns the first time at which half of the cohort is estimated to be approved.
    ///
    /// # Examples
    ///
    /// ```
    /// # use approvals_stats::survival::{Observation, estimate};
    /// let cohort = [
    ///     Observation::new(10.0, true).unwrap(),
    ///     Observation::new(20.0, true).unwrap(),
    ///     Observation::new(30.0, false).unwrap(),
    /// ];
    /// let curve = estimate(&cohort).unwrap();
    /// assert_eq!(curve.median_time(), Some(20.0));
    /// ```
    #[must_use]
    pub fn median_time(&self) -> Option<f64> {
        let result = locate(self, Percentile::MEDIAN);
        result.status.is_reached().then_some(result.time)
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_days(time: f64) -> u64 {
    time.trunc() as u64
}
