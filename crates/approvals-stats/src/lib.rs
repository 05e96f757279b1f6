//! Time-to-approval statistics for regulatory milestones.
//!
//! This crate is the numerical core of the project. It has no I/O and only pure
//! functions over immutable inputs:
//!
//! - **Survival estimation**: Kaplan-Meier estimator producing the probability of
//!   "no approval yet" as a function of elapsed days, from right-censored data
//! - **Threshold lookup**: first day at which the cumulative approval probability reaches
//!   a given percentile
//!
//! # Modules
//!
//! - [`survival`]: Observations, survival curves and the Kaplan-Meier estimator
//! - [`threshold`]: Percentiles and first-crossing lookup on survival curves
//!
//! # Examples
//!
//! ```
//! use approvals_stats::{
//!     survival::{Observation, estimate},
//!     threshold::{Percentile, ThresholdStatus, locate_all},
//! };
//!
//! // (days since submission, approved)
//! let data = [(25.0, true), (30.0, true), (45.0, true)];
//! let cohort = data
//!     .iter()
//!     .map(|&(days, approved)| Observation::new(days, approved))
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//!
//! let curve = estimate(&cohort).unwrap();
//! let thresholds = locate_all(&curve, &Percentile::DECILES);
//!
//! assert_eq!(thresholds[0].status, ThresholdStatus::Reached);
//! assert_eq!(thresholds[0].days, 25);
//! assert_eq!(thresholds[6].days, 45); // 70%
//! ```

pub mod survival;
pub mod threshold;
