//! # es-inference
//!
//! Estimation side of EventSim.
//!
//! This crate provides:
//! - the in-house two-way fixed-effects event-study regression (HDFE
//!   absorption + cluster-robust variance),
//! - adapters that feed pre-computed output of external estimation packages
//!   into the same pipeline,
//! - a sequential runner that times each estimator and isolates failures.
//!
//! ## Architecture
//!
//! Estimators implement [`es_core::Estimator`] over an
//! [`es_sim::Panel`]; nothing here depends on how their output is later
//! aligned or drawn.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Fixed-effects absorption, cluster-robust variance and the event-study OLS.
pub mod econometrics;
/// Estimator implementations over a simulated panel.
pub mod estimators;
/// Sequential estimator runner with per-estimator isolation.
pub mod runner;

pub use econometrics::{
    EventStudyResult, EventWindow, FixedEffectsSolver, cluster_robust_se, event_study,
};
pub use estimators::{PrecomputedEstimates, TwfeEventStudy};
pub use runner::{EstimatorFailure, EstimatorRun, StageTiming, run_estimators};
