//! Econometrics for the in-house estimator.
//!
//! This module provides:
//! - **HDFE absorption** of unit and period fixed effects by alternating
//!   projections.
//! - **Cluster-robust standard errors** (Liang–Zeger sandwich).
//! - **Event-study OLS** on lead/lag indicators with two-way fixed effects.

pub mod cluster;
pub mod event_study;
pub mod hdfe;

pub use cluster::cluster_robust_se;
pub use event_study::{EventStudyResult, EventWindow, event_study};
pub use hdfe::{FixedEffectsSolver, dense_levels};
