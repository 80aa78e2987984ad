//! Two-way fixed-effects event-study regression.
//!
//! Estimates `y = α_i + λ_t + Σ_k δ_k · 1{K_it = k} + ε` with unit and period
//! fixed effects absorbed by [`FixedEffectsSolver`] and cluster-robust
//! variances clustered by unit.
//!
//! # References
//!
//! - Angrist & Pischke, *Mostly Harmless Econometrics*, Ch. 5.
//! - Sun & Abraham (2021), "Estimating dynamic treatment effects in event
//!   studies with heterogeneous treatment effects." *Journal of Econometrics*.

use es_core::{Error, Result};
use nalgebra::{DMatrix, DVector};

use super::cluster::cluster_robust_se;
use super::hdfe::FixedEffectsSolver;

/// Relative-time window of the lead/lag indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    /// Most negative relative time with its own indicator.
    pub min: i64,
    /// Most positive relative time with its own indicator.
    pub max: i64,
    /// Omitted (normalized to zero) relative time.
    pub reference: i64,
}

impl EventWindow {
    /// Window `[-max_lead, max_lag]` with the given omitted relative time.
    pub fn new(max_lead: i64, max_lag: i64, reference: i64) -> Self {
        Self { min: -max_lead, max: max_lag, reference }
    }

    fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(Error::Validation(format!(
                "event window min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if self.reference < self.min || self.reference > self.max {
            return Err(Error::Validation(format!(
                "reference period {} outside event window [{}, {}]",
                self.reference, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Result of the event-study regression.
#[derive(Debug, Clone)]
pub struct EventStudyResult {
    /// Relative times that received an indicator, ascending.
    pub relative_times: Vec<i64>,
    /// Point estimates, one per relative time.
    pub coefficients: Vec<f64>,
    /// Cluster-robust standard errors, one per relative time.
    pub se_cluster: Vec<f64>,
    /// Number of observations.
    pub n_obs: usize,
    /// Number of clusters.
    pub n_clusters: usize,
    /// Reference (omitted) relative time.
    pub reference_period: i64,
    /// Window relative times dropped because no observation carried them.
    pub dropped: Vec<i64>,
}

impl EventStudyResult {
    /// Sampling variances (`se²`).
    pub fn variances(&self) -> Vec<f64> {
        self.se_cluster.iter().map(|s| s * s).collect()
    }

    /// `(relative_time, estimate, variance)` triples.
    pub fn points(&self) -> impl Iterator<Item = (i64, f64, f64)> + '_ {
        self.relative_times
            .iter()
            .zip(&self.coefficients)
            .zip(&self.se_cluster)
            .map(|((&k, &b), &s)| (k, b, s * s))
    }
}

/// Event-study regression with leads and lags.
///
/// # Arguments
///
/// - `y` — outcome (length n).
/// - `unit_ids`, `time_ids` — fixed-effect identifiers (length n).
/// - `relative_time` — `Some(t - E_i)` for eventually-treated units, `None`
///   for never-treated units. `None` rows and rows outside `window` get all
///   indicators zero.
/// - `window` — indicator range and omitted reference period.
/// - `cluster_ids` — clustering variable for robust SE (typically the unit).
///
/// Window relative times that no row carries are dropped from the design
/// and reported in [`EventStudyResult::dropped`].
pub fn event_study(
    y: &[f64],
    unit_ids: &[u64],
    time_ids: &[u64],
    relative_time: &[Option<i64>],
    window: EventWindow,
    cluster_ids: &[u64],
) -> Result<EventStudyResult> {
    let n = y.len();
    if n == 0 {
        return Err(Error::Validation("y must be non-empty".into()));
    }
    if unit_ids.len() != n
        || time_ids.len() != n
        || relative_time.len() != n
        || cluster_ids.len() != n
    {
        return Err(Error::Validation("all input arrays must have length n".into()));
    }
    window.validate()?;

    let candidates: Vec<i64> = (window.min..=window.max).filter(|&k| k != window.reference).collect();
    let mut counts = vec![0usize; candidates.len()];
    for k in relative_time.iter().flatten() {
        if let Ok(pos) = candidates.binary_search(k) {
            counts[pos] += 1;
        }
    }
    let (rel_times, dropped): (Vec<i64>, Vec<i64>) = {
        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        for (&k, &c) in candidates.iter().zip(&counts) {
            if c > 0 { kept.push(k) } else { dropped.push(k) }
        }
        (kept, dropped)
    };
    if !dropped.is_empty() {
        log::debug!("event study: no observations at relative times {dropped:?}, dropped");
    }
    let p = rel_times.len();
    if p == 0 {
        return Err(Error::Computation(format!(
            "no observations inside event window [{}, {}]",
            window.min, window.max
        )));
    }

    let mut indicators: Vec<Vec<f64>> = vec![vec![0.0; n]; p];
    for (i, rt) in relative_time.iter().enumerate() {
        if let Some(pos) = rt.and_then(|k| rel_times.binary_search(&k).ok()) {
            indicators[pos][i] = 1.0;
        }
    }

    let hdfe = FixedEffectsSolver::from_ids(&[unit_ids, time_ids])?;
    let y_dm = hdfe.partial_out(y)?;
    let mut x_mat = DMatrix::zeros(n, p);
    for (j, col) in indicators.iter().enumerate() {
        let col_dm = hdfe.partial_out(col)?;
        x_mat.set_column(j, &DVector::from_vec(col_dm));
    }
    let y_vec = DVector::from_vec(y_dm);

    let xtx = x_mat.transpose() * &x_mat;
    let xty = x_mat.transpose() * &y_vec;
    let xtx_inv = xtx.try_inverse().ok_or_else(|| {
        Error::Computation(
            "X'X singular in event study OLS (relative-time indicators collinear with fixed effects)"
                .into(),
        )
    })?;
    let beta = &xtx_inv * &xty;
    let resid = &y_vec - &x_mat * &beta;

    let df_absorbed = hdfe.degrees_of_freedom_absorbed();
    let se_cluster = cluster_robust_se(&x_mat, &resid, &xtx_inv, cluster_ids, df_absorbed)?;

    let mut clusters = cluster_ids.to_vec();
    clusters.sort_unstable();
    clusters.dedup();

    Ok(EventStudyResult {
        relative_times: rel_times,
        coefficients: beta.iter().copied().collect(),
        se_cluster,
        n_obs: n,
        n_clusters: clusters.len(),
        reference_period: window.reference,
        dropped,
    })
}
