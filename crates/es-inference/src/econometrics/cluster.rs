//! Cluster-robust (Liang–Zeger) variance for fixed-effects OLS.

use std::collections::BTreeMap;

use es_core::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// Liang–Zeger cluster-robust standard errors.
///
/// `V_CR = c · (X'X)⁻¹ B (X'X)⁻¹` with `B = Σ_g X_g' e_g e_g' X_g` and the
/// small-sample factor `c = G/(G-1) · (N-1)/(N-K)`, where
/// `K = p + df_absorbed` counts the fixed-effect levels swept out of `X`
/// before the fit. Without the absorbed term the correction understates the
/// parameter count and the SEs come out too small.
pub fn cluster_robust_se(
    x: &DMatrix<f64>,
    residuals: &DVector<f64>,
    xtx_inv: &DMatrix<f64>,
    cluster_ids: &[u64],
    df_absorbed: usize,
) -> Result<Vec<f64>> {
    let n = x.nrows();
    let p = x.ncols();
    if residuals.len() != n || cluster_ids.len() != n {
        return Err(Error::Validation(format!(
            "cluster SE: X has {n} rows but {} residuals and {} cluster ids",
            residuals.len(),
            cluster_ids.len()
        )));
    }
    if xtx_inv.nrows() != p || xtx_inv.ncols() != p {
        return Err(Error::Validation(format!(
            "cluster SE: (X'X)^-1 is {}x{}, expected {p}x{p}",
            xtx_inv.nrows(),
            xtx_inv.ncols()
        )));
    }

    // Per-cluster scores s_g = X_g' e_g, keyed in id order.
    let mut scores: BTreeMap<u64, DVector<f64>> = BTreeMap::new();
    for (i, &cid) in cluster_ids.iter().enumerate() {
        let s_g = scores.entry(cid).or_insert_with(|| DVector::zeros(p));
        let e_i = residuals[i];
        for j in 0..p {
            s_g[j] += x[(i, j)] * e_i;
        }
    }
    let g = scores.len() as f64;

    let mut meat = DMatrix::zeros(p, p);
    for s_g in scores.values() {
        meat += s_g * s_g.transpose();
    }

    let n_f = n as f64;
    let k_f = (p + df_absorbed) as f64;
    let correction =
        if g > 1.0 && n_f > k_f { (g / (g - 1.0)) * ((n_f - 1.0) / (n_f - k_f)) } else { 1.0 };

    let vcr = (xtx_inv * &meat) * xtx_inv * correction;
    Ok((0..p).map(|j| vcr[(j, j)].max(0.0).sqrt()).collect())
}
