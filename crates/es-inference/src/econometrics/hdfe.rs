//! High-dimensional fixed effects (HDFE) absorption by the method of
//! alternating projections (MAP).
//!
//! Each sweep subtracts the group means of every FE dimension in turn; the
//! sweeps repeat until no group mean exceeds the tolerance. A single FE
//! dimension is exact after one sweep, and so is a balanced two-way panel.
//!
//! # References
//!
//! - Gaure (2013), "OLS with multiple high dimensional category variables."
//!   *Computational Statistics & Data Analysis*.
//! - Correia (2017), "Linear Models with High-Dimensional Fixed Effects:
//!   An Efficient and Feasible Estimator." Working paper.

use std::collections::HashMap;

use es_core::{Error, Result};

/// Default convergence tolerance (L∞ norm of group means).
const DEFAULT_TOL: f64 = 1e-10;

/// Safety bound on MAP sweeps.
const DEFAULT_MAX_SWEEPS: usize = 5_000;

/// Absorbs one or more categorical fixed effects from column vectors.
///
/// Each dimension maps observation `i` to a dense 0-based level.
#[derive(Debug, Clone)]
pub struct FixedEffectsSolver {
    n: usize,
    /// `levels[d][i]` = level of observation `i` in dimension `d`.
    levels: Vec<Vec<usize>>,
    /// `members[d][g]` = observations in level `g` of dimension `d`.
    members: Vec<Vec<Vec<usize>>>,
    tol: f64,
    max_sweeps: usize,
}

/// Map arbitrary ids to dense 0-based levels in order of first appearance.
pub fn dense_levels(ids: &[u64]) -> Vec<usize> {
    let mut seen: HashMap<u64, usize> = HashMap::new();
    ids.iter()
        .map(|&id| {
            let next = seen.len();
            *seen.entry(id).or_insert(next)
        })
        .collect()
}

impl FixedEffectsSolver {
    /// Build a solver from dense level vectors, one per FE dimension.
    pub fn new(levels: Vec<Vec<usize>>) -> Result<Self> {
        let n = match levels.first() {
            None => return Err(Error::Validation("at least one FE dimension required".into())),
            Some(first) => first.len(),
        };
        if n == 0 {
            return Err(Error::Validation("fixed effects need at least one observation".into()));
        }
        if let Some((d, dim)) = levels.iter().enumerate().find(|(_, dim)| dim.len() != n) {
            return Err(Error::Validation(format!(
                "FE dimension {d} has {} observations, expected {n}",
                dim.len()
            )));
        }

        let members = levels
            .iter()
            .map(|dim| {
                let n_levels = dim.iter().copied().max().map_or(0, |m| m + 1);
                let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n_levels];
                for (i, &g) in dim.iter().enumerate() {
                    groups[g].push(i);
                }
                groups
            })
            .collect();

        Ok(Self { n, levels, members, tol: DEFAULT_TOL, max_sweeps: DEFAULT_MAX_SWEEPS })
    }

    /// Build a solver from raw (possibly sparse) ids per dimension.
    pub fn from_ids(dims: &[&[u64]]) -> Result<Self> {
        Self::new(dims.iter().map(|ids| dense_levels(ids)).collect())
    }

    /// Set the convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the maximum number of sweeps.
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.n
    }

    /// Number of levels per FE dimension.
    pub fn n_levels(&self) -> Vec<usize> {
        self.members.iter().map(Vec::len).collect()
    }

    /// Residual of `v` after removing all fixed effects.
    pub fn partial_out(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.n {
            return Err(Error::Validation(format!(
                "vector has {} entries, solver expects {}",
                v.len(),
                self.n
            )));
        }

        let mut resid = v.to_vec();
        for sweep in 0..self.max_sweeps {
            for d in 0..self.members.len() {
                self.demean(&mut resid, d);
            }
            if self.members.len() == 1 || self.max_abs_group_mean(&resid) < self.tol {
                log::trace!("MAP converged after {} sweep(s)", sweep + 1);
                return Ok(resid);
            }
        }

        log::warn!(
            "MAP did not converge in {} sweeps (max group mean {:.3e})",
            self.max_sweeps,
            self.max_abs_group_mean(&resid)
        );
        Ok(resid)
    }

    /// Degrees of freedom absorbed by the fixed effects.
    ///
    /// One dimension: `levels - 1`. Two dimensions: `levels_0 + levels_1 -
    /// components`, with the connected components of the bipartite level
    /// graph counted exactly. More dimensions: `Σ levels - 1`.
    pub fn degrees_of_freedom_absorbed(&self) -> usize {
        let levels = self.n_levels();
        let total: usize = levels.iter().sum();
        match levels.len() {
            1 => total.saturating_sub(1),
            2 => total.saturating_sub(self.connected_components()),
            _ => total.saturating_sub(1),
        }
    }

    fn demean(&self, v: &mut [f64], d: usize) {
        for group in &self.members[d] {
            if group.is_empty() {
                continue;
            }
            let mean = group.iter().map(|&i| v[i]).sum::<f64>() / group.len() as f64;
            for &i in group {
                v[i] -= mean;
            }
        }
    }

    fn max_abs_group_mean(&self, v: &[f64]) -> f64 {
        self.members
            .iter()
            .flatten()
            .filter(|group| !group.is_empty())
            .map(|group| (group.iter().map(|&i| v[i]).sum::<f64>() / group.len() as f64).abs())
            .fold(0.0, f64::max)
    }

    /// Components of the bipartite graph linking levels of dims 0 and 1.
    fn connected_components(&self) -> usize {
        let n0 = self.members[0].len();
        let n1 = self.members[1].len();
        let mut parent: Vec<usize> = (0..n0 + n1).collect();

        for i in 0..self.n {
            let a = find(&mut parent, self.levels[0][i]);
            let b = find(&mut parent, n0 + self.levels[1][i]);
            if a != b {
                parent[a] = b;
            }
        }

        let used = (0..n0)
            .filter(|&g| !self.members[0][g].is_empty())
            .chain((0..n1).filter(|&g| !self.members[1][g].is_empty()).map(|g| n0 + g))
            .collect::<Vec<_>>();
        let mut roots: Vec<usize> = used.into_iter().map(|node| find(&mut parent, node)).collect();
        roots.sort_unstable();
        roots.dedup();
        roots.len()
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_levels_follow_first_appearance() {
        assert_eq!(dense_levels(&[7, 3, 7, 9, 3]), vec![0, 1, 0, 2, 1]);
    }

    #[test]
    fn one_way_is_group_demeaning() {
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 0, 1, 1, 1]]).unwrap();
        let r = solver.partial_out(&[1.0, 2.0, 3.0, 10.0, 20.0, 30.0]).unwrap();
        let expected = [-1.0, 0.0, 1.0, -10.0, 0.0, 10.0];
        for (got, want) in r.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn two_way_additive_effects_vanish() {
        // y = unit effect + period effect, 3 units × 4 periods
        let units: Vec<u64> = (1..=3).flat_map(|i| std::iter::repeat(i).take(4)).collect();
        let periods: Vec<u64> = (0..3).flat_map(|_| 1..=4).collect();
        let y: Vec<f64> =
            units.iter().zip(&periods).map(|(&i, &t)| 5.0 * i as f64 + 2.0 * t as f64).collect();

        let solver = FixedEffectsSolver::from_ids(&[&units, &periods]).unwrap();
        let r = solver.partial_out(&y).unwrap();
        assert!(r.iter().all(|v| v.abs() < 1e-9), "residuals {r:?}");
    }

    #[test]
    fn unbalanced_two_way_group_means_are_zero() {
        let entity = vec![0, 0, 0, 1, 1];
        let time = vec![0, 1, 2, 1, 2];
        let solver = FixedEffectsSolver::new(vec![entity, time]).unwrap();
        let r = solver.partial_out(&[10.0, 20.0, 30.0, 25.0, 35.0]).unwrap();

        assert!(((r[0] + r[1] + r[2]) / 3.0).abs() < 1e-8);
        assert!(((r[3] + r[4]) / 2.0).abs() < 1e-8);
        assert!(((r[1] + r[3]) / 2.0).abs() < 1e-8);
        assert!(((r[2] + r[4]) / 2.0).abs() < 1e-8);
    }

    #[test]
    fn absorbed_degrees_of_freedom() {
        let one_way = FixedEffectsSolver::new(vec![vec![0, 0, 1, 1, 2, 2]]).unwrap();
        assert_eq!(one_way.degrees_of_freedom_absorbed(), 2);

        let entity = vec![0, 0, 0, 1, 1, 1];
        let time = vec![0, 1, 2, 0, 1, 2];
        let connected = FixedEffectsSolver::new(vec![entity, time]).unwrap();
        assert_eq!(connected.degrees_of_freedom_absorbed(), 2 + 3 - 1);

        let split = FixedEffectsSolver::new(vec![vec![0, 0, 1, 1], vec![0, 1, 2, 3]]).unwrap();
        assert_eq!(split.degrees_of_freedom_absorbed(), 2 + 4 - 2);
    }

    #[test]
    fn validation_errors() {
        assert!(FixedEffectsSolver::new(vec![]).is_err());
        assert!(FixedEffectsSolver::new(vec![vec![]]).is_err());
        assert!(FixedEffectsSolver::new(vec![vec![0, 1], vec![0]]).is_err());

        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 1, 1]]).unwrap();
        assert!(solver.partial_out(&[1.0]).is_err());
    }
}
