//! Balanced panel generation.
//!
//! Rows are stored column-wise, unit-major and period-minor: row
//! `(i - 1) * T + (t - 1)` holds unit `i` at period `t`.

use std::collections::BTreeMap;

use es_core::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Serialize;

use crate::config::{OutcomeModel, SimConfig};

/// Offset separating the adoption stream from the noise stream.
const DESIGN_STREAM_OFFSET: u64 = 0x5A5A_5A5A;

/// One panel row, shaped for tabular export.
///
/// `gvar` repeats the adoption period with `0` standing in for never-treated
/// units, the sentinel several estimation packages expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelRow {
    /// Unit id.
    pub i: u64,
    /// Calendar period.
    pub t: u64,
    /// Adoption period (`None` for never-treated units).
    #[serde(rename = "Ei")]
    pub ei: Option<u64>,
    /// Relative time `t - Ei`.
    #[serde(rename = "K")]
    pub k: Option<i64>,
    /// Treatment indicator.
    #[serde(rename = "D")]
    pub d: u8,
    /// Outcome.
    #[serde(rename = "Y")]
    pub y: f64,
    /// Adoption period with `0` for never treated.
    pub gvar: u64,
}

/// A generated balanced panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    n_units: usize,
    n_periods: usize,
    outcome_model: OutcomeModel,
    unit: Vec<u64>,
    period: Vec<u64>,
    adoption: Vec<Option<u64>>,
    relative_time: Vec<Option<i64>>,
    treated: Vec<u8>,
    outcome: Vec<f64>,
}

/// Generate a panel from `config`.
///
/// Adoption periods are drawn once per unit before any row exists, then
/// copied onto every row of that unit; one standard-normal noise draw follows
/// per row in storage order, from its own stream.
pub fn generate(config: &SimConfig) -> Result<Panel> {
    config.validate()?;
    config.warn_on_weak_design();

    let mut design_rng =
        StdRng::seed_from_u64(config.effective_design_seed().wrapping_add(DESIGN_STREAM_OFFSET));
    let adoption = draw_adoption(config, &mut design_rng);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let n_units = config.n_units;
    let n_periods = config.n_periods;
    let model = config.outcome;
    let n = n_units * n_periods;

    let mut panel = Panel {
        n_units,
        n_periods,
        outcome_model: model,
        unit: Vec::with_capacity(n),
        period: Vec::with_capacity(n),
        adoption: Vec::with_capacity(n),
        relative_time: Vec::with_capacity(n),
        treated: Vec::with_capacity(n),
        outcome: Vec::with_capacity(n),
    };

    for (idx, &ei) in adoption.iter().enumerate() {
        let i = idx as u64 + 1;
        for t in 1..=n_periods as u64 {
            let k = ei.map(|e| t as i64 - e as i64);
            let d = u8::from(matches!(k, Some(k) if k >= 0));
            let eps: f64 = rng.sample(StandardNormal);
            let effect = if d == 1 { model.treatment_effect(t) } else { 0.0 };
            let y = model.baseline(i, t) + effect + model.noise_sd * eps;

            panel.unit.push(i);
            panel.period.push(t);
            panel.adoption.push(ei);
            panel.relative_time.push(k);
            panel.treated.push(d);
            panel.outcome.push(y);
        }
    }

    log::debug!(
        "generated panel: {} units x {} periods, {} treated rows",
        n_units,
        n_periods,
        panel.n_treated_rows()
    );
    Ok(panel)
}

fn draw_adoption(config: &SimConfig, rng: &mut StdRng) -> Vec<Option<u64>> {
    let window = config.window();
    let share = config.never_treated_share;
    (0..config.n_units)
        .map(|_| {
            // Only consume a draw when never-treated units are requested, so
            // the default stream does not depend on this feature.
            if share > 0.0 && rng.random_bool(share) {
                None
            } else {
                Some(rng.random_range(window.first..=window.last))
            }
        })
        .collect()
}

impl Panel {
    /// Number of units `I`.
    pub fn n_units(&self) -> usize {
        self.n_units
    }

    /// Number of periods `T`.
    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    /// Number of rows (`I * T`).
    pub fn len(&self) -> usize {
        self.outcome.len()
    }

    /// True for a panel without rows (never produced by [`generate`]).
    pub fn is_empty(&self) -> bool {
        self.outcome.is_empty()
    }

    /// Outcome model the panel was drawn from.
    pub fn outcome_model(&self) -> &OutcomeModel {
        &self.outcome_model
    }

    /// Unit id per row.
    pub fn units(&self) -> &[u64] {
        &self.unit
    }

    /// Calendar period per row.
    pub fn periods(&self) -> &[u64] {
        &self.period
    }

    /// Adoption period per row.
    pub fn adoption(&self) -> &[Option<u64>] {
        &self.adoption
    }

    /// Relative time per row.
    pub fn relative_time(&self) -> &[Option<i64>] {
        &self.relative_time
    }

    /// Treatment indicator per row.
    pub fn treated(&self) -> &[u8] {
        &self.treated
    }

    /// Outcome per row.
    pub fn outcome(&self) -> &[f64] {
        &self.outcome
    }

    /// Number of treated rows.
    pub fn n_treated_rows(&self) -> usize {
        self.treated.iter().filter(|&&d| d == 1).count()
    }

    /// Adoption period of each unit, indexed by `i - 1`.
    pub fn unit_adoption(&self) -> Vec<Option<u64>> {
        self.adoption.iter().step_by(self.n_periods).copied().collect()
    }

    /// Row view at storage index `row`.
    pub fn row(&self, row: usize) -> Option<PanelRow> {
        let y = *self.outcome.get(row)?;
        let ei = self.adoption[row];
        Some(PanelRow {
            i: self.unit[row],
            t: self.period[row],
            ei,
            k: self.relative_time[row],
            d: self.treated[row],
            y,
            gvar: ei.unwrap_or(0),
        })
    }

    /// Iterate over all rows in storage order.
    pub fn rows(&self) -> impl Iterator<Item = PanelRow> + '_ {
        (0..self.len()).filter_map(move |r| self.row(r))
    }

    /// True average treatment effect per relative time.
    ///
    /// Averages the treatment-effect function over exactly the treated rows
    /// with `K == h`, for every `h` observed among treated rows. The noise
    /// never enters: redrawing the noise seed over the same design leaves the
    /// curve unchanged.
    pub fn ground_truth(&self) -> BTreeMap<i64, f64> {
        let mut acc: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
        for r in 0..self.len() {
            if self.treated[r] != 1 {
                continue;
            }
            if let Some(k) = self.relative_time[r] {
                let entry = acc.entry(k).or_insert((0.0, 0));
                entry.0 += self.outcome_model.treatment_effect(self.period[r]);
                entry.1 += 1;
            }
        }
        acc.into_iter().map(|(k, (sum, n))| (k, sum / n as f64)).collect()
    }

    /// Re-check the structural invariants of the panel.
    ///
    /// * the panel is balanced and rows are unit-major,
    /// * `Ei` is constant within a unit,
    /// * `K` is defined iff `Ei` is, and equals `t - Ei`,
    /// * `D = 1` iff `Ei` is defined and `t >= Ei`.
    pub fn validate(&self) -> Result<()> {
        let n = self.n_units * self.n_periods;
        let cols = [
            self.unit.len(),
            self.period.len(),
            self.adoption.len(),
            self.relative_time.len(),
            self.treated.len(),
            self.outcome.len(),
        ];
        if cols.iter().any(|&len| len != n) {
            return Err(Error::Validation(format!("panel columns must all have {n} rows")));
        }

        for r in 0..n {
            let i = (r / self.n_periods) as u64 + 1;
            let t = (r % self.n_periods) as u64 + 1;
            if self.unit[r] != i || self.period[r] != t {
                return Err(Error::Validation(format!("row {r} is out of unit-major order")));
            }
            let first_of_unit = r - (r % self.n_periods);
            if self.adoption[r] != self.adoption[first_of_unit] {
                return Err(Error::Validation(format!("adoption period varies within unit {i}")));
            }
            let expected_k = self.adoption[r].map(|e| t as i64 - e as i64);
            if self.relative_time[r] != expected_k {
                return Err(Error::Validation(format!("relative time mismatch at unit {i}, t={t}")));
            }
            let expected_d = u8::from(matches!(self.adoption[r], Some(e) if t >= e));
            if self.treated[r] != expected_d {
                return Err(Error::Validation(format!("treatment flag mismatch at unit {i}, t={t}")));
            }
        }
        Ok(())
    }
}
