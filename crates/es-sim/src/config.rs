//! Simulation configuration and validation.

use es_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of contiguous adoption periods in the default window (`T-6 ..= T`).
pub const DEFAULT_WINDOW_WIDTH: u64 = 7;

/// Inclusive range of calendar periods from which adoption dates are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdoptionWindow {
    /// Earliest adoption period.
    pub first: u64,
    /// Latest adoption period.
    pub last: u64,
}

impl AdoptionWindow {
    /// Create a window `first ..= last`.
    pub fn new(first: u64, last: u64) -> Self {
        Self { first, last }
    }

    /// The `width` periods ending at `n_periods`, clamped at period 1.
    pub fn trailing(n_periods: u64, width: u64) -> Self {
        let first = (n_periods + 1).saturating_sub(width).max(1);
        Self { first, last: n_periods }
    }

    /// Number of periods in the window.
    pub fn width(&self) -> u64 {
        self.last.saturating_sub(self.first) + 1
    }

    /// True when `t` lies inside the window.
    pub fn contains(&self, t: u64) -> bool {
        (self.first..=self.last).contains(&t)
    }
}

/// Coefficients of the additive outcome model
/// `Y = unit_effect * i + time_trend * t + tau(t) * D + noise_sd * eps`
/// with `tau(t) = effect_slope * t + effect_intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutcomeModel {
    /// Slope of the unit fixed effect in the unit id.
    pub unit_effect: f64,
    /// Slope of the common linear time trend.
    pub time_trend: f64,
    /// Slope of the treatment effect in calendar time.
    pub effect_slope: f64,
    /// Intercept of the treatment effect.
    pub effect_intercept: f64,
    /// Standard deviation of the idiosyncratic noise.
    pub noise_sd: f64,
}

impl Default for OutcomeModel {
    fn default() -> Self {
        Self {
            unit_effect: 1.0,
            time_trend: 3.0,
            effect_slope: 1.0,
            effect_intercept: -12.5,
            noise_sd: 1.0,
        }
    }
}

impl OutcomeModel {
    /// Treatment effect at calendar period `t`. Pure in `t`.
    pub fn treatment_effect(&self, t: u64) -> f64 {
        self.effect_slope * t as f64 + self.effect_intercept
    }

    /// Noise-free untreated outcome for unit `i` at period `t`.
    pub fn baseline(&self, i: u64, t: u64) -> f64 {
        self.unit_effect * i as f64 + self.time_trend * t as f64
    }

    fn validate(&self) -> Result<()> {
        let coefs = [
            ("unit_effect", self.unit_effect),
            ("time_trend", self.time_trend),
            ("effect_slope", self.effect_slope),
            ("effect_intercept", self.effect_intercept),
        ];
        for (name, v) in coefs {
            if !v.is_finite() {
                return Err(Error::InvalidConfiguration(format!("{name} must be finite, got {v}")));
            }
        }
        if !self.noise_sd.is_finite() || self.noise_sd < 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "noise_sd must be finite and >= 0, got {}",
                self.noise_sd
            )));
        }
        Ok(())
    }
}

/// Full simulation configuration.
///
/// `seed` has no default: every panel is tied to an explicit seed. Adoption
/// periods come from a separate stream keyed by `design_seed` (falling back
/// to `seed`), so the noise can be redrawn over a fixed cohort layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Number of units `I`.
    #[serde(default = "default_units")]
    pub n_units: usize,
    /// Number of periods `T`.
    #[serde(default = "default_periods")]
    pub n_periods: usize,
    /// Seed of the noise stream.
    pub seed: u64,
    /// Seed of the adoption stream; `None` reuses `seed`.
    #[serde(default)]
    pub design_seed: Option<u64>,
    /// Adoption window; `None` means the trailing default window.
    #[serde(default)]
    pub adoption: Option<AdoptionWindow>,
    /// Share of units that are never treated, in `[0, 1]`.
    #[serde(default)]
    pub never_treated_share: f64,
    /// Outcome model coefficients.
    #[serde(default)]
    pub outcome: OutcomeModel,
}

fn default_units() -> usize {
    300
}

fn default_periods() -> usize {
    15
}

impl SimConfig {
    /// Configuration with the reference outcome model and default window.
    pub fn new(n_units: usize, n_periods: usize, seed: u64) -> Self {
        Self {
            n_units,
            n_periods,
            seed,
            design_seed: None,
            adoption: None,
            never_treated_share: 0.0,
            outcome: OutcomeModel::default(),
        }
    }

    /// Set an explicit adoption window.
    pub fn with_adoption(mut self, window: AdoptionWindow) -> Self {
        self.adoption = Some(window);
        self
    }

    /// Pin the adoption stream to its own seed.
    pub fn with_design_seed(mut self, design_seed: u64) -> Self {
        self.design_seed = Some(design_seed);
        self
    }

    /// Seed the adoption stream is derived from.
    pub fn effective_design_seed(&self) -> u64 {
        self.design_seed.unwrap_or(self.seed)
    }

    /// Set the share of never-treated units.
    pub fn with_never_treated_share(mut self, share: f64) -> Self {
        self.never_treated_share = share;
        self
    }

    /// Set the outcome model.
    pub fn with_outcome(mut self, outcome: OutcomeModel) -> Self {
        self.outcome = outcome;
        self
    }

    /// Adoption window in effect (explicit or trailing default).
    pub fn window(&self) -> AdoptionWindow {
        self.adoption
            .unwrap_or_else(|| AdoptionWindow::trailing(self.n_periods as u64, DEFAULT_WINDOW_WIDTH))
    }

    /// Reject configurations that cannot produce a panel.
    pub fn validate(&self) -> Result<()> {
        if self.n_units == 0 {
            return Err(Error::InvalidConfiguration("n_units must be > 0".into()));
        }
        if self.n_periods == 0 {
            return Err(Error::InvalidConfiguration("n_periods must be > 0".into()));
        }
        let w = self.window();
        if w.first == 0 {
            return Err(Error::InvalidConfiguration("adoption window must start at period >= 1".into()));
        }
        if w.first > self.n_periods as u64 {
            return Err(Error::InvalidConfiguration(format!(
                "adoption window starts at {} but the panel ends at period {}",
                w.first, self.n_periods
            )));
        }
        if w.first > w.last {
            return Err(Error::InvalidConfiguration(format!(
                "adoption window is empty ({} > {})",
                w.first, w.last
            )));
        }
        if !(0.0..=1.0).contains(&self.never_treated_share) {
            return Err(Error::InvalidConfiguration(format!(
                "never_treated_share must be in [0, 1], got {}",
                self.never_treated_share
            )));
        }
        self.outcome.validate()
    }

    /// Log (but do not reject) layouts that make for a poor event study.
    pub(crate) fn warn_on_weak_design(&self) {
        let w = self.window();
        let t_max = self.n_periods as u64;
        if w.first <= 1 {
            log::warn!(
                "adoption window starts at period {}: the earliest cohort has no pre-treatment periods",
                w.first
            );
        }
        if w.last > t_max {
            log::warn!(
                "adoption window ends at {} after the last period {}: late cohorts are never observed treated",
                w.last,
                t_max
            );
        }
        if w.last < t_max && self.never_treated_share == 0.0 {
            log::debug!(
                "periods {}..={} have every unit treated and add no comparison units",
                w.last + 1,
                t_max
            );
        }
    }
}
