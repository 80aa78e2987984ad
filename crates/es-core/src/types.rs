//! Raw estimator output types.
//!
//! Every estimator reports (label, estimate, variance) triples, but the
//! packages disagree on what the label means. [`RawSeries`] carries one
//! variant per convention so the aligner can decode each with explicit rules
//! instead of guessing from label strings.

use serde::{Deserialize, Serialize};

/// Lead index omitted by split-label estimators (`K = -1`).
pub const DEFAULT_REFERENCE_LEAD: i64 = 1;

fn default_reference_lead() -> i64 {
    DEFAULT_REFERENCE_LEAD
}

/// One labelled coefficient as reported by an estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledEstimate {
    /// Label in the estimator's own convention (signed offset, lag or lead index).
    pub label: i64,
    /// Point estimate.
    pub estimate: f64,
    /// Sampling variance of the estimate.
    pub variance: f64,
}

impl LabeledEstimate {
    /// Create a new labelled estimate.
    pub fn new(label: i64, estimate: f64, variance: f64) -> Self {
        Self { label, estimate, variance }
    }
}

/// Estimator output in its native relative-time labelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "convention", rename_all = "snake_case")]
pub enum RawSeries {
    /// Labels are already signed relative times `K`.
    Signed {
        /// Reported coefficients.
        entries: Vec<LabeledEstimate>,
        /// Normalization period left out of `entries`, if any.
        #[serde(default)]
        reference: Option<i64>,
    },
    /// Separate lag (`K = l`, `l >= 0`) and lead (`K = -l`, `l >= 1`) counters.
    Split {
        /// Post-treatment coefficients, `l = 0` is the adoption period.
        #[serde(default)]
        lags: Vec<LabeledEstimate>,
        /// Pre-treatment coefficients.
        #[serde(default)]
        leads: Vec<LabeledEstimate>,
        /// Lead index omitted as the normalization period.
        #[serde(default = "default_reference_lead")]
        reference_lead: i64,
    },
}

impl RawSeries {
    /// Number of reported coefficients.
    pub fn len(&self) -> usize {
        match self {
            RawSeries::Signed { entries, .. } => entries.len(),
            RawSeries::Split { lags, leads, .. } => lags.len() + leads.len(),
        }
    }

    /// True when the estimator reported nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the labelling convention.
    pub fn convention(&self) -> &'static str {
        match self {
            RawSeries::Signed { .. } => "signed",
            RawSeries::Split { .. } => "split",
        }
    }
}

/// Output of one estimator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorResult {
    /// Estimator name, unique within a comparison.
    pub estimator: String,
    /// Raw coefficients.
    pub series: RawSeries,
}

impl EstimatorResult {
    /// Create a new estimator result.
    pub fn new(estimator: impl Into<String>, series: RawSeries) -> Self {
        Self { estimator: estimator.into(), series }
    }
}
