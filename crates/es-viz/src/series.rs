use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Largest `|K|` accepted on the relative-time axis.
pub const MAX_RELATIVE_TIME: i64 = 10_000;

/// Single point on the signed relative-time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedPoint {
    /// Periods since treatment (`K`); negative = lead.
    pub relative_time: i64,
    /// Point estimate (or true effect for a truth series).
    pub estimate: f64,
    /// Sampling variance; `None` for values without sampling error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance: Option<f64>,
    /// Normalization anchor inserted by the aligner, not an estimate.
    #[serde(default)]
    pub is_reference: bool,
}

impl AlignedPoint {
    /// An estimated point with variance.
    pub fn estimate(relative_time: i64, estimate: f64, variance: f64) -> Self {
        Self { relative_time, estimate, variance: Some(variance), is_reference: false }
    }

    /// The synthesized `(K, 0, 0)` normalization anchor.
    pub fn reference(relative_time: i64) -> Self {
        Self { relative_time, estimate: 0.0, variance: Some(0.0), is_reference: true }
    }

    /// A value without sampling error.
    pub fn exact(relative_time: i64, value: f64) -> Self {
        Self { relative_time, estimate: value, variance: None, is_reference: false }
    }

    /// Standard error, if the point carries a variance.
    ///
    /// Variances are checked on the way in (`align_series`,
    /// `ComparisonArtifact::validate`), so this never sees a negative one.
    pub fn std_err(&self) -> Option<f64> {
        self.variance.map(f64::sqrt)
    }

    /// Reject non-finite estimates, negative or non-finite variances and
    /// relative times beyond [`MAX_RELATIVE_TIME`].
    pub(crate) fn check(&self, series: &str) -> es_core::Result<()> {
        let k = self.relative_time;
        if k.unsigned_abs() > MAX_RELATIVE_TIME.unsigned_abs() {
            return Err(es_core::Error::Validation(format!(
                "series '{series}': relative time {k} outside ±{MAX_RELATIVE_TIME}"
            )));
        }
        if !self.estimate.is_finite() {
            return Err(es_core::Error::Validation(format!(
                "series '{series}': estimate at K = {k} is not finite"
            )));
        }
        if let Some(v) = self.variance {
            if !(v.is_finite() && v >= 0.0) {
                return Err(es_core::Error::Validation(format!(
                    "series '{series}': variance at K = {k} must be finite and >= 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// What a series represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Estimator output.
    #[default]
    Estimate,
    /// Known true effect (benchmark curve).
    Truth,
}

/// Named series, strictly ascending in `relative_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    /// Series label (estimator name).
    pub name: String,
    /// Estimate or truth.
    #[serde(default)]
    pub kind: SeriesKind,
    /// Points, ascending by relative time.
    pub points: Vec<AlignedPoint>,
}

impl AlignedSeries {
    /// Benchmark series from a ground-truth curve (`h -> mean effect`).
    pub fn truth(name: impl Into<String>, curve: &BTreeMap<i64, f64>) -> Self {
        Self {
            name: name.into(),
            kind: SeriesKind::Truth,
            points: curve.iter().map(|(&h, &v)| AlignedPoint::exact(h, v)).collect(),
        }
    }

    /// Keep points with `relative_time >= -horizon`.
    pub fn trim_leads(mut self, horizon: i64) -> Self {
        self.points.retain(|p| p.relative_time >= -horizon);
        self
    }

    /// Keep points with `relative_time <= horizon`.
    pub fn trim_lags(mut self, horizon: i64) -> Self {
        self.points.retain(|p| p.relative_time <= horizon);
        self
    }

    /// Relative times in order.
    pub fn relative_times(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.relative_time).collect()
    }

    /// Point at relative time `k`.
    pub fn at(&self, k: i64) -> Option<&AlignedPoint> {
        self.points
            .binary_search_by_key(&k, |p| p.relative_time)
            .ok()
            .map(|idx| &self.points[idx])
    }

    /// True for the benchmark series.
    pub fn is_truth(&self) -> bool {
        self.kind == SeriesKind::Truth
    }

    /// Smallest and largest relative time, if any.
    pub fn span(&self) -> Option<(i64, i64)> {
        Some((self.points.first()?.relative_time, self.points.last()?.relative_time))
    }
}
