use std::collections::HashSet;
use std::path::Path;

use es_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::series::AlignedSeries;

/// Two-sided confidence level of the error bars.
pub const DEFAULT_CI_LEVEL: f64 = 0.95;

/// Leads kept by default (`K >= -5`).
pub const DEFAULT_LEAD_HORIZON: i64 = 5;

fn default_title() -> String {
    "Event study estimators in a simulated panel".to_string()
}

fn default_x_label() -> String {
    "Periods since the event".to_string()
}

fn default_y_label() -> String {
    "Average causal effect".to_string()
}

fn default_ci_level() -> f64 {
    DEFAULT_CI_LEVEL
}

/// Plot-friendly artifact for the estimator comparison chart.
///
/// Series are drawn in order; the jitter offset of each series follows its
/// position here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonArtifact {
    /// Chart title.
    #[serde(default = "default_title")]
    pub title: String,
    /// X axis label.
    #[serde(default = "default_x_label")]
    pub x_label: String,
    /// Y axis label.
    #[serde(default = "default_y_label")]
    pub y_label: String,
    /// Two-sided confidence level of the error bars.
    #[serde(default = "default_ci_level")]
    pub ci_level: f64,
    /// Explicit critical value; overrides `ci_level` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Lead horizon applied to the estimate series, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_horizon: Option<i64>,
    /// Ordered series.
    pub series: Vec<AlignedSeries>,
}

impl Default for ComparisonArtifact {
    fn default() -> Self {
        Self {
            title: default_title(),
            x_label: default_x_label(),
            y_label: default_y_label(),
            ci_level: DEFAULT_CI_LEVEL,
            z: None,
            lead_horizon: None,
            series: Vec::new(),
        }
    }
}

impl ComparisonArtifact {
    /// Assemble an artifact: the truth series (if any) first, then the
    /// estimates, each trimmed to `lead_horizon` when given.
    pub fn from_parts(
        truth: Option<AlignedSeries>,
        estimates: Vec<AlignedSeries>,
        lead_horizon: Option<i64>,
    ) -> Result<Self> {
        let trim = |s: AlignedSeries| match lead_horizon {
            Some(h) => s.trim_leads(h),
            None => s,
        };
        let series = truth.into_iter().chain(estimates).map(trim).collect();
        let artifact = Self { lead_horizon, series, ..Self::default() };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set an explicit critical value.
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    /// Check series names are unique, points strictly ascending and every
    /// point within the accepted value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.ci_level > 0.0 && self.ci_level < 1.0) {
            return Err(Error::Validation(format!(
                "ci_level must be in (0, 1), got {}",
                self.ci_level
            )));
        }
        if let Some(z) = self.z {
            if !(z.is_finite() && z > 0.0) {
                return Err(Error::Validation(format!("z must be finite and > 0, got {z}")));
            }
        }

        let mut names = HashSet::new();
        for s in &self.series {
            if !names.insert(s.name.as_str()) {
                return Err(Error::Validation(format!("duplicate series name '{}'", s.name)));
            }
            if let Some(w) = s.points.windows(2).find(|w| w[0].relative_time >= w[1].relative_time)
            {
                return Err(Error::Validation(format!(
                    "series '{}': relative times not strictly ascending at {}",
                    s.name, w[1].relative_time
                )));
            }
            for p in &s.points {
                p.check(&s.name)?;
            }
        }
        Ok(())
    }

    /// Smallest and largest relative time across all series.
    pub fn x_range(&self) -> Option<(i64, i64)> {
        self.series.iter().filter_map(AlignedSeries::span).fold(None, |acc, (lo, hi)| {
            Some(match acc {
                None => (lo, hi),
                Some((a, b)) => (a.min(lo), b.max(hi)),
            })
        })
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate.
    pub fn from_json(text: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(text)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Read and validate an artifact file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Write the artifact as pretty JSON, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{AlignedPoint, SeriesKind};
    use std::collections::BTreeMap;

    fn estimate_series(name: &str) -> AlignedSeries {
        AlignedSeries {
            name: name.into(),
            kind: SeriesKind::Estimate,
            points: vec![
                AlignedPoint::estimate(-7, 0.2, 0.1),
                AlignedPoint::estimate(-5, 0.1, 0.1),
                AlignedPoint::reference(-1),
                AlignedPoint::estimate(0, 1.0, 0.1),
            ],
        }
    }

    #[test]
    fn from_parts_puts_truth_first_and_trims() {
        let curve: BTreeMap<i64, f64> = [(0, -0.5), (1, 0.5)].into_iter().collect();
        let truth = AlignedSeries::truth("True value", &curve);
        let art = ComparisonArtifact::from_parts(
            Some(truth),
            vec![estimate_series("a"), estimate_series("b")],
            Some(DEFAULT_LEAD_HORIZON),
        )
        .unwrap();

        let names: Vec<&str> = art.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["True value", "a", "b"]);
        assert_eq!(art.series[1].relative_times(), vec![-5, -1, 0]);
        assert_eq!(art.x_range(), Some((-5, 1)));
    }

    #[test]
    fn duplicate_series_names_are_rejected() {
        let res = ComparisonArtifact::from_parts(
            None,
            vec![estimate_series("a"), estimate_series("a")],
            None,
        );
        assert!(matches!(res, Err(Error::Validation(_))));
    }

    #[test]
    fn unordered_points_are_rejected() {
        let mut s = estimate_series("a");
        s.points.swap(0, 1);
        let art = ComparisonArtifact { series: vec![s], ..ComparisonArtifact::default() };
        assert!(art.validate().is_err());
    }

    #[test]
    fn far_relative_times_are_rejected() {
        let json = r#"{"series": [{"name": "wild", "points": [
            {"relativeTime": -5, "estimate": 0.1, "variance": 0.01},
            {"relativeTime": 10000000, "estimate": 0.2, "variance": 0.01}
        ]}]}"#;
        assert!(matches!(ComparisonArtifact::from_json(json), Err(Error::Validation(_))));

        let json = r#"{"series": [{"name": "neg", "points": [
            {"relativeTime": 0, "estimate": 0.1, "variance": -0.5}
        ]}]}"#;
        assert!(matches!(ComparisonArtifact::from_json(json), Err(Error::Validation(_))));
    }

    #[test]
    fn json_defaults_and_round_trip() {
        let art: ComparisonArtifact = ComparisonArtifact::from_json(r#"{"series": []}"#).unwrap();
        assert_eq!(art.ci_level, DEFAULT_CI_LEVEL);
        assert_eq!(art.z, None);
        assert_eq!(art.x_range(), None);

        let art = ComparisonArtifact::from_parts(None, vec![estimate_series("a")], None)
            .unwrap()
            .with_title("t")
            .with_z(1.645);
        let back = ComparisonArtifact::from_json(&art.to_json().unwrap()).unwrap();
        assert_eq!(back, art);
    }

    #[test]
    fn bad_levels_are_rejected() {
        let art = ComparisonArtifact { ci_level: 1.5, ..ComparisonArtifact::default() };
        assert!(art.validate().is_err());
        let art = ComparisonArtifact::default().with_z(-1.0);
        assert!(art.validate().is_err());
    }
}
