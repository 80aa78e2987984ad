//! Estimators over a simulated panel.
//!
//! [`TwfeEventStudy`] is the in-house regression. [`PrecomputedEstimates`]
//! is how external packages enter the comparison: they run outside this
//! workspace against the exported panel and hand back a JSON result file.

use std::path::Path;

use es_core::{
    DEFAULT_REFERENCE_LEAD, Error, Estimator, EstimatorResult, LabeledEstimate, RawSeries, Result,
};
use es_sim::Panel;
use serde::{Deserialize, Serialize};

use crate::econometrics::{EventWindow, event_study};

fn default_name() -> String {
    "TWFE OLS".to_string()
}

fn default_horizon() -> i64 {
    5
}

fn default_reference_lead() -> i64 {
    DEFAULT_REFERENCE_LEAD
}

/// Two-way fixed-effects event-study OLS, clustered by unit.
///
/// Reports its coefficients in the split lead/lag labelling: lag `l` is
/// `K = l`, lead `l` is `K = -l`, and lead `reference_lead` is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TwfeEventStudy {
    /// Series label.
    #[serde(default = "default_name")]
    pub name: String,
    /// Furthest lead with its own indicator.
    #[serde(default = "default_horizon")]
    pub max_lead: i64,
    /// Furthest lag with its own indicator.
    #[serde(default = "default_horizon")]
    pub max_lag: i64,
    /// Omitted lead.
    #[serde(default = "default_reference_lead")]
    pub reference_lead: i64,
}

impl Default for TwfeEventStudy {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_lead: default_horizon(),
            max_lag: default_horizon(),
            reference_lead: default_reference_lead(),
        }
    }
}

impl TwfeEventStudy {
    /// Default configuration under a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Set the lead/lag horizons.
    pub fn with_horizons(mut self, max_lead: i64, max_lag: i64) -> Self {
        self.max_lead = max_lead;
        self.max_lag = max_lag;
        self
    }

    fn window(&self) -> Result<EventWindow> {
        if self.max_lead < 1 || self.max_lag < 0 {
            return Err(Error::InvalidConfiguration(format!(
                "{}: max_lead must be >= 1 and max_lag >= 0 (got {}, {})",
                self.name, self.max_lead, self.max_lag
            )));
        }
        if self.reference_lead < 1 || self.reference_lead > self.max_lead {
            return Err(Error::InvalidConfiguration(format!(
                "{}: reference_lead {} outside 1..={}",
                self.name, self.reference_lead, self.max_lead
            )));
        }
        Ok(EventWindow::new(self.max_lead, self.max_lag, -self.reference_lead))
    }
}

impl Estimator<Panel> for TwfeEventStudy {
    fn name(&self) -> &str {
        &self.name
    }

    fn estimate(&self, panel: &Panel) -> Result<RawSeries> {
        let window = self.window()?;
        let res = event_study(
            panel.outcome(),
            panel.units(),
            panel.periods(),
            panel.relative_time(),
            window,
            panel.units(),
        )?;
        log::debug!(
            "{}: {} coefficients from {} rows in {} clusters",
            self.name,
            res.coefficients.len(),
            res.n_obs,
            res.n_clusters
        );

        let mut lags = Vec::new();
        let mut leads = Vec::new();
        for (k, estimate, variance) in res.points() {
            if k >= 0 {
                lags.push(LabeledEstimate::new(k, estimate, variance));
            } else {
                leads.push(LabeledEstimate::new(-k, estimate, variance));
            }
        }
        leads.sort_by_key(|e| e.label);

        Ok(RawSeries::Split { lags, leads, reference_lead: self.reference_lead })
    }
}

/// Result file written by an external package: either a full
/// [`EstimatorResult`] or a bare [`RawSeries`].
#[derive(Deserialize)]
#[serde(untagged)]
enum ResultFile {
    Named(EstimatorResult),
    Bare(RawSeries),
}

/// Output of an external estimator, loaded from disk and replayed unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecomputedEstimates {
    name: String,
    series: RawSeries,
}

impl PrecomputedEstimates {
    /// Wrap an already-parsed result.
    pub fn from_result(result: EstimatorResult) -> Self {
        Self { name: result.estimator, series: result.series }
    }

    /// Load a JSON result file.
    ///
    /// The name is taken from `name` when given, else from the file's
    /// `estimator` field, else from the file stem.
    pub fn from_file(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let parsed: ResultFile = serde_json::from_str(&text).map_err(|e| {
            Error::Validation(format!("{}: not an estimator result: {e}", path.display()))
        })?;
        let stem = || path.file_stem().map(|s| s.to_string_lossy().into_owned());

        let (file_name, series) = match parsed {
            ResultFile::Named(r) => (Some(r.estimator), r.series),
            ResultFile::Bare(series) => (None, series),
        };
        let name = name.map(str::to_string).or(file_name).or_else(stem).ok_or_else(|| {
            Error::Validation(format!("{}: cannot derive estimator name", path.display()))
        })?;

        log::debug!(
            "loaded {} {} coefficients for '{name}' from {}",
            series.len(),
            series.convention(),
            path.display()
        );
        Ok(Self { name, series })
    }

    /// The stored series.
    pub fn series(&self) -> &RawSeries {
        &self.series
    }

    /// Back into a named result.
    pub fn into_result(self) -> EstimatorResult {
        EstimatorResult::new(self.name, self.series)
    }
}

impl<D: ?Sized> Estimator<D> for PrecomputedEstimates {
    fn name(&self) -> &str {
        &self.name
    }

    fn estimate(&self, _data: &D) -> Result<RawSeries> {
        Ok(self.series.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_sim::SimConfig;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("es_inference_{}_{}", std::process::id(), name));
        p
    }

    #[test]
    fn twfe_emits_split_labels() {
        let panel = es_sim::generate(&SimConfig::new(300, 15, 10)).unwrap();
        let series = TwfeEventStudy::default().estimate(&panel).unwrap();

        match series {
            RawSeries::Split { lags, leads, reference_lead } => {
                assert_eq!(reference_lead, 1);
                let lag_labels: Vec<i64> = lags.iter().map(|e| e.label).collect();
                let lead_labels: Vec<i64> = leads.iter().map(|e| e.label).collect();
                assert_eq!(lag_labels, vec![0, 1, 2, 3, 4, 5]);
                assert_eq!(lead_labels, vec![2, 3, 4, 5]);
                assert!(lags.iter().chain(&leads).all(|e| e.estimate.is_finite()));
                assert!(lags.iter().chain(&leads).all(|e| e.variance > 0.0));
            }
            other => panic!("expected split series, got {other:?}"),
        }
    }

    #[test]
    fn twfe_rejects_bad_horizons() {
        let panel = es_sim::generate(&SimConfig::new(20, 10, 1)).unwrap();
        let est = TwfeEventStudy { reference_lead: 7, ..TwfeEventStudy::default() };
        assert!(matches!(est.estimate(&panel), Err(Error::InvalidConfiguration(_))));
        let est = TwfeEventStudy::default().with_horizons(0, 3);
        assert!(est.estimate(&panel).is_err());
    }

    #[test]
    fn twfe_config_defaults_from_yaml_like_json() {
        let est: TwfeEventStudy = serde_json::from_str(r#"{"max_lag": 3}"#).unwrap();
        assert_eq!(est.name, "TWFE OLS");
        assert_eq!(est.max_lead, 5);
        assert_eq!(est.max_lag, 3);
        assert_eq!(est.reference_lead, 1);
    }

    #[test]
    fn precomputed_named_file() {
        let path = tmp_path("named.json");
        let json = r#"{
            "estimator": "Callaway-Sant'Anna",
            "series": {"convention": "signed", "entries": [{"label": -2, "estimate": 0.1, "variance": 0.02}]}
        }"#;
        std::fs::write(&path, json).unwrap();

        let est = PrecomputedEstimates::from_file(&path, None).unwrap();
        assert_eq!(Estimator::<()>::name(&est), "Callaway-Sant'Anna");
        assert_eq!(est.estimate(&()).unwrap().len(), 1);

        let renamed = PrecomputedEstimates::from_file(&path, Some("CS")).unwrap();
        assert_eq!(Estimator::<()>::name(&renamed), "CS");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn precomputed_bare_series_uses_file_stem() {
        let path = tmp_path("sun_abraham.json");
        let json = r#"{"convention": "split", "lags": [{"label": 0, "estimate": 0.5, "variance": 0.01}]}"#;
        std::fs::write(&path, json).unwrap();

        let est = PrecomputedEstimates::from_file(&path, None).unwrap();
        assert!(Estimator::<()>::name(&est).ends_with("sun_abraham"));
        assert_eq!(est.series().convention(), "split");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn precomputed_rejects_garbage() {
        let path = tmp_path("garbage.json");
        std::fs::write(&path, r#"{"hello": 1}"#).unwrap();
        assert!(matches!(PrecomputedEstimates::from_file(&path, None), Err(Error::Validation(_))));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            PrecomputedEstimates::from_file(tmp_path("missing.json"), None),
            Err(Error::Io(_))
        ));
    }
}
