//! Run config (YAML) for the end-to-end `run` pipeline.
//!
//! Relative paths are resolved against the directory of the config file.

use anyhow::{Context, Result};
use es_inference::TwfeEventStudy;
use es_sim::SimConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub simulation: SimConfig,
    #[serde(default)]
    pub estimators: EstimatorsConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimatorsConfig {
    /// In-house regression; `null` disables it.
    #[serde(default = "default_twfe")]
    pub twfe: Option<TwfeEventStudy>,
    /// Result files written by external packages.
    #[serde(default)]
    pub external: Vec<ExternalResult>,
}

fn default_twfe() -> Option<TwfeEventStudy> {
    Some(TwfeEventStudy::default())
}

impl Default for EstimatorsConfig {
    fn default() -> Self {
        Self { twfe: default_twfe(), external: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalResult {
    pub path: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    pub output: Option<PathBuf>,
    /// Also write the comparison artifact JSON here.
    pub artifact: Option<PathBuf>,
    pub title: Option<String>,
    pub lead_horizon: Option<i64>,
    pub ci_level: Option<f64>,
    pub z: Option<f64>,
    /// Draw the ground-truth curve (default true).
    pub truth: Option<bool>,
    /// Viz config YAML file.
    pub viz_config: Option<PathBuf>,
}

pub fn read_run_config(path: &Path) -> Result<RunConfig> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut cfg: RunConfig = serde_yaml_ng::from_slice(&bytes)
        .with_context(|| format!("parsing run config {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    cfg.resolve_paths(base);
    Ok(cfg)
}

impl RunConfig {
    fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for ext in &mut self.estimators.external {
            join(&mut ext.path);
        }
        if let Some(p) = self.chart.output.as_mut() {
            join(p);
        }
        if let Some(p) = self.chart.artifact.as_mut() {
            join(p);
        }
        if let Some(p) = self.chart.viz_config.as_mut() {
            join(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> RunConfig {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse("simulation:\n  seed: 10\n");
        assert_eq!(cfg.simulation.n_units, 300);
        assert_eq!(cfg.simulation.n_periods, 15);
        assert_eq!(cfg.estimators.twfe, Some(TwfeEventStudy::default()));
        assert!(cfg.estimators.external.is_empty());
        assert!(cfg.chart.output.is_none());
    }

    #[test]
    fn twfe_can_be_disabled() {
        let cfg = parse("simulation:\n  seed: 1\nestimators:\n  twfe: null\n");
        assert!(cfg.estimators.twfe.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_yaml_ng::from_str::<RunConfig>("simulation:\n  seed: 1\nfoo: 2\n").is_err());
    }

    #[test]
    fn relative_paths_follow_config_dir() {
        let mut cfg = parse(
            "simulation:\n  seed: 1\nestimators:\n  external:\n    - path: cs.json\n      name: CS\nchart:\n  output: out/chart.svg\n",
        );
        cfg.resolve_paths(Path::new("/data/run"));
        assert_eq!(cfg.estimators.external[0].path, PathBuf::from("/data/run/cs.json"));
        assert_eq!(cfg.estimators.external[0].name.as_deref(), Some("CS"));
        assert_eq!(cfg.chart.output, Some(PathBuf::from("/data/run/out/chart.svg")));
    }
}
