//! End-to-end pipeline: simulate, estimate, align, render.

use anyhow::{Context, Result};
use es_core::Estimator;
use es_inference::{PrecomputedEstimates, TwfeEventStudy, run_estimators};
use es_sim::{Panel, SimConfig};
use es_viz::{AlignedSeries, ComparisonArtifact};
use es_viz_render::{RenderOptions, VizConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Name of the ground-truth series on the chart.
pub const TRUTH_SERIES_NAME: &str = "True value";

/// Fully resolved pipeline inputs (config file merged with flags).
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub simulation: SimConfig,
    pub twfe: Option<TwfeEventStudy>,
    pub external: Vec<(PathBuf, Option<String>)>,
    pub output: PathBuf,
    pub artifact: Option<PathBuf>,
    pub title: Option<String>,
    pub lead_horizon: i64,
    pub ci_level: Option<f64>,
    pub z: Option<f64>,
    pub truth: bool,
    pub viz: VizConfig,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub output: PathBuf,
    pub artifact: Option<PathBuf>,
    pub series: Vec<String>,
    pub failures: Vec<FailureSummary>,
    pub timings_ms: Vec<TimingSummary>,
}

#[derive(Debug, Serialize)]
pub struct FailureSummary {
    pub estimator: String,
    pub stage: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct TimingSummary {
    pub stage: String,
    pub ms: f64,
}

fn timed<T>(timings: &mut Vec<TimingSummary>, stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let ms = start.elapsed().as_secs_f64() * 1e3;
    tracing::info!(stage, ms, "stage finished");
    timings.push(TimingSummary { stage: stage.to_string(), ms });
    out
}

/// Run the pipeline. Only simulation and rendering errors abort; a failing
/// estimator is logged, reported in the summary and left off the chart.
pub fn execute(plan: &RunPlan) -> Result<RunSummary> {
    let mut timings = Vec::new();
    let mut failures = Vec::new();

    let panel: Panel = timed(&mut timings, "simulate", || es_sim::generate(&plan.simulation))
        .context("simulating panel")?;
    tracing::info!(
        units = panel.n_units(),
        periods = panel.n_periods(),
        treated_rows = panel.n_treated_rows(),
        "panel generated"
    );

    let mut estimators: Vec<Box<dyn Estimator<Panel>>> = Vec::new();
    if let Some(twfe) = &plan.twfe {
        estimators.push(Box::new(twfe.clone()));
    }
    for (path, name) in &plan.external {
        match PrecomputedEstimates::from_file(path, name.as_deref()) {
            Ok(est) => estimators.push(Box::new(est)),
            Err(e) => {
                let estimator =
                    name.clone().unwrap_or_else(|| path.display().to_string());
                tracing::warn!(estimator = %estimator, error = %e, "cannot load external result");
                failures.push(FailureSummary { estimator, stage: "load", error: e.to_string() });
            }
        }
    }

    let run = run_estimators(&panel, &estimators);
    for t in &run.timings {
        timings.push(TimingSummary {
            stage: format!("estimate:{}", t.stage),
            ms: t.elapsed.as_secs_f64() * 1e3,
        });
    }
    for f in &run.failures {
        failures.push(FailureSummary {
            estimator: f.estimator.clone(),
            stage: "estimate",
            error: f.error.to_string(),
        });
    }

    let (mut aligned, align_failures) = es_viz::align_isolated(&run.results);
    for (estimator, e) in align_failures {
        failures.push(FailureSummary { estimator, stage: "align", error: e.to_string() });
    }
    if plan.truth {
        // The truth series owns its name on the chart.
        aligned.retain(|s| {
            if s.name != TRUTH_SERIES_NAME {
                return true;
            }
            let error = format!("series name '{TRUTH_SERIES_NAME}' is reserved for the ground truth");
            tracing::warn!(estimator = %s.name, error = %error, "skipping series");
            failures.push(FailureSummary { estimator: s.name.clone(), stage: "align", error });
            false
        });
    }

    let truth = plan
        .truth
        .then(|| AlignedSeries::truth(TRUTH_SERIES_NAME, &panel.ground_truth()));
    let mut artifact = ComparisonArtifact::from_parts(truth, aligned, Some(plan.lead_horizon))
        .context("assembling comparison artifact")?;
    if let Some(title) = &plan.title {
        artifact.title = title.clone();
    }
    if let Some(level) = plan.ci_level {
        artifact.ci_level = level;
    }
    artifact.z = plan.z.or(artifact.z);
    artifact.validate().context("chart settings")?;

    if let Some(path) = &plan.artifact {
        artifact.write(path).with_context(|| format!("writing artifact {}", path.display()))?;
    }

    timed(&mut timings, "render", || {
        es_viz_render::render_to_file(&artifact, &plan.output, &RenderOptions::default(), &plan.viz)
    })
    .with_context(|| format!("rendering {}", plan.output.display()))?;
    tracing::info!(path = %plan.output.display(), series = artifact.series.len(), "chart written");

    Ok(RunSummary {
        output: plan.output.clone(),
        artifact: plan.artifact.clone(),
        series: artifact.series.iter().map(|s| s.name.clone()).collect(),
        failures,
        timings_ms: timings,
    })
}
