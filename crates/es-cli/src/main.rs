//! EventSim CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use es_inference::{PrecomputedEstimates, TwfeEventStudy};
use es_sim::SimConfig;
use es_viz::{AlignedSeries, ComparisonArtifact, DEFAULT_LEAD_HORIZON};
use es_viz_render::{RenderOptions, VizConfig};
use std::path::{Path, PathBuf};

mod run;
mod run_config;

use es_core::EstimatorResult;
use run::{RunPlan, TRUTH_SERIES_NAME};

#[derive(Parser)]
#[command(name = "eventsim")]
#[command(about = "EventSim - event-study estimators on simulated staggered-adoption panels")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct SimArgs {
    /// Number of units
    #[arg(long, default_value = "300")]
    units: usize,

    /// Number of periods
    #[arg(long, default_value = "15")]
    periods: usize,

    /// Seed of the noise stream
    #[arg(long)]
    seed: u64,

    /// Seed of the adoption stream (defaults to --seed). The cohorts, and with
    /// them the ground truth, change with --seed unless this is pinned.
    #[arg(long)]
    design_seed: Option<u64>,

    /// Share of never-treated units in [0, 1]
    #[arg(long, default_value = "0.0")]
    never_treated_share: f64,
}

impl SimArgs {
    fn to_config(&self) -> SimConfig {
        let mut cfg = SimConfig::new(self.units, self.periods, self.seed)
            .with_never_treated_share(self.never_treated_share);
        if let Some(ds) = self.design_seed {
            cfg = cfg.with_design_seed(ds);
        }
        cfg
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a panel and write it as CSV (i,t,Ei,K,D,Y,gvar)
    Simulate {
        #[command(flatten)]
        sim: SimArgs,

        /// Output CSV file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ground-truth effect curve by relative time (truth series JSON)
    ///
    /// The curve depends on the adoption cohorts only. Pin --design-seed to
    /// keep it fixed while varying --seed.
    Truth {
        #[command(flatten)]
        sim: SimArgs,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the in-house TWFE event study on a simulated panel (estimator result JSON)
    Estimate {
        #[command(flatten)]
        sim: SimArgs,

        /// Furthest lead with its own indicator
        #[arg(long, default_value = "5")]
        max_lead: i64,

        /// Furthest lag with its own indicator
        #[arg(long, default_value = "5")]
        max_lag: i64,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Align estimator result files into a comparison artifact
    Align {
        /// Estimator result JSON files (repeatable)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Truth series JSON (output of `truth`)
        #[arg(long)]
        truth: Option<PathBuf>,

        /// Keep leads down to K = -horizon
        #[arg(long, default_value_t = DEFAULT_LEAD_HORIZON)]
        horizon: i64,

        /// Chart title
        #[arg(long)]
        title: Option<String>,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a comparison artifact to SVG or PNG
    Render {
        /// Comparison artifact JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Output chart (.svg or .png)
        #[arg(short, long)]
        output: PathBuf,

        /// Viz config YAML (theme overrides)
        #[arg(long)]
        viz_config: Option<PathBuf>,

        /// Critical value for the error bars (overrides the artifact)
        #[arg(long)]
        z: Option<f64>,

        /// Explicit per-series x offsets, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        offsets: Option<Vec<f64>>,
    },

    /// Simulate, estimate, align and render in one go
    Run {
        /// Run config YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of units (overrides the config)
        #[arg(long)]
        units: Option<usize>,

        /// Number of periods (overrides the config)
        #[arg(long)]
        periods: Option<usize>,

        /// Seed (overrides the config; required without one)
        #[arg(long)]
        seed: Option<u64>,

        /// Seed of the adoption stream (overrides the config). Without it the
        /// cohorts, and the ground truth, follow --seed.
        #[arg(long)]
        design_seed: Option<u64>,

        /// External estimator result JSON (repeatable)
        #[arg(long)]
        external: Vec<PathBuf>,

        /// Skip the in-house TWFE estimator
        #[arg(long)]
        no_twfe: bool,

        /// Output chart (.svg or .png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the comparison artifact JSON
        #[arg(long)]
        artifact: Option<PathBuf>,

        /// Viz config YAML (overrides the config)
        #[arg(long)]
        viz_config: Option<PathBuf>,

        /// Critical value for the error bars
        #[arg(long)]
        z: Option<f64>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate { sim, output } => cmd_simulate(&sim, output.as_deref()),
        Commands::Truth { sim, output } => cmd_truth(&sim, output.as_deref()),
        Commands::Estimate { sim, max_lead, max_lag, output } => {
            cmd_estimate(&sim, max_lead, max_lag, output.as_deref())
        }
        Commands::Align { input, truth, horizon, title, output } => {
            cmd_align(&input, truth.as_deref(), horizon, title, output.as_deref())
        }
        Commands::Render { input, output, viz_config, z, offsets } => {
            cmd_render(&input, &output, viz_config.as_deref(), z, offsets)
        }
        Commands::Run {
            config,
            units,
            periods,
            seed,
            design_seed,
            external,
            no_twfe,
            output,
            artifact,
            viz_config,
            z,
        } => {
            let plan = build_run_plan(RunFlags {
                config,
                units,
                periods,
                seed,
                design_seed,
                external,
                no_twfe,
                output,
                artifact,
                viz_config,
                z,
            })?;
            let summary = run::execute(&plan)?;
            write_json(None, serde_json::to_value(&summary)?)
        }
        Commands::Version => {
            println!("eventsim {}", es_core::VERSION);
            Ok(())
        }
    }
}

fn write_json(output: Option<&Path>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

fn load_viz_config(path: Option<&Path>) -> Result<VizConfig> {
    let yaml = path
        .map(|p| std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()?;
    Ok(es_viz_render::resolve_config(yaml.as_deref())?)
}

fn cmd_simulate(sim: &SimArgs, output: Option<&Path>) -> Result<()> {
    let panel = es_sim::generate(&sim.to_config())?;
    tracing::info!(rows = panel.len(), treated_rows = panel.n_treated_rows(), "panel generated");

    let sink: Box<dyn std::io::Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = csv::Writer::from_writer(sink);
    for row in panel.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn cmd_truth(sim: &SimArgs, output: Option<&Path>) -> Result<()> {
    let panel = es_sim::generate(&sim.to_config())?;
    let truth = AlignedSeries::truth(TRUTH_SERIES_NAME, &panel.ground_truth());
    write_json(output, serde_json::to_value(&truth)?)
}

fn cmd_estimate(sim: &SimArgs, max_lead: i64, max_lag: i64, output: Option<&Path>) -> Result<()> {
    let panel = es_sim::generate(&sim.to_config())?;
    let est = TwfeEventStudy::default().with_horizons(max_lead, max_lag);
    let series = es_core::Estimator::estimate(&est, &panel)?;
    let result = EstimatorResult::new(est.name.clone(), series);
    write_json(output, serde_json::to_value(&result)?)
}

fn cmd_align(
    inputs: &[PathBuf],
    truth: Option<&Path>,
    horizon: i64,
    title: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let mut results = Vec::with_capacity(inputs.len());
    for path in inputs {
        match PrecomputedEstimates::from_file(path, None) {
            Ok(est) => results.push(est.into_result()),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping result file"),
        }
    }

    let (aligned, failures) = es_viz::align_isolated(&results);
    if aligned.is_empty() {
        let failed = failures.len() + inputs.len() - results.len();
        anyhow::bail!("no estimator result could be aligned ({failed} failed)");
    }

    let truth: Option<AlignedSeries> = truth
        .map(|p| -> Result<AlignedSeries> {
            let text =
                std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            Ok(serde_json::from_str(&text).with_context(|| format!("parsing {}", p.display()))?)
        })
        .transpose()?;

    let mut artifact = ComparisonArtifact::from_parts(truth, aligned, Some(horizon))?;
    if let Some(title) = title {
        artifact.title = title;
    }
    write_json(output, serde_json::to_value(&artifact)?)
}

fn cmd_render(
    input: &Path,
    output: &Path,
    viz_config: Option<&Path>,
    z: Option<f64>,
    offsets: Option<Vec<f64>>,
) -> Result<()> {
    let artifact = ComparisonArtifact::read(input)
        .with_context(|| format!("reading artifact {}", input.display()))?;
    let config = load_viz_config(viz_config)?;
    let options = RenderOptions { z, offsets, ..RenderOptions::default() };
    es_viz_render::render_to_file(&artifact, output, &options, &config)
        .with_context(|| format!("rendering {}", output.display()))?;
    tracing::info!(path = %output.display(), "chart written");
    Ok(())
}

struct RunFlags {
    config: Option<PathBuf>,
    units: Option<usize>,
    periods: Option<usize>,
    seed: Option<u64>,
    design_seed: Option<u64>,
    external: Vec<PathBuf>,
    no_twfe: bool,
    output: Option<PathBuf>,
    artifact: Option<PathBuf>,
    viz_config: Option<PathBuf>,
    z: Option<f64>,
}

/// Merge the run config with flags; flags win.
fn build_run_plan(flags: RunFlags) -> Result<RunPlan> {
    let file = flags.config.as_deref().map(run_config::read_run_config).transpose()?;

    let mut simulation = match (&file, flags.seed) {
        (Some(f), _) => f.simulation.clone(),
        (None, Some(seed)) => SimConfig::new(300, 15, seed),
        (None, None) => anyhow::bail!("--seed is required without --config"),
    };
    if let Some(seed) = flags.seed {
        simulation.seed = seed;
    }
    if let Some(ds) = flags.design_seed {
        simulation.design_seed = Some(ds);
    }
    if let Some(units) = flags.units {
        simulation.n_units = units;
    }
    if let Some(periods) = flags.periods {
        simulation.n_periods = periods;
    }

    let (estimators, chart) = match file {
        Some(f) => (f.estimators, f.chart),
        None => (Default::default(), Default::default()),
    };
    let twfe = if flags.no_twfe { None } else { estimators.twfe };
    let external = estimators
        .external
        .into_iter()
        .map(|e| (e.path, e.name))
        .chain(flags.external.into_iter().map(|p| (p, None)))
        .collect();

    let output = flags
        .output
        .or(chart.output)
        .context("no chart output: pass --output or set chart.output")?;
    let viz = load_viz_config(flags.viz_config.or(chart.viz_config).as_deref())?;

    Ok(RunPlan {
        simulation,
        twfe,
        external,
        output,
        artifact: flags.artifact.or(chart.artifact),
        title: chart.title,
        lead_horizon: chart.lead_horizon.unwrap_or(DEFAULT_LEAD_HORIZON),
        ci_level: chart.ci_level,
        z: flags.z.or(chart.z),
        truth: chart.truth.unwrap_or(true),
        viz,
    })
}
