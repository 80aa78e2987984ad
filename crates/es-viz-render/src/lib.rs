//! SVG/PNG rendering of estimator comparison charts.
//!
//! The renderer draws a [`ComparisonArtifact`]: every estimate series as
//! jittered markers with `estimate ± z·se` error bars, the truth series as a
//! line, a `y = 0` reference line and a dashed treatment-onset line.

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod options;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use std::path::Path;

use es_viz::ComparisonArtifact;
use thiserror::Error;

pub use config::{VizConfig, resolve_config};
pub use options::{MarkerPlacement, RenderOptions, place_markers, z_for_level};
pub use output::OutputFormat;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid artifact: {0}")]
    Artifact(#[from] es_core::Error),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render an artifact to an SVG string.
pub fn render_svg(
    artifact: &ComparisonArtifact,
    options: &RenderOptions,
    config: &VizConfig,
) -> Result<String> {
    plots::event_study::render(artifact, options, config)
}

/// Render an artifact given as JSON to an SVG string.
pub fn render_json_svg(
    artifact_json: &str,
    options: &RenderOptions,
    config: &VizConfig,
) -> Result<String> {
    let artifact: ComparisonArtifact = serde_json::from_str(artifact_json)?;
    render_svg(&artifact, options, config)
}

/// Render an artifact to bytes in the given format.
pub fn render_to_bytes(
    artifact: &ComparisonArtifact,
    format: OutputFormat,
    options: &RenderOptions,
    config: &VizConfig,
) -> Result<Vec<u8>> {
    let svg = render_svg(artifact, options, config)?;
    match format {
        OutputFormat::Svg => Ok(svg.into_bytes()),
        #[cfg(feature = "png")]
        OutputFormat::Png => output::png::svg_to_png(&svg, config.output.dpi),
        #[cfg(not(feature = "png"))]
        OutputFormat::Png => {
            Err(RenderError::Config("PNG output requires the `png` feature".into()))
        }
    }
}

/// Render an artifact to a file, format inferred from the extension.
///
/// An existing file is overwritten.
pub fn render_to_file(
    artifact: &ComparisonArtifact,
    path: &Path,
    options: &RenderOptions,
    config: &VizConfig,
) -> Result<()> {
    let format = OutputFormat::from_path(path)?;
    match format {
        OutputFormat::Svg => output::svg::save_svg(&render_svg(artifact, options, config)?, path)?,
        OutputFormat::Png => {
            let bytes = render_to_bytes(artifact, format, options, config)?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, bytes)?;
        }
    }
    log::info!("wrote {:?} chart to {}", format, path.display());
    Ok(())
}
