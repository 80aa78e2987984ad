//! # es-viz
//!
//! Visualization data artifacts for EventSim.
//!
//! This crate is dependency-light: it decodes each estimator's relative-time
//! labelling onto one signed axis and emits plot-friendly JSON. Drawing lives
//! in `es-viz-render`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Decoding raw estimator output onto the signed relative-time axis.
pub mod align;

/// Comparison chart artifact (series + CI settings).
pub mod artifact;

/// Aligned series and points.
pub mod series;

pub use align::{align, align_isolated, align_series};
pub use artifact::{ComparisonArtifact, DEFAULT_CI_LEVEL, DEFAULT_LEAD_HORIZON};
pub use series::{AlignedPoint, AlignedSeries, SeriesKind, MAX_RELATIVE_TIME};
