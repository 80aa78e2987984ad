//! # es-core
//!
//! Core types and traits for EventSim.
//!
//! This crate defines the shared error type, the raw estimator output
//! representation (one tagged variant per relative-time labelling
//! convention) and the [`Estimator`] trait that the in-house regression and
//! the adapters for external packages implement.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::Estimator;
pub use types::{EstimatorResult, LabeledEstimate, RawSeries, DEFAULT_REFERENCE_LEAD};

/// EventSim version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
