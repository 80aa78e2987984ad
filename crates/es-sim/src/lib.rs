//! # es-sim
//!
//! Synthetic balanced panels with staggered treatment adoption and a known,
//! heterogeneous treatment effect.
//!
//! The treatment effect depends on calendar time only, so the benchmark
//! curve ([`Panel::ground_truth`]) is fixed by the configuration and does not
//! move with the noise seed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod panel;

pub use config::{AdoptionWindow, OutcomeModel, SimConfig, DEFAULT_WINDOW_WIDTH};
pub use panel::{Panel, PanelRow, generate};
