//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observables, smoothing strategies and above-threshold policies
//! - momentum slices with their rebin rules
//! - the run configuration (`WeightConfig`) and its defaults

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
