//! `bfrag-weights` library crate.
//!
//! The binary (`bfrag`) is a thin wrapper around this library so that:
//!
//! - the weight derivation is testable without spawning processes
//! - the per-jet evaluation (`build::WeightSet`) can be embedded elsewhere
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod build;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod hist;
pub mod io;
pub mod math;
pub mod report;
