//! Input data sources.

pub mod toy;

pub use toy::*;
