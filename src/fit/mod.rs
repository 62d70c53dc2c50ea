//! Weight-curve construction from ratio histograms.

pub mod smoother;

pub use smoother::*;
