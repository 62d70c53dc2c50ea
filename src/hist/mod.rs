//! Binned data model: axes, 1-D/2-D histograms and point graphs.
//!
//! All types here are plain owned values. "Loading" a histogram from a
//! container hands out a deep copy, so nothing in this module ever refers back
//! to the file it came from.

pub mod axis;
pub mod graph;
pub mod hist1d;
pub mod hist2d;
pub mod ops;

pub use axis::*;
pub use graph::*;
pub use hist1d::*;
pub use hist2d::*;
pub use ops::*;
