//! Input/output helpers.
//!
//! - hierarchical JSON histogram container (`container`)
//! - per-tune input loading and validation (`inputs`)

pub mod container;
pub mod inputs;

pub use container::*;
pub use inputs::*;
