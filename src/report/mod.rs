//! Terminal summaries of build, closure and normalization runs.

pub mod format;

pub use format::*;
