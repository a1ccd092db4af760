//! Terminal reporting of fitted batches.

pub mod format;

pub use format::*;
