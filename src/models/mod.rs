//! Decomposition model implementations.
//!
//! Models are implemented as small, pure functions so that the inversion engine
//! can stay generic over the formulation.

pub mod model;

pub use model::*;
