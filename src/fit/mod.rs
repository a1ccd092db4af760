//! Fit orchestration.
//!
//! Responsibilities:
//!
//! - build one self-contained job per spectrum
//! - dispatch jobs over a worker pool, gathering results in input order
//! - per job: tau grid, engine configuration and the inversion itself

pub mod adapter;
pub mod dispatch;
pub mod engine;
pub mod jobs;
pub mod regularization;
pub mod tau_grid;

pub use adapter::*;
pub use dispatch::*;
pub use engine::{
    DecompositionEngine, EngineOptions, InversionEngine, Iteration, RmsComponent, RmsValues,
};
pub use jobs::*;
pub use tau_grid::*;
