//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input conventions (`DataFormat`) and raw/prepared spectra
//! - model and regularization choices (`ModelFormulation`, `LambdaPolicy`, `TauSelection`)
//! - the run configuration (`DdConfig`, `PrepConfig`, `InversionConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
