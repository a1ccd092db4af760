//! `dd-fit` library crate.
//!
//! The binary (`dd`) is a thin wrapper around this library so that:
//!
//! - the fit pipeline is testable without spawning processes
//! - the statistics and engine modules are reusable on their own

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod stats;
