//! Command-line parsing for the `dd` relaxation-time decomposition tool.
//!
//! Argument parsing and command dispatch stay separate from the numerical
//! code: everything here is turned into a validated `DdConfig` by `app`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DataFormat, FailurePolicy, ModelKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "dd",
    version,
    about = "Debye / Cole-Cole decomposition of spectral induced polarization data"
)]
pub struct Cli {
    /// Only print warnings and errors.
    #[arg(long, global = true)]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every spectrum of a data file and write the results.
    Fit(FitArgs),
    /// Write synthetic Cole-Cole input files.
    Synth(SynthArgs),
}

/// Options for `dd fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Frequency file (Nf values).
    #[arg(short = 'f', long = "frequency-file", default_value = "frequencies.dat")]
    pub frequency_file: PathBuf,

    /// Data file (one spectrum per line, 2 x Nf values).
    #[arg(short = 'd', long = "data-file", default_value = "data.dat")]
    pub data_file: PathBuf,

    /// Representation of the two data columns (phases in mrad).
    #[arg(long, value_enum, default_value_t = DataFormat::RmagRpha)]
    pub data_format: DataFormat,

    /// Number of relaxation times per frequency decade.
    #[arg(short = 'n', long = "nr-terms", default_value_t = 20)]
    pub nr_terms: usize,

    /// Output directory; must not exist.
    #[arg(short = 'o', long, default_value = "results")]
    pub output: PathBuf,

    /// Tau range: data, data_ext, data_ext:LEFT,RIGHT or LEFT,RIGHT.
    #[arg(long, default_value = "data_ext")]
    pub tausel: String,

    /// Normalize each spectrum so its first magnitude equals this value.
    #[arg(long)]
    pub norm: Option<f64>,

    /// Maximum number of iterations.
    #[arg(long = "max-it", default_value_t = 20)]
    pub max_iterations: usize,

    /// Output format: ascii or ascii_audit.
    #[arg(long, default_value = "ascii_audit")]
    pub output_format: String,

    /// Number of worker threads.
    #[arg(short = 'c', long = "nr-cores", default_value_t = 1)]
    pub workers: usize,

    /// Fixed regularization strength; searched per iteration when omitted.
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Decomposition formulation.
    #[arg(long, value_enum, default_value_t = ModelKind::Resistivity)]
    pub model: ModelKind,

    /// Cole-Cole exponent c of the resistivity formulation.
    #[arg(long = "cc-exponent", default_value_t = 1.0)]
    pub cc_exponent: f64,

    /// Extra cumulative fractions to report, e.g. "0.2;0.35;0.6".
    #[arg(long = "tau-x")]
    pub tau_x: Option<String>,

    /// Frequency indices (0-based) to drop from every spectrum, e.g. "12,13".
    #[arg(long)]
    pub ignore: Option<String>,

    /// Abort the batch on the first failing spectrum, or keep going.
    #[arg(long, value_enum, default_value_t = FailurePolicy::AbortBatch)]
    pub failure_policy: FailurePolicy,
}

/// Options for `dd synth`.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output directory for frequencies.dat and data.dat; must not exist.
    #[arg(short = 'o', long, default_value = "synthetic")]
    pub output: PathBuf,

    /// Number of spectra.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 1e-2)]
    pub f_min: f64,

    #[arg(long, default_value_t = 1e3)]
    pub f_max: f64,

    #[arg(long, default_value_t = 25)]
    pub nr_frequencies: usize,

    #[arg(long, default_value_t = 100.0)]
    pub rho0: f64,

    /// Chargeability of the single Cole-Cole term.
    #[arg(short = 'm', long, default_value_t = 0.1)]
    pub chargeability: f64,

    /// Relaxation time (s).
    #[arg(long, default_value_t = 1e-2)]
    pub tau: f64,

    #[arg(long = "cc-exponent", default_value_t = 1.0)]
    pub cc_exponent: f64,

    /// Per-spectrum jitter of log10(tau), in decades.
    #[arg(long, default_value_t = 0.0)]
    pub tau_spread: f64,

    /// Relative Gaussian noise level.
    #[arg(long, default_value_t = 0.001)]
    pub noise: f64,

    /// Probability of replacing a sample by NaN.
    #[arg(long, default_value_t = 0.0)]
    pub nan_fraction: f64,
}
