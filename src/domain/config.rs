//! Run configuration.
//!
//! Options are split the same way the fit pipeline consumes them:
//!
//! - `PrepConfig`: settings needed to *prepare* each inversion (data format,
//!   lambda policy, tau_x fractions, ...). Shared read-only by all jobs.
//! - `InversionConfig`: settings handed to the inversion engine. Every job owns
//!   its own copy, which the job builder then specializes.
//!
//! Everything is validated once, up front, by `DdConfig::validate`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{
    DataFormat, FailurePolicy, LambdaPolicy, ModelFormulation, OutputFormat, TauSelection,
};
use crate::error::AppError;

/// Settings shared (read-only) by every job of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepConfig {
    pub data_format: DataFormat,
    pub lambda: LambdaPolicy,
    /// Frequency indices (0-based) removed from every spectrum.
    pub ignore_frequencies: Vec<usize>,
    /// Normalize each spectrum so its first magnitude equals this value.
    pub norm: Option<f64>,
    /// Cumulative fractions reported as `tau_x_*` / `f_x_*`.
    pub tau_x: Vec<f64>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            data_format: DataFormat::RmagRpha,
            lambda: LambdaPolicy::Search,
            ignore_frequencies: Vec::new(),
            norm: None,
            tau_x: Vec::new(),
        }
    }
}

/// Settings passed through to the inversion engine.
///
/// The per-spectrum fields (`frequencies`, `global_prefix`, `norm_factor`) are
/// filled in by the job builder on a private copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InversionConfig {
    pub tausel: TauSelection,
    /// Number of relaxation times per frequency decade.
    pub nr_terms_decade: usize,
    pub max_iterations: usize,
    pub model: ModelFormulation,
    pub frequencies: Vec<f64>,
    pub global_prefix: String,
    pub norm_factor: Option<f64>,
}

impl Default for InversionConfig {
    fn default() -> Self {
        Self {
            tausel: TauSelection::default(),
            nr_terms_decade: 20,
            max_iterations: 20,
            model: ModelFormulation::default(),
            frequencies: Vec::new(),
            global_prefix: String::new(),
            norm_factor: None,
        }
    }
}

/// Complete, explicit configuration of one `dd fit` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdConfig {
    pub frequency_file: PathBuf,
    pub data_file: PathBuf,
    pub output_dir: PathBuf,
    pub prep: PrepConfig,
    pub inversion: InversionConfig,
    /// Worker count; 1 means sequential.
    pub workers: usize,
    pub output_format: OutputFormat,
    pub failure_policy: FailurePolicy,
}

impl DdConfig {
    /// Validate every numeric knob. Does not touch the filesystem.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.workers == 0 {
            return Err(AppError::config("Worker count must be >= 1."));
        }
        if self.inversion.max_iterations == 0 {
            return Err(AppError::config("Maximum number of iterations must be >= 1."));
        }
        if self.inversion.nr_terms_decade == 0 {
            return Err(AppError::config("Number of terms per decade must be >= 1."));
        }
        if let ModelFormulation::Resistivity { c } = self.inversion.model {
            if !(c.is_finite() && c > 0.0) {
                return Err(AppError::config(format!(
                    "Cole-Cole exponent c must be finite and > 0, got {c}."
                )));
            }
        }
        if let LambdaPolicy::Fixed(lam) = self.prep.lambda {
            if !(lam.is_finite() && lam > 0.0) {
                return Err(AppError::config(format!(
                    "Fixed lambda must be finite and > 0, got {lam}."
                )));
            }
        }
        if let Some(norm) = self.prep.norm {
            if !(norm.is_finite() && norm > 0.0) {
                return Err(AppError::config(format!(
                    "Normalization value must be finite and > 0, got {norm}."
                )));
            }
        }
        for &x in &self.prep.tau_x {
            if !(x.is_finite() && (0.0..=1.0).contains(&x)) {
                return Err(AppError::config(format!(
                    "tau_x fractions must lie in [0, 1], got {x}."
                )));
            }
        }
        Ok(())
    }
}

/// Parse a `;`- or `,`-separated list of tau_x fractions, e.g. `0.2;0.35;0.6`.
pub fn parse_tau_x_list(s: &str) -> Result<Vec<f64>, AppError> {
    s.split([';', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<f64>()
                .map_err(|_| AppError::config(format!("Invalid tau_x fraction '{item}'.")))
        })
        .collect()
}

/// Parse a comma-separated list of frequency indices, e.g. `12,13,14`.
pub fn parse_index_list(s: &str) -> Result<Vec<usize>, AppError> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<usize>()
                .map_err(|_| AppError::config(format!("Invalid frequency index '{item}'.")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DdConfig {
        DdConfig {
            frequency_file: PathBuf::from("frequencies.dat"),
            data_file: PathBuf::from("data.dat"),
            output_dir: PathBuf::from("results"),
            prep: PrepConfig::default(),
            inversion: InversionConfig::default(),
            workers: 1,
            output_format: OutputFormat::AsciiAudit,
            failure_policy: FailurePolicy::AbortBatch,
        }
    }

    #[test]
    fn default_config_is_valid() {
        config().validate().unwrap();
    }

    #[test]
    fn zero_workers_is_a_config_error() {
        let mut cfg = config();
        cfg.workers = 0;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_fraction_and_bad_exponent() {
        let mut cfg = config();
        cfg.prep.tau_x = vec![0.2, 1.5];
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.inversion.model = ModelFormulation::Resistivity { c: 0.0 };
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.prep.lambda = LambdaPolicy::Fixed(-1.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_fraction_lists() {
        assert_eq!(parse_tau_x_list("0.2;0.35;0.6").unwrap(), vec![0.2, 0.35, 0.6]);
        assert_eq!(parse_tau_x_list("0.1, 0.9").unwrap(), vec![0.1, 0.9]);
        assert!(parse_tau_x_list("0.1;abc").is_err());
        assert_eq!(parse_index_list("12,13").unwrap(), vec![12, 13]);
    }
}
