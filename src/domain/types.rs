//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the preprocessor, job builder and workers
//! - dumped into the audit header of the result files

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Representation of the two columns of an input spectrum.
///
/// `r` stands for resistance/resistivity and `c` for conductance/conductivity.
/// Phases are given in mrad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum DataFormat {
    #[serde(rename = "rmag_rpha")]
    #[value(name = "rmag_rpha")]
    RmagRpha,
    #[serde(rename = "log10rmag_rpha")]
    #[value(name = "log10rmag_rpha")]
    Log10RmagRpha,
    #[serde(rename = "lnrmag_rpha")]
    #[value(name = "lnrmag_rpha")]
    LnRmagRpha,
    #[serde(rename = "rre_rim")]
    #[value(name = "rre_rim")]
    RreRim,
    /// Real part and the negative imaginary part.
    #[serde(rename = "rre_rmim")]
    #[value(name = "rre_rmim")]
    RreRmim,
    #[serde(rename = "cmag_cpha")]
    #[value(name = "cmag_cpha")]
    CmagCpha,
    #[serde(rename = "cre_cim")]
    #[value(name = "cre_cim")]
    CreCim,
    #[serde(rename = "cre_cmim")]
    #[value(name = "cre_cmim")]
    CreCmim,
}

impl DataFormat {
    pub fn name(self) -> &'static str {
        match self {
            DataFormat::RmagRpha => "rmag_rpha",
            DataFormat::Log10RmagRpha => "log10rmag_rpha",
            DataFormat::LnRmagRpha => "lnrmag_rpha",
            DataFormat::RreRim => "rre_rim",
            DataFormat::RreRmim => "rre_rmim",
            DataFormat::CmagCpha => "cmag_cpha",
            DataFormat::CreCim => "cre_cim",
            DataFormat::CreCmim => "cre_cmim",
        }
    }
}

/// Which decomposition model to fit (CLI switch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Resistivity,
    Conductivity,
}

/// Decomposition formulation applied to one job. Exactly one per job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ModelFormulation {
    /// `rho(w) = rho0 - sum_k a_k [1 - 1 / (1 + (i w tau_k)^c)]`
    Resistivity { c: f64 },
    /// `sigma(w) = sigma0 + sum_k g_k (i w tau_k) / (1 + i w tau_k)`
    Conductivity,
}

impl Default for ModelFormulation {
    fn default() -> Self {
        ModelFormulation::Resistivity { c: 1.0 }
    }
}

impl ModelFormulation {
    pub fn from_kind(kind: ModelKind, c: f64) -> Self {
        match kind {
            ModelKind::Resistivity => ModelFormulation::Resistivity { c },
            ModelKind::Conductivity => ModelFormulation::Conductivity,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelFormulation::Resistivity { .. } => "resistivity",
            ModelFormulation::Conductivity => "conductivity",
        }
    }
}

/// How the regularization strength is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LambdaPolicy {
    /// Use the given lambda in every iteration.
    Fixed(f64),
    /// Search a log-spaced set of lambdas for the smallest imaginary-part RMS.
    Search,
}

/// How the tau range is derived from the data frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TauSelection {
    /// Tau limits follow the data frequency limits.
    Data,
    /// Extend the limits by `left` on the low-frequency side and `right` on
    /// the high-frequency side.
    DataExt { left: f64, right: f64 },
}

impl Default for TauSelection {
    fn default() -> Self {
        TauSelection::DataExt {
            left: 10.0,
            right: 10.0,
        }
    }
}

impl FromStr for TauSelection {
    type Err = AppError;

    /// Accepts `data`, `data_ext`, `data_ext:LEFT,RIGHT` and `LEFT,RIGHT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "data" => return Ok(TauSelection::Data),
            "data_ext" => return Ok(TauSelection::default()),
            _ => {}
        }
        let factors = s.strip_prefix("data_ext:").unwrap_or(s);
        let parts: Vec<&str> = factors.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(AppError::config(format!("Unknown tau selection strategy '{s}'.")));
        }
        let parse = |v: &str| -> Result<f64, AppError> {
            let x: f64 = v
                .parse()
                .map_err(|_| AppError::config(format!("Invalid tau extension factor '{v}'.")))?;
            if !(x.is_finite() && x >= 1.0) {
                return Err(AppError::config(format!(
                    "Tau extension factor must be finite and >= 1, got {x}."
                )));
            }
            Ok(x)
        };
        Ok(TauSelection::DataExt {
            left: parse(parts[0])?,
            right: parse(parts[1])?,
        })
    }
}

/// Output serialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Ascii,
    AsciiAudit,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Ascii => "ascii",
            OutputFormat::AsciiAudit => "ascii_audit",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" => Ok(OutputFormat::Ascii),
            "ascii_audit" => Ok(OutputFormat::AsciiAudit),
            other => Err(AppError::config(format!(
                "Output format \"{other}\" not recognized (expected ascii or ascii_audit)."
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to the batch when one job fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failing job aborts the whole batch.
    #[default]
    #[value(name = "abort")]
    AbortBatch,
    /// Every job runs; failures are reported next to the successful fits.
    #[value(name = "isolate")]
    Isolate,
}

/// Raw input: one shared frequency vector plus one row per spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    pub frequencies: Vec<f64>,
    /// Each row holds `2 * frequencies.len()` values: column 1 then column 2.
    pub rows: Vec<Vec<f64>>,
}

/// One prepared spectrum.
///
/// Invariant: `frequencies.len() == data.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// 0-based position in the input matrix.
    pub index: usize,
    pub frequencies: Vec<f64>,
    pub data: Vec<[f64; 2]>,
    pub norm_factor: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_rejects_unknown_flag() {
        assert_eq!("ascii".parse::<OutputFormat>().unwrap(), OutputFormat::Ascii);
        assert_eq!(
            "ascii_audit".parse::<OutputFormat>().unwrap(),
            OutputFormat::AsciiAudit
        );
        let err = "netcdf".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn tau_selection_parses_factor_pairs() {
        assert_eq!("data".parse::<TauSelection>().unwrap(), TauSelection::Data);
        assert_eq!(
            "10,100".parse::<TauSelection>().unwrap(),
            TauSelection::DataExt {
                left: 10.0,
                right: 100.0
            }
        );
        assert_eq!(
            "data_ext:2,3".parse::<TauSelection>().unwrap(),
            TauSelection::DataExt { left: 2.0, right: 3.0 }
        );
        assert!("0.5,10".parse::<TauSelection>().is_err());
        assert!("wide".parse::<TauSelection>().is_err());
    }
}
