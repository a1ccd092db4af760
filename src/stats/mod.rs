//! RTD statistics engine.
//!
//! Maps `(pars, tau, s)` to a fully populated `RtdStats` record. The engine is
//! injected into the inversion as a per-iteration callback; it never fails and
//! reports undefined values as NaN.

pub mod rtd;

use serde::Serialize;

pub use rtd::*;

/// Per-iteration statistics callback `(pars, tau, s) -> RtdStats`.
pub type StatsCallback = Box<dyn Fn(&[f64], &[f64], &[f64]) -> RtdStats + Send + Sync>;

/// One requested cumulative fraction and its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TauXStat {
    pub fraction: f64,
    /// log10 relaxation time.
    pub tau: f64,
    pub f: f64,
}

impl TauXStat {
    /// Output suffix, e.g. `35.0` for a fraction of 0.35.
    pub fn label(&self) -> String {
        format!("{:.1}", self.fraction * 100.0)
    }
}

/// All integrated parameters of one fitted distribution.
///
/// Every field is always present; undefined values are NaN and undefined
/// arrays are empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RtdStats {
    pub rho0: f64,
    pub m_tot: f64,
    pub m_tot_n: f64,
    pub tau_mean: f64,
    pub f_mean: f64,
    pub tau_arithmetic: f64,
    pub f_arithmetic: f64,
    pub tau_geometric: f64,
    pub f_geometric: f64,
    pub tau_50: f64,
    pub f_50: f64,
    pub tau_x: Vec<TauXStat>,
    pub u_tau: f64,
    pub tau_max: f64,
    pub f_max: f64,
    pub tau_peak1: f64,
    pub f_peak1: f64,
    pub tau_peak2: f64,
    pub f_peak2: f64,
    pub tau_peaks_all: Vec<f64>,
    pub f_peaks_all: Vec<f64>,
    pub decade_loadings: Vec<f64>,
    pub decade_bins: Vec<f64>,
    pub m_data: Vec<f64>,
}

/// A named statistics entry as exposed to writers.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Scalar(f64),
    Array(Vec<f64>),
}

impl RtdStats {
    /// Record with every entry undefined, for inputs that violate the
    /// `pars.len() == tau.len() + 1` contract.
    pub fn undefined(fractions: &[f64]) -> Self {
        let nan = f64::NAN;
        Self {
            rho0: nan,
            m_tot: nan,
            m_tot_n: nan,
            tau_mean: nan,
            f_mean: nan,
            tau_arithmetic: nan,
            f_arithmetic: nan,
            tau_geometric: nan,
            f_geometric: nan,
            tau_50: nan,
            f_50: nan,
            tau_x: fractions
                .iter()
                .map(|&fraction| TauXStat {
                    fraction,
                    tau: nan,
                    f: nan,
                })
                .collect(),
            u_tau: nan,
            tau_max: nan,
            f_max: nan,
            tau_peak1: nan,
            f_peak1: nan,
            tau_peak2: nan,
            f_peak2: nan,
            tau_peaks_all: Vec::new(),
            f_peaks_all: Vec::new(),
            decade_loadings: Vec::new(),
            decade_bins: Vec::new(),
            m_data: Vec::new(),
        }
    }

    /// Scalar entries in output order.
    pub fn scalars(&self) -> Vec<(String, f64)> {
        let mut out = vec![
            ("rho0".to_string(), self.rho0),
            ("m_tot".to_string(), self.m_tot),
            ("m_tot_n".to_string(), self.m_tot_n),
            ("tau_mean".to_string(), self.tau_mean),
            ("f_mean".to_string(), self.f_mean),
            ("tau_arithmetic".to_string(), self.tau_arithmetic),
            ("f_arithmetic".to_string(), self.f_arithmetic),
            ("tau_geometric".to_string(), self.tau_geometric),
            ("f_geometric".to_string(), self.f_geometric),
            ("tau_50".to_string(), self.tau_50),
            ("f_50".to_string(), self.f_50),
        ];
        for tx in &self.tau_x {
            out.push((format!("tau_x_{}", tx.label()), tx.tau));
            out.push((format!("f_x_{}", tx.label()), tx.f));
        }
        out.extend([
            ("U_tau".to_string(), self.u_tau),
            ("tau_max".to_string(), self.tau_max),
            ("f_max".to_string(), self.f_max),
            ("tau_peak1".to_string(), self.tau_peak1),
            ("f_peak1".to_string(), self.f_peak1),
            ("tau_peak2".to_string(), self.tau_peak2),
            ("f_peak2".to_string(), self.f_peak2),
        ]);
        out
    }

    /// All entries (scalars first, then arrays) in output order.
    pub fn entries(&self) -> Vec<(String, StatValue)> {
        let mut out: Vec<(String, StatValue)> = self
            .scalars()
            .into_iter()
            .map(|(name, v)| (name, StatValue::Scalar(v)))
            .collect();
        out.extend([
            ("tau_peaks_all".to_string(), StatValue::Array(self.tau_peaks_all.clone())),
            ("f_peaks_all".to_string(), StatValue::Array(self.f_peaks_all.clone())),
            ("decade_loadings".to_string(), StatValue::Array(self.decade_loadings.clone())),
            ("decade_bins".to_string(), StatValue::Array(self.decade_bins.clone())),
            ("m_data".to_string(), StatValue::Array(self.m_data.clone())),
        ]);
        out
    }
}

/// Compute every statistic for one parameter vector.
///
/// `fractions` are the additional cumulative fractions reported as `tau_x_*`.
pub fn compute_stats(pars: &[f64], tau: &[f64], s: &[f64], fractions: &[f64]) -> RtdStats {
    if pars.len() != tau.len() + 1 || tau.len() != s.len() {
        return RtdStats::undefined(fractions);
    }

    let (tau_mean, f_mean) = rtd::tau_mean(pars, tau, s);
    let (tau_arithmetic, f_arithmetic) = rtd::tau_arithmetic(pars, tau, s);
    let (tau_geometric, f_geometric) = rtd::tau_geometric(pars, tau, s);
    let (tau_50, f_50) = rtd::tau_x(0.5, pars, tau, s);
    let tau_x = fractions
        .iter()
        .map(|&fraction| {
            let (t, f) = rtd::tau_x(fraction, pars, tau, s);
            TauXStat { fraction, tau: t, f }
        })
        .collect();
    let (tau_max, f_max) = rtd::tau_max(pars, tau, s);
    let peaks = rtd::tau_peaks(pars, tau, s);
    let (tau_peak1, f_peak1) = peaks.peak(1);
    let (tau_peak2, f_peak2) = peaks.peak(2);
    let loadings = rtd::decade_loadings(pars, tau, s);

    RtdStats {
        rho0: rtd::rho0(pars),
        m_tot: rtd::m_tot(pars),
        m_tot_n: rtd::m_tot_n(pars),
        tau_mean,
        f_mean,
        tau_arithmetic,
        f_arithmetic,
        tau_geometric,
        f_geometric,
        tau_50,
        f_50,
        tau_x,
        u_tau: rtd::u_tau(pars, tau, s),
        tau_max,
        f_max,
        tau_peak1,
        f_peak1,
        tau_peak2,
        f_peak2,
        tau_peaks_all: peaks.s_peaks,
        f_peaks_all: peaks.f_peaks,
        decade_loadings: loadings.loadings,
        decade_bins: loadings.bins,
        m_data: rtd::m_data(pars),
    }
}

/// Build the callback handed to the inversion engine.
pub fn stats_callback(fractions: Vec<f64>) -> StatsCallback {
    Box::new(move |pars: &[f64], tau: &[f64], s: &[f64]| compute_stats(pars, tau, s, &fractions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_fully_populated_for_a_degenerate_fit() {
        let tau = [1e-3, 1e-2, 1e-1];
        let s = [-3.0, -2.0, -1.0];
        let stats = compute_stats(&[50.0, 0.0, 0.0, 0.0], &tau, &s, &[0.2, 0.35]);

        assert!((stats.rho0 - 50f64.log10()).abs() < 1e-12);
        assert!(stats.tau_mean.is_nan());
        assert!(stats.tau_50.is_nan());
        assert!(stats.tau_peak1.is_nan());
        assert_eq!(stats.tau_max, -1.0);

        let names: Vec<String> = stats.scalars().into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"tau_x_20.0".to_string()));
        assert!(names.contains(&"f_x_35.0".to_string()));
        assert!(names.contains(&"U_tau".to_string()));
        assert_eq!(stats.entries().len(), names.len() + 5);
    }

    #[test]
    fn contract_violation_yields_undefined_record() {
        let stats = compute_stats(&[1.0, 2.0], &[1e-3, 1e-2], &[-3.0, -2.0], &[0.6]);
        assert!(stats.rho0.is_nan());
        assert_eq!(stats.tau_x.len(), 1);
        assert!(stats.tau_x[0].tau.is_nan());
    }

    #[test]
    fn callback_captures_configured_fractions() {
        let cb = stats_callback(vec![0.2, 0.6]);
        let tau = [1e-3, 1e-2, 1e-1];
        let s = [-3.0, -2.0, -1.0];
        let stats = cb(&[10.0, 1.0, 3.0, 2.0], &tau, &s);
        assert_eq!(stats.tau_x.len(), 2);
        assert_eq!(stats.tau_50, -2.0);
        assert_eq!(stats.tau_peak1, -2.0);
    }
}
