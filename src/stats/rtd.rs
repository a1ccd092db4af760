//! Integrated parameters of a relaxation-time distribution.
//!
//! Every function takes the linear parameter vector `pars` (`pars[0]` = rho0,
//! `pars[1..]` = chargeability per tau bin), the tau grid and `s = log10(tau)`.
//!
//! None of these functions fail. Degenerate input (zero or undefined total
//! chargeability, empty grids, no peaks) is detected up front and the affected
//! values are NaN. Tau-valued order statistics are reported in log10, like
//! `tau_mean`; the matching frequencies are computed from the linear tau.

use crate::math::tau_to_frequency;

/// Chargeability part of `pars` (empty if `pars` is empty).
pub fn chargeabilities(pars: &[f64]) -> &[f64] {
    pars.get(1..).unwrap_or(&[])
}

/// `nansum(pars[1..])`: NaN entries count as zero.
///
/// The sum is NaN only when there are no non-NaN entries at all.
pub fn m_tot_linear(pars: &[f64]) -> f64 {
    let mut valid = false;
    let mut sum = 0.0;
    for &m in chargeabilities(pars).iter().filter(|m| !m.is_nan()) {
        valid = true;
        sum += m;
    }
    if valid { sum } else { f64::NAN }
}

/// The total chargeability if it can be used as a denominator.
fn usable_total(pars: &[f64]) -> Option<f64> {
    let total = m_tot_linear(pars);
    (total.is_finite() && total != 0.0).then_some(total)
}

fn log10_positive(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 { x.log10() } else { f64::NAN }
}

fn finite_or_nan(x: f64) -> f64 {
    if x.is_finite() { x } else { f64::NAN }
}

/// Frequency for a log10 relaxation time.
fn frequency_from_log10(s: f64) -> f64 {
    finite_or_nan(tau_to_frequency(10f64.powf(s)))
}

pub fn rho0(pars: &[f64]) -> f64 {
    pars.first().map_or(f64::NAN, |&r| log10_positive(r))
}

pub fn m_tot(pars: &[f64]) -> f64 {
    log10_positive(m_tot_linear(pars))
}

/// Total chargeability normalized by rho0, in log10.
pub fn m_tot_n(pars: &[f64]) -> f64 {
    match pars.first() {
        Some(&r0) if r0.is_finite() && r0 != 0.0 => log10_positive(m_tot_linear(pars) / r0),
        _ => f64::NAN,
    }
}

/// Per-bin chargeabilities in log10 (NaN for non-positive entries).
pub fn m_data(pars: &[f64]) -> Vec<f64> {
    chargeabilities(pars).iter().map(|&m| log10_positive(m)).collect()
}

/// Chargeability-weighted mean of `s` (log10 domain) and its frequency.
pub fn tau_mean(pars: &[f64], _tau: &[f64], s: &[f64]) -> (f64, f64) {
    let Some(total) = usable_total(pars) else {
        return (f64::NAN, f64::NAN);
    };
    let weighted: f64 = s
        .iter()
        .zip(chargeabilities(pars))
        .map(|(s, m)| s * m)
        .filter(|v| !v.is_nan())
        .sum();
    let tau_mean = finite_or_nan(weighted / total);
    if tau_mean.is_nan() {
        return (f64::NAN, f64::NAN);
    }
    (tau_mean, frequency_from_log10(tau_mean))
}

/// Chargeability-weighted mean of the linear relaxation times.
pub fn tau_arithmetic(pars: &[f64], tau: &[f64], _s: &[f64]) -> (f64, f64) {
    let Some(total) = usable_total(pars) else {
        return (f64::NAN, f64::NAN);
    };
    let weighted: f64 = tau
        .iter()
        .zip(chargeabilities(pars))
        .map(|(t, m)| t * m)
        .filter(|v| !v.is_nan())
        .sum();
    let tau_arithmetic = finite_or_nan(weighted / total);
    if tau_arithmetic.is_nan() || tau_arithmetic <= 0.0 {
        return (tau_arithmetic, f64::NAN);
    }
    (tau_arithmetic, finite_or_nan(tau_to_frequency(tau_arithmetic)))
}

/// Weighted geometric mean `(prod tau_i^m_i)^(1 / m_tot)`.
///
/// Evaluated in log space. Unlike the means above, a NaN chargeability makes
/// the product undefined.
pub fn tau_geometric(pars: &[f64], _tau: &[f64], s: &[f64]) -> (f64, f64) {
    let Some(total) = usable_total(pars) else {
        return (f64::NAN, f64::NAN);
    };
    let log_product: f64 = s.iter().zip(chargeabilities(pars)).map(|(s, m)| s * m).sum();
    let exponent = log_product / total;
    if !exponent.is_finite() {
        return (f64::NAN, f64::NAN);
    }
    let tau_geometric = finite_or_nan(10f64.powf(exponent));
    if tau_geometric.is_nan() || tau_geometric <= 0.0 {
        return (f64::NAN, f64::NAN);
    }
    (tau_geometric, finite_or_nan(tau_to_frequency(tau_geometric)))
}

/// Cumulative, normalized chargeability along the tau index.
///
/// Monotone non-decreasing and ending at 1 when all chargeabilities are
/// non-negative and none is NaN. All NaN if the total is degenerate.
pub fn cumulative_tau(pars: &[f64], _tau: &[f64], _s: &[f64]) -> Vec<f64> {
    let m = chargeabilities(pars);
    let Some(total) = usable_total(pars) else {
        return vec![f64::NAN; m.len()];
    };
    m.iter()
        .scan(0.0, |acc, &mi| {
            *acc += mi / total;
            Some(*acc)
        })
        .collect()
}

/// Index whose cumulative value is closest to `x`.
///
/// Stable: the first index attaining the minimum wins. NaN distances never
/// win; `None` if every distance is NaN.
pub fn tau_x_index(x: f64, pars: &[f64], tau: &[f64], s: &[f64]) -> Option<usize> {
    let cums = cumulative_tau(pars, tau, s);
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in cums.iter().enumerate().take(s.len().min(tau.len())) {
        let d = (c - x).abs();
        if d.is_nan() {
            continue;
        }
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Relaxation time (log10) and frequency at cumulative fraction `x`.
pub fn tau_x(x: f64, pars: &[f64], tau: &[f64], s: &[f64]) -> (f64, f64) {
    match tau_x_index(x, pars, tau, s) {
        Some(i) => (s[i], finite_or_nan(tau_to_frequency(tau[i]))),
        None => (f64::NAN, f64::NAN),
    }
}

/// Uniformity ratio `tau_10 / tau_60` on the reported (log10) values.
pub fn u_tau(pars: &[f64], tau: &[f64], s: &[f64]) -> f64 {
    let (tau_10, _) = tau_x(0.1, pars, tau, s);
    let (tau_60, _) = tau_x(0.6, pars, tau, s);
    finite_or_nan(tau_10 / tau_60)
}

/// Largest relaxation time of the grid (log10) and its frequency.
///
/// This is a property of the grid, not of the chargeabilities.
pub fn tau_max(_pars: &[f64], tau: &[f64], s: &[f64]) -> (f64, f64) {
    let mut best: Option<usize> = None;
    for (i, t) in tau.iter().enumerate().take(s.len()) {
        if t.is_nan() {
            continue;
        }
        match best {
            Some(b) if *t <= tau[b] => {}
            _ => best = Some(i),
        }
    }
    match best {
        Some(i) => (s[i], finite_or_nan(tau_to_frequency(tau[i]))),
        None => (f64::NAN, f64::NAN),
    }
}

/// Chargeability share per frequency decade.
#[derive(Debug, Clone, PartialEq)]
pub struct DecadeLoadings {
    /// One value per interval between consecutive edges.
    pub loadings: Vec<f64>,
    /// Powers of ten from `floor(log10 f_min)` to `ceil(log10 f_max)`.
    pub bins: Vec<f64>,
}

pub fn decade_loadings(pars: &[f64], tau: &[f64], _s: &[f64]) -> DecadeLoadings {
    let freqs: Vec<f64> = tau.iter().map(|&t| tau_to_frequency(t)).collect();
    if freqs.is_empty() || freqs.iter().any(|f| !(f.is_finite() && *f > 0.0)) {
        return DecadeLoadings {
            loadings: Vec::new(),
            bins: Vec::new(),
        };
    }

    let min_f = freqs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_f = freqs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lo = min_f.log10().floor() as i32;
    let hi = max_f.log10().ceil() as i32;
    let bins: Vec<f64> = (lo..=hi).map(|k| 10f64.powi(k)).collect();
    let n_bins = bins.len().saturating_sub(1).max(1);

    let mut loadings = vec![0.0; n_bins];
    for (f, &m) in freqs.iter().zip(chargeabilities(pars)) {
        // Lower edge inclusive; the top edge belongs to the last interval.
        let above = bins.partition_point(|&edge| edge <= *f);
        let bin = above.saturating_sub(1).min(n_bins - 1);
        loadings[bin] += m;
    }

    match usable_total(pars) {
        Some(total) => loadings.iter_mut().for_each(|l| *l /= total),
        None => loadings.iter_mut().for_each(|l| *l = f64::NAN),
    }

    DecadeLoadings { loadings, bins }
}

/// Indices of strict interior local maxima; boundary samples never qualify.
pub fn peak_indices(values: &[f64]) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    (1..values.len() - 1)
        .filter(|&i| values[i] > values[i - 1] && values[i] > values[i + 1])
        .collect()
}

/// Peaks of the distribution, lowest frequency (largest tau) first.
#[derive(Debug, Clone, PartialEq)]
pub struct TauPeaks {
    /// log10 relaxation times of all peaks.
    pub s_peaks: Vec<f64>,
    pub f_peaks: Vec<f64>,
}

impl TauPeaks {
    /// `(tau, f)` of the `nr`-th peak (1-based), NaN if there are fewer peaks.
    pub fn peak(&self, nr: usize) -> (f64, f64) {
        match nr.checked_sub(1) {
            Some(i) if i < self.s_peaks.len() => (self.s_peaks[i], self.f_peaks[i]),
            _ => (f64::NAN, f64::NAN),
        }
    }
}

pub fn tau_peaks(pars: &[f64], _tau: &[f64], s: &[f64]) -> TauPeaks {
    let m = chargeabilities(pars);
    let n = m.len().min(s.len());
    let mut indices = peak_indices(&m[..n]);
    indices.reverse();

    let s_peaks: Vec<f64> = indices.iter().map(|&i| s[i]).collect();
    let f_peaks = s_peaks.iter().map(|&sp| frequency_from_log10(sp)).collect();
    TauPeaks { s_peaks, f_peaks }
}
