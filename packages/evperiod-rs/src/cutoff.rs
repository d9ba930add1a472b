//! Pole placement for the two-stage reconstruction filter.
//!
//! The reconstructor cascades a detrending stage
//! `H_α(z) = (z - 1) / (z - α)` with a unit-DC-gain smoothing stage
//! `H_β(z) = (1 - β) z / (z - β)`. Both poles are derived from a single
//! cutoff period `T`, measured in events, via `ω_cut = 2π / T`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{EvPeriodError, Result};

/// Pole coefficients of the two IIR stages, both strictly inside (0, 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoleParameters {
    /// Pole of the detrending (difference) stage
    pub alpha: f64,
    /// Pole of the smoothing (low-pass) stage
    pub beta: f64,
}

impl PoleParameters {
    /// Solve both poles for a cutoff period `T` (in events).
    ///
    /// Fails for non-finite `T` or `T` below [`MIN_CUTOFF_PERIOD`], and when
    /// `T` is so long that the poles round to 1.
    pub fn for_cutoff_period(cutoff_period: f64) -> Result<Self> {
        let alpha = compute_alpha_for_cutoff(cutoff_period)?;
        let beta = compute_beta_for_cutoff(cutoff_period)?;
        Self::new(alpha, beta)
    }

    /// Use explicit poles. Both must lie strictly inside (0, 1).
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        let inside = |p: f64| p > 0.0 && p < 1.0;
        if !inside(alpha) || !inside(beta) {
            return Err(EvPeriodError::UnstablePoles { alpha, beta });
        }
        Ok(Self { alpha, beta })
    }
}

/// Shortest cutoff period, in events per cycle, with a unique pole pair.
///
/// Below it `cos(2π/T)` folds back: `T` and `T / (T - 1)` give the same poles.
pub const MIN_CUTOFF_PERIOD: f64 = 2.0;

pub(crate) fn check_cutoff_period(cutoff_period: f64) -> Result<()> {
    if !cutoff_period.is_finite() || cutoff_period < MIN_CUTOFF_PERIOD {
        return Err(EvPeriodError::InvalidCutoffPeriod(cutoff_period));
    }
    Ok(())
}

/// Periods beyond about 5.7e16 round the poles to exactly 1 and are
/// rejected later as [`EvPeriodError::UnstablePoles`].
fn cutoff_omega(cutoff_period: f64) -> Result<f64> {
    check_cutoff_period(cutoff_period)?;
    Ok(2.0 * PI / cutoff_period)
}

/// Smaller root of `p² - 2(2 - cos ω)p + 1 = 0`.
///
/// Evaluated as `1 + d - sqrt(d (d + 2))` with `d = 1 - cos ω = 2 sin²(ω/2)`
/// so that long cutoff periods do not round the pole up to exactly 1.
fn half_power_pole(omega: f64) -> f64 {
    let s = (0.5 * omega).sin();
    let d = 2.0 * s * s;
    1.0 + d - (d * (d + 2.0)).sqrt()
}

/// Detrending pole: `α = 2 - cos ω_cut - sqrt(3 - 4 cos ω_cut + cos² ω_cut)`.
pub fn compute_alpha_for_cutoff(cutoff_period: f64) -> Result<f64> {
    Ok(half_power_pole(cutoff_omega(cutoff_period)?))
}

/// Smoothing pole: the root in (0, 1) of `|H_β(ω_cut)|² = 1/2`.
///
/// With `(1-β)² / (1 + β² - 2β cos ω) = 1/2` the equation reduces to
/// `β² - 2(2 - cos ω)β + 1 = 0`, the same quadratic that fixes `α`. Equal
/// poles put the cascade's response peak exactly on `ω_cut`.
pub fn compute_beta_for_cutoff(cutoff_period: f64) -> Result<f64> {
    Ok(half_power_pole(cutoff_omega(cutoff_period)?))
}

/// `|H_α(ω)|²` of the detrending stage
pub fn detrend_response_sq(omega: f64, alpha: f64) -> f64 {
    let c = omega.cos();
    (2.0 - 2.0 * c) / (1.0 - 2.0 * alpha * c + alpha * alpha)
}

/// `|H_β(ω)|²` of the smoothing stage (unit gain at DC)
pub fn smoothing_response_sq(omega: f64, beta: f64) -> f64 {
    let one_minus = 1.0 - beta;
    one_minus * one_minus / (1.0 + beta * beta - 2.0 * beta * omega.cos())
}

/// Squared magnitude response of the full cascade
pub fn cascade_response_sq(omega: f64, poles: &PoleParameters) -> f64 {
    detrend_response_sq(omega, poles.alpha) * smoothing_response_sq(omega, poles.beta)
}

/// Cosine of the angular frequency where the cascade response peaks
pub fn cascade_peak_cos_omega(poles: &PoleParameters) -> f64 {
    let a = poles.alpha + 1.0 / poles.alpha;
    let b = poles.beta + 1.0 / poles.beta;
    // both factors are <= 0 because a, b >= 2
    let radicand = ((1.0 - 0.5 * a) * (1.0 - 0.5 * b)).max(0.0);
    (1.0 - radicand.sqrt()).clamp(-1.0, 1.0)
}

/// Summary of the cascade's frequency response for one cutoff period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResponse {
    pub cutoff_period: f64,
    pub poles: PoleParameters,
    /// `2π / T`
    pub cutoff_omega: f64,
    /// Angular frequency of the response peak
    pub peak_omega: f64,
    /// Period (in events) at the response peak
    pub peak_period: f64,
    /// `|H(ω_cut)|² / |H(ω_peak)|²`
    pub relative_response_at_cutoff: f64,
    pub detrend_response_sq_at_cutoff: f64,
    pub smoothing_response_sq_at_cutoff: f64,
}

impl FrequencyResponse {
    pub fn for_cutoff_period(cutoff_period: f64) -> Result<Self> {
        let poles = PoleParameters::for_cutoff_period(cutoff_period)?;
        Self::for_poles(cutoff_period, poles)
    }

    pub fn for_poles(cutoff_period: f64, poles: PoleParameters) -> Result<Self> {
        let cutoff_omega = cutoff_omega(cutoff_period)?;
        let peak_omega = cascade_peak_cos_omega(&poles).acos();
        let peak_period = if peak_omega > 0.0 {
            2.0 * PI / peak_omega
        } else {
            f64::INFINITY
        };
        let peak = cascade_response_sq(peak_omega, &poles);
        let at_cutoff = cascade_response_sq(cutoff_omega, &poles);
        Ok(Self {
            cutoff_period,
            poles,
            cutoff_omega,
            peak_omega,
            peak_period,
            relative_response_at_cutoff: at_cutoff / peak,
            detrend_response_sq_at_cutoff: detrend_response_sq(cutoff_omega, poles.alpha),
            smoothing_response_sq_at_cutoff: smoothing_response_sq(cutoff_omega, poles.beta),
        })
    }
}
