//! Success probability under Gaussian aiming error.
//!
//! With aim error `ε ~ N(0, σ²)` the putt drops when `|ε| < θ(x)`, so
//! `p(x, σ) = 2Φ(θ(x)/σ) - 1 = erf(θ / (σ√2))`.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_2_PI};

use putt_common::{DomainError, PhysicalConstants};
use putt_math::{central_log_mass, erf};

use super::geometry::capture_angle;

/// Reject sigma values that are not strictly positive and finite.
pub fn check_sigma(sigma: f64) -> Result<(), DomainError> {
    if sigma.is_finite() && sigma > 0.0 {
        Ok(())
    } else {
        Err(DomainError::NonPositiveSigma { sigma })
    }
}

/// Probability of holing a putt from `distance` inches with angular error
/// `sigma` radians.
pub fn success_probability(
    distance: f64,
    sigma: f64,
    constants: &PhysicalConstants,
) -> Result<f64, DomainError> {
    check_sigma(sigma)?;
    let angle = capture_angle(distance, constants)?;
    probability_from_angle(angle, sigma)
}

/// Success probability for a precomputed capture angle.
pub fn probability_from_angle(angle: f64, sigma: f64) -> Result<f64, DomainError> {
    check_sigma(sigma)?;
    Ok(erf(angle / sigma * FRAC_1_SQRT_2).clamp(0.0, 1.0))
}

/// `(ln p, ln(1 - p))` for a precomputed capture angle.
///
/// Computed directly in the log domain so that `ln(1 - p)` keeps its
/// precision when `p` is close to one (short putts) and `ln p` when `p` is
/// close to zero.
pub fn log_probabilities(angle: f64, sigma: f64) -> Result<(f64, f64), DomainError> {
    check_sigma(sigma)?;
    Ok(central_log_mass(angle / sigma))
}

/// Log of `dp/dz` at `z = θ/σ`: `ln(2φ(z)) = ½ln(2/π) - z²/2`.
pub(crate) fn log_dp_dz(z: f64) -> f64 {
    0.5 * FRAC_2_PI.ln() - 0.5 * z * z
}

/// Derivative of the success probability with respect to `ln σ`.
///
/// `dp/d(ln σ) = -z · 2φ(z)` with `z = θ/σ`; always negative.
pub fn dprob_dlog_sigma(angle: f64, sigma: f64) -> Result<f64, DomainError> {
    check_sigma(sigma)?;
    let z = angle / sigma;
    Ok(-z * log_dp_dz(z).exp())
}
