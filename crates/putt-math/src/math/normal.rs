//! Standard normal distribution functions.
//!
//! Everything here is derived from the incomplete gamma identity
//! `erf(x) = P(1/2, x²)` for x >= 0, which gives the error function, the
//! CDF, and the two-sided mass `P(|Z| <= z)` with one shared kernel.

use super::gamma::{gamma_p, gamma_q, log_gamma_pq};
use super::stable::LOG_SQRT_2PI;

/// Error function.
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x < 0.0 {
        return -erf(-x);
    }
    gamma_p(0.5, x * x)
}

/// Complementary error function, 1 - erf(x), without cancellation for x > 0.
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x < 0.0 {
        return 1.0 + erf(-x);
    }
    gamma_q(0.5, x * x)
}

/// Standard normal CDF: Φ(x) = erfc(-x/√2) / 2.
pub fn std_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * std::f64::consts::FRAC_1_SQRT_2)
}

/// Log density of the standard normal at x.
pub fn std_normal_log_pdf(x: f64) -> f64 {
    -0.5 * x * x - LOG_SQRT_2PI
}

/// Log of the central and tail mass of a standard normal at half-width `z`.
///
/// Returns `(ln P(|Z| <= z), ln P(|Z| > z))`. The first entry equals
/// `ln(2Φ(z) - 1)` and the second `ln(2 - 2Φ(z))`; both stay accurate in their
/// respective tails. `z` must be non-negative.
pub fn central_log_mass(z: f64) -> (f64, f64) {
    if z.is_nan() || z < 0.0 {
        return (f64::NAN, f64::NAN);
    }
    log_gamma_pq(0.5, 0.5 * z * z)
}
