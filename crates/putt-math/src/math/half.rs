//! Half-line priors for a positive scale parameter.
//!
//! Both densities are normalized on `(0, ∞)` and return `-inf` for values
//! `<= 0`. Derivatives are with respect to the value itself.

use std::f64::consts::{LN_2, PI};

use super::stable::LOG_SQRT_2PI;

/// Log density of the half-Cauchy(0, scale) distribution.
///
/// `f(x) = 2 / (π · s · (1 + (x/s)²))` for x > 0.
pub fn half_cauchy_log_pdf(x: f64, scale: f64) -> f64 {
    if x.is_nan() || scale.is_nan() || scale <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 || x.is_infinite() {
        return f64::NEG_INFINITY;
    }
    let r = x / scale;
    LN_2 - (PI * scale).ln() - (r * r).ln_1p()
}

/// d/dx of [`half_cauchy_log_pdf`]: `-2x / (s² + x²)`.
pub fn half_cauchy_dlog_pdf(x: f64, scale: f64) -> f64 {
    -2.0 * x / (scale * scale + x * x)
}

/// Log density of the half-Normal(0, scale) distribution.
///
/// `f(x) = 2 / (s·√(2π)) · exp(-x² / 2s²)` for x > 0.
pub fn half_normal_log_pdf(x: f64, scale: f64) -> f64 {
    if x.is_nan() || scale.is_nan() || scale <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 || x.is_infinite() {
        return f64::NEG_INFINITY;
    }
    let r = x / scale;
    LN_2 - LOG_SQRT_2PI - scale.ln() - 0.5 * r * r
}

/// d/dx of [`half_normal_log_pdf`]: `-x / s²`.
pub fn half_normal_dlog_pdf(x: f64, scale: f64) -> f64 {
    -x / (scale * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    /// Trapezoid integral of exp(log_pdf) over (0, upper].
    fn integrate(log_pdf: impl Fn(f64) -> f64, upper: f64, steps: usize) -> f64 {
        let h = upper / steps as f64;
        let mut total = 0.0;
        for i in 1..=steps {
            let a = (i - 1) as f64 * h;
            let b = i as f64 * h;
            let fa = if a == 0.0 { log_pdf(1e-12).exp() } else { log_pdf(a).exp() };
            total += 0.5 * h * (fa + log_pdf(b).exp());
        }
        total
    }

    #[test]
    fn half_cauchy_golden_value() {
        // 2 / (pi * 2.5 * (1 + 0.02^2))
        let expected = (2.0 / (PI * 2.5 * (1.0 + 0.02f64.powi(2)))).ln();
        assert!(approx_eq(half_cauchy_log_pdf(0.05, 2.5), expected, 1e-14));
    }

    #[test]
    fn half_cauchy_mass_up_to_scale_is_half() {
        // CDF of the half-Cauchy at its scale is (2/π)·atan(1) = 1/2.
        let mass = integrate(|x| half_cauchy_log_pdf(x, 2.5), 2.5, 20_000);
        assert!(approx_eq(mass, 0.5, 1e-6), "mass={mass}");
    }

    #[test]
    fn half_normal_integrates_to_one() {
        let mass = integrate(|x| half_normal_log_pdf(x, 0.7), 10.0, 20_000);
        assert!(approx_eq(mass, 1.0, 1e-6), "mass={mass}");
    }

    #[test]
    fn non_positive_values_have_zero_density() {
        for x in [0.0, -1.0, f64::NEG_INFINITY] {
            assert_eq!(half_cauchy_log_pdf(x, 2.5), f64::NEG_INFINITY);
            assert_eq!(half_normal_log_pdf(x, 1.0), f64::NEG_INFINITY);
        }
        assert!(half_cauchy_log_pdf(1.0, 0.0).is_nan());
        assert!(half_normal_log_pdf(1.0, -1.0).is_nan());
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-6;
        for x in [0.01, 0.3, 2.0, 7.5] {
            let fd = (half_cauchy_log_pdf(x + h, 2.5) - half_cauchy_log_pdf(x - h, 2.5)) / (2.0 * h);
            assert!(approx_eq(half_cauchy_dlog_pdf(x, 2.5), fd, 1e-6), "x={x}");

            let fd = (half_normal_log_pdf(x + h, 1.3) - half_normal_log_pdf(x - h, 1.3)) / (2.0 * h);
            assert!(approx_eq(half_normal_dlog_pdf(x, 1.3), fd, 1e-6), "x={x}");
        }
    }
}
