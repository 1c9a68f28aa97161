//! Property-based tests for putt-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use proptest::prelude::*;
use putt_math::{
    binomial_log_pmf, central_log_mass, erf, erfc, gamma_p, gamma_q, half_cauchy_log_pdf,
    log1m_exp, log_binomial, log_gamma, log_gamma_pq, std_normal_cdf,
};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// log_gamma / log_binomial properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Recurrence: ln Γ(z+1) = ln Γ(z) + ln z.
    #[test]
    fn log_gamma_recurrence(z in 0.1..100.0f64) {
        let lhs = log_gamma(z + 1.0);
        let rhs = log_gamma(z) + z.ln();
        prop_assert!(approx_eq(lhs, rhs, 1e-8), "lgamma({})={} vs {}", z + 1.0, lhs, rhs);
    }

    /// Symmetry: C(n, k) = C(n, n-k).
    #[test]
    fn log_binomial_symmetric(n in 0u64..2000, frac in 0.0..=1.0f64) {
        let k = ((n as f64) * frac).floor() as u64;
        prop_assert!(approx_eq(log_binomial(n, k), log_binomial(n, n - k), 1e-8));
    }
}

// ============================================================================
// Incomplete gamma and normal properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// P + Q = 1 everywhere.
    #[test]
    fn gamma_p_plus_q_is_one(a in 0.1..20.0f64, x in 0.0..60.0f64) {
        let sum = gamma_p(a, x) + gamma_q(a, x);
        prop_assert!(approx_eq(sum, 1.0, 1e-9), "P+Q={} at a={} x={}", sum, a, x);
    }

    /// The log pair is consistent with the linear functions where they do not underflow.
    #[test]
    fn log_pair_consistent(a in 0.2..5.0f64, x in 0.001..30.0f64) {
        let (log_p, log_q) = log_gamma_pq(a, x);
        prop_assert!(log_p <= 0.0 && log_q <= 0.0);
        prop_assert!(approx_eq(log_p.exp(), gamma_p(a, x), 1e-9));
        prop_assert!(approx_eq(log_q.exp(), gamma_q(a, x), 1e-9));
    }

    /// erf is odd and erf + erfc = 1.
    #[test]
    fn erf_identities(x in -6.0..6.0f64) {
        prop_assert!(approx_eq(erf(-x), -erf(x), TOL));
        prop_assert!(approx_eq(erf(x) + erfc(x), 1.0, 1e-9));
    }

    /// Φ is monotone non-decreasing and bounded.
    #[test]
    fn normal_cdf_monotone(x in -8.0..8.0f64, dx in 1e-3..1.0f64) {
        let a = std_normal_cdf(x);
        let b = std_normal_cdf(x + dx);
        prop_assert!((0.0..=1.0).contains(&a));
        prop_assert!(b >= a, "Φ({})={} > Φ({})={}", x, a, x + dx, b);
    }

    /// Central and tail masses are complementary.
    #[test]
    fn central_mass_complementary(z in 0.0..30.0f64) {
        let (log_in, log_out) = central_log_mass(z);
        let total = log_in.exp() + log_out.exp();
        prop_assert!(approx_eq(total, 1.0, 1e-9), "mass={} at z={}", total, z);
    }

    /// log1m_exp(x) agrees with the naive formula where that is well conditioned.
    #[test]
    fn log1m_exp_naive(x in -30.0..-0.01f64) {
        prop_assert!(approx_eq(log1m_exp(x), (1.0 - x.exp()).ln(), 1e-9));
    }
}

// ============================================================================
// Density properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Half-Cauchy log density is decreasing on the positive half line.
    #[test]
    fn half_cauchy_decreasing(x in 1e-6..100.0f64, dx in 1e-3..10.0f64, scale in 0.1..10.0f64) {
        prop_assert!(half_cauchy_log_pdf(x + dx, scale) < half_cauchy_log_pdf(x, scale));
    }

    /// Binomial log pmf is never positive.
    #[test]
    fn binomial_log_pmf_bounded(n in 1u64..2000, frac in 0.0..=1.0f64, p in 0.0..=1.0f64) {
        let k = ((n as f64) * frac).floor() as u64;
        let lp = binomial_log_pmf(k, n, p);
        prop_assert!(lp <= 1e-9, "log pmf {} > 0", lp);
    }
}
