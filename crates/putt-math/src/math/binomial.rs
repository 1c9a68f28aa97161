//! Binomial observation model for aggregated success counts.
//!
//! The likelihood of `k` successes in `n` attempts with success probability
//! `p` is `C(n, k) · p^k · (1-p)^(n-k)`. The binomial coefficient is included
//! so that log densities are properly normalized and comparable across
//! datasets.

use super::stable::log_binomial;

/// Log probability mass of `k` successes in `n` trials.
///
/// Returns NAN for `p` outside `[0, 1]` and `-inf` for `k > n`. The
/// conventions `0 · ln 0 = 0` apply at the boundaries, so `p = 0` with `k = 0`
/// (and `p = 1` with `k = n`) yields `0`.
pub fn binomial_log_pmf(k: u64, n: u64, p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    binomial_log_pmf_from_logs(k, n, p.ln(), (-p).ln_1p())
}

/// Log probability mass given `ln p` and `ln(1 - p)` directly.
///
/// Use this when the success probability comes from a log-domain
/// computation so that neither `p ≈ 0` nor `p ≈ 1` loses precision.
pub fn binomial_log_pmf_from_logs(k: u64, n: u64, log_p: f64, log_q: f64) -> f64 {
    if log_p.is_nan() || log_q.is_nan() {
        return f64::NAN;
    }
    if k > n {
        return f64::NEG_INFINITY;
    }
    let failures = n - k;
    let mut out = log_binomial(n, k);
    if k > 0 {
        out += k as f64 * log_p;
    }
    if failures > 0 {
        out += failures as f64 * log_q;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn known_small_values() {
        // P(k=2 | n=5, p=0.5) = 10/32
        assert!(approx_eq(binomial_log_pmf(2, 5, 0.5), (10.0f64 / 32.0).ln(), 1e-12));
        // P(k=0 | n=3, p=0.2) = 0.8^3
        assert!(approx_eq(binomial_log_pmf(0, 3, 0.2), 0.512f64.ln(), 1e-12));
    }

    #[test]
    fn pmf_sums_to_one() {
        let n = 40;
        let total: f64 = (0..=n).map(|k| binomial_log_pmf(k, n, 0.37).exp()).sum();
        assert!(approx_eq(total, 1.0, 1e-10), "sum={total}");
    }

    #[test]
    fn boundary_probabilities() {
        assert_eq!(binomial_log_pmf(0, 10, 0.0), 0.0);
        assert_eq!(binomial_log_pmf(10, 10, 1.0), 0.0);
        assert_eq!(binomial_log_pmf(1, 10, 0.0), f64::NEG_INFINITY);
        assert_eq!(binomial_log_pmf(9, 10, 1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn invalid_inputs() {
        assert!(binomial_log_pmf(1, 2, 1.5).is_nan());
        assert!(binomial_log_pmf(1, 2, -0.1).is_nan());
        assert!(binomial_log_pmf(1, 2, f64::NAN).is_nan());
        assert_eq!(binomial_log_pmf(3, 2, 0.5), f64::NEG_INFINITY);
    }

    #[test]
    fn log_variant_matches_linear_variant() {
        let p: f64 = 0.1694;
        let direct = binomial_log_pmf(100, 200, p);
        let via_logs = binomial_log_pmf_from_logs(100, 200, p.ln(), (1.0 - p).ln());
        assert!(approx_eq(direct, via_logs, 1e-10));
    }
}
