//! Multi-chain effective sample size.
//!
//! Autocovariances of all chains are combined with the between-chain
//! variance, and the autocorrelation sum is truncated with Geyer's initial
//! monotone sequence over pairs of consecutive lags.

use super::autocorr::autocovariance;

/// Chains shorter than this have no ESS estimate.
pub const MIN_DRAWS: usize = 4;

/// Effective sample size of the pooled draws.
///
/// Chains are truncated to the shortest one. `None` with fewer than
/// [`MIN_DRAWS`] draws per chain or when the pooled variance is zero.
pub fn effective_sample_size(chains: &[Vec<f64>]) -> Option<f64> {
    let m = chains.len();
    let n = chains.iter().map(Vec::len).min()?;
    if n < MIN_DRAWS {
        return None;
    }
    let chains: Vec<&[f64]> = chains.iter().map(|c| &c[..n]).collect();
    let means: Vec<f64> = chains
        .iter()
        .map(|c| c.iter().sum::<f64>() / n as f64)
        .collect();
    let mean_acov = |lag: usize| -> f64 {
        chains
            .iter()
            .zip(&means)
            .map(|(c, &mu)| autocovariance(c, lag, mu))
            .sum::<f64>()
            / m as f64
    };

    let nf = n as f64;
    let mean_var = mean_acov(0) * nf / (nf - 1.0);
    let mut var_plus = mean_var * (nf - 1.0) / nf;
    if m > 1 {
        let grand = means.iter().sum::<f64>() / m as f64;
        var_plus += means.iter().map(|mu| (mu - grand).powi(2)).sum::<f64>() / (m - 1) as f64;
    }
    if var_plus <= 0.0 || !var_plus.is_finite() {
        return None;
    }

    let rho = |lag: usize| 1.0 - (mean_var - mean_acov(lag)) / var_plus;
    let mut rho_hat = vec![0.0; n + 2];
    let mut rho_even = 1.0;
    let mut rho_odd = rho(1);
    rho_hat[0] = rho_even;
    rho_hat[1] = rho_odd;

    // Initial positive sequence
    let mut t = 1;
    while t + 5 < n && (rho_even + rho_odd) > 0.0 {
        rho_even = rho(t + 1);
        rho_odd = rho(t + 2);
        if rho_even + rho_odd >= 0.0 {
            rho_hat[t + 1] = rho_even;
            rho_hat[t + 2] = rho_odd;
        }
        t += 2;
    }
    let max_t = t;
    if rho_even > 0.0 {
        rho_hat[max_t + 1] = rho_even;
    }

    // Initial monotone sequence
    let mut t = 1;
    while t + 2 <= max_t {
        let previous = rho_hat[t - 1] + rho_hat[t];
        if rho_hat[t + 1] + rho_hat[t + 2] > previous {
            rho_hat[t + 1] = previous / 2.0;
            rho_hat[t + 2] = previous / 2.0;
        }
        t += 2;
    }

    let total = (m * n) as f64;
    let tau = -1.0 + 2.0 * rho_hat[..max_t].iter().sum::<f64>() + rho_hat[max_t + 1];
    let tau = tau.max(1.0 / total.log10());
    Some(total / tau)
}
