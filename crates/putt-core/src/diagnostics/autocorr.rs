//! Autocovariance and autocorrelation of a single chain.

/// Biased (divide-by-n) autocovariance at `lag` around `mean`.
///
/// Returns 0 for lags at or beyond the chain length.
pub fn autocovariance(chain: &[f64], lag: usize, mean: f64) -> f64 {
    let n = chain.len();
    if lag >= n {
        return 0.0;
    }
    let sum: f64 = chain[..n - lag]
        .iter()
        .zip(&chain[lag..])
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum();
    sum / n as f64
}

/// Autocorrelation at lags `0..=min(max_lag, n - 1)`.
///
/// Empty for an empty or constant chain, where it is undefined.
pub fn autocorrelation(chain: &[f64], max_lag: usize) -> Vec<f64> {
    if chain.is_empty() {
        return Vec::new();
    }
    let mean = chain.iter().sum::<f64>() / chain.len() as f64;
    let var = autocovariance(chain, 0, mean);
    if var <= 0.0 || !var.is_finite() {
        return Vec::new();
    }
    let last = max_lag.min(chain.len() - 1);
    (0..=last)
        .map(|lag| autocovariance(chain, lag, mean) / var)
        .collect()
}
