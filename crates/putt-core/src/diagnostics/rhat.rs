//! Split potential scale reduction factor.

use putt_math::sample::{mean, variance};
use serde::{Deserialize, Serialize};

/// Why R-hat could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhatUndefinedReason {
    /// Fewer than two draws in a half-chain.
    TooFewDraws,
    /// Every half-chain is constant.
    ZeroWithinVariance,
}

impl std::fmt::Display for RhatUndefinedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RhatUndefinedReason::TooFewDraws => write!(f, "fewer than 2 draws per half-chain"),
            RhatUndefinedReason::ZeroWithinVariance => write!(f, "zero within-chain variance"),
        }
    }
}

/// Split R-hat: each chain is cut into a first and last half (the middle
/// draw of an odd-length chain is dropped) and the halves are compared as
/// separate chains. Chains are truncated to the shortest one.
pub fn split_rhat(chains: &[Vec<f64>]) -> Result<f64, RhatUndefinedReason> {
    let n = chains.iter().map(Vec::len).min().unwrap_or(0);
    let half = n / 2;
    if half < 2 {
        return Err(RhatUndefinedReason::TooFewDraws);
    }
    let halves: Vec<&[f64]> = chains
        .iter()
        .flat_map(|c| [&c[..half], &c[n - half..n]])
        .collect();

    let means: Vec<f64> = halves.iter().map(|h| mean(h)).collect();
    let within = halves.iter().map(|h| variance(h)).sum::<f64>() / halves.len() as f64;
    if within <= 0.0 || !within.is_finite() {
        return Err(RhatUndefinedReason::ZeroWithinVariance);
    }
    // B / n: variance of the half-chain means
    let between = variance(&means);
    let h = half as f64;
    let var_plus = (h - 1.0) / h * within + between;
    Ok((var_plus / within).sqrt())
}
