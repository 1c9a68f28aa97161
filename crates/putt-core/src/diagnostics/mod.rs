//! Convergence diagnostics over the retained draws of all chains.
//!
//! Everything here is read-only over [`PosteriorDraws`]. Problems are
//! reported as [`ConvergenceWarning`]s on the [`DiagnosticReport`]; they
//! never fail the run.
//!
//! - [`ess`]: multi-chain effective sample size (Geyer initial monotone)
//! - [`rhat`]: split R-hat
//! - [`autocorr`]: per-chain autocorrelation
//! - [`transitions`]: divergences, tree depth saturation, E-BFMI

pub mod autocorr;
pub mod ess;
pub mod rhat;
pub mod transitions;

pub use autocorr::autocorrelation;
pub use ess::effective_sample_size;
pub use rhat::{split_rhat, RhatUndefinedReason};
pub use transitions::{
    chain_ebfmi, ebfmi, summarize_transitions, ChainEbfmi, DivergenceSummary, DrawLocation,
    TransitionSummary, TreedepthSummary,
};

use putt_common::Error;
use putt_config::DiagnosticsConfig;
use putt_math::sample::{mean, quantile_sorted, variance};
use serde::{Deserialize, Serialize};

use crate::model::sigma_degrees;
use crate::sampler::PosteriorDraws;

/// Mean, standard deviation, and the 5/50/95% quantiles of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    pub mean: f64,
    /// `None` for a single draw.
    pub sd: Option<f64>,
    pub q05: f64,
    pub q50: f64,
    pub q95: f64,
}

impl PosteriorSummary {
    /// `None` for an empty sample.
    pub fn from_draws(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let var = variance(values);
        Some(Self {
            mean: mean(values),
            sd: var.is_finite().then(|| var.sqrt()),
            q05: quantile_sorted(&sorted, 0.05),
            q50: quantile_sorted(&sorted, 0.5),
            q95: quantile_sorted(&sorted, 0.95),
        })
    }
}

/// Diagnostics of the sampled parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDiagnostics {
    pub summary: PosteriorSummary,
    pub ess: Option<f64>,
    /// ESS divided by the number of retained draws.
    pub ess_ratio: Option<f64>,
    pub rhat: Option<f64>,
    /// Monte Carlo standard error of the mean, `sd / sqrt(ESS)`.
    pub mcse_mean: Option<f64>,
    /// Autocorrelation of each chain, lag 0 first.
    pub autocorrelation: Vec<Vec<f64>>,
}

/// A convergence problem. Attached to the report; never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConvergenceWarning {
    HighRhat {
        rhat: f64,
        threshold: f64,
    },
    RhatUndefined {
        reason: RhatUndefinedReason,
    },
    LowEssRatio {
        ess: f64,
        ess_ratio: f64,
        threshold: f64,
    },
    Divergences {
        count: usize,
        locations: Vec<DrawLocation>,
    },
    TreedepthSaturated {
        count: usize,
        max_tree_depth: u32,
    },
    LowEbfmi {
        chain: usize,
        ebfmi: f64,
        threshold: f64,
    },
}

impl std::fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvergenceWarning::HighRhat { rhat, threshold } => {
                write!(f, "R-hat {rhat:.4} exceeds {threshold}; chains have not mixed")
            }
            ConvergenceWarning::RhatUndefined { reason } => {
                write!(f, "R-hat undefined: {reason}")
            }
            ConvergenceWarning::LowEssRatio {
                ess,
                ess_ratio,
                threshold,
            } => write!(
                f,
                "effective sample size {ess:.1} is {:.1}% of the draws (below {:.1}%)",
                ess_ratio * 100.0,
                threshold * 100.0
            ),
            ConvergenceWarning::Divergences { count, locations } => {
                write!(f, "{count} divergent transitions after warm-up")?;
                if let Some(first) = locations.first() {
                    write!(f, " (first: chain {} iteration {})", first.chain, first.iteration)?;
                }
                Ok(())
            }
            ConvergenceWarning::TreedepthSaturated {
                count,
                max_tree_depth,
            } => write!(
                f,
                "{count} transitions hit the maximum tree depth {max_tree_depth}"
            ),
            ConvergenceWarning::LowEbfmi {
                chain,
                ebfmi,
                threshold,
            } => write!(f, "chain {chain}: E-BFMI {ebfmi:.3} below {threshold}"),
        }
    }
}

/// Full diagnostic report of one fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub total_draws: usize,
    pub chains: usize,
    pub draws_per_chain: Vec<usize>,
    pub sigma: ParameterDiagnostics,
    /// Summary of `sigma` converted to degrees.
    pub sigma_degrees: PosteriorSummary,
    pub transitions: TransitionSummary,
    pub ebfmi: Vec<ChainEbfmi>,
    pub warnings: Vec<ConvergenceWarning>,
    pub thresholds: DiagnosticsConfig,
}

impl DiagnosticReport {
    pub fn is_converged(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Diagnose the retained draws against `thresholds`.
pub fn diagnose(
    draws: &PosteriorDraws,
    thresholds: &DiagnosticsConfig,
) -> Result<DiagnosticReport, Error> {
    let by_chain = draws.sigma_by_chain();
    let all = draws.all_sigma();
    let summary = PosteriorSummary::from_draws(&all)
        .ok_or_else(|| Error::Sampler("no retained draws to diagnose".to_string()))?;
    let degrees: Vec<f64> = all.iter().copied().map(sigma_degrees).collect();
    let sigma_degrees = PosteriorSummary::from_draws(&degrees)
        .ok_or_else(|| Error::Sampler("no retained draws to diagnose".to_string()))?;

    let total = all.len();
    let ess = effective_sample_size(&by_chain);
    let ess_ratio = ess.map(|e| e / total as f64);
    let rhat = split_rhat(&by_chain);
    let mcse_mean = match (summary.sd, ess) {
        (Some(sd), Some(ess)) if ess > 0.0 => Some(sd / ess.sqrt()),
        _ => None,
    };
    let autocorrelation = by_chain
        .iter()
        .map(|c| autocorrelation(c, thresholds.max_lag))
        .collect();

    let transitions = summarize_transitions(draws);
    let ebfmi = chain_ebfmi(draws);

    let mut warnings = Vec::new();
    match rhat {
        Ok(r) if r > thresholds.rhat_threshold => warnings.push(ConvergenceWarning::HighRhat {
            rhat: r,
            threshold: thresholds.rhat_threshold,
        }),
        Ok(_) => {}
        Err(reason) => warnings.push(ConvergenceWarning::RhatUndefined { reason }),
    }
    if let (Some(ess), Some(ratio)) = (ess, ess_ratio) {
        if ratio < thresholds.ess_ratio_threshold {
            warnings.push(ConvergenceWarning::LowEssRatio {
                ess,
                ess_ratio: ratio,
                threshold: thresholds.ess_ratio_threshold,
            });
        }
    }
    if transitions.divergences.count > 0 {
        warnings.push(ConvergenceWarning::Divergences {
            count: transitions.divergences.count,
            locations: transitions.divergences.locations.clone(),
        });
    }
    if transitions.treedepth.saturated > 0 {
        warnings.push(ConvergenceWarning::TreedepthSaturated {
            count: transitions.treedepth.saturated,
            max_tree_depth: transitions.treedepth.max_tree_depth,
        });
    }
    for e in &ebfmi {
        if e.ebfmi < thresholds.ebfmi_threshold {
            warnings.push(ConvergenceWarning::LowEbfmi {
                chain: e.chain,
                ebfmi: e.ebfmi,
                threshold: thresholds.ebfmi_threshold,
            });
        }
    }

    Ok(DiagnosticReport {
        total_draws: total,
        chains: draws.num_chains(),
        draws_per_chain: by_chain.iter().map(Vec::len).collect(),
        sigma: ParameterDiagnostics {
            summary,
            ess,
            ess_ratio,
            rhat: rhat.ok(),
            mcse_mean,
            autocorrelation,
        },
        sigma_degrees,
        transitions,
        ebfmi,
        warnings,
        thresholds: *thresholds,
    })
}
