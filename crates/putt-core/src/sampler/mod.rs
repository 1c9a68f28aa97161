//! Posterior samplers for a single positive parameter.
//!
//! Samplers are strategies behind [`PosteriorSampler`]; the model is any
//! [`PositiveLogDensity`]. Both strategies run on `u = ln σ` with the log
//! Jacobian added, so proposals can never leave the support.
//!
//! [`run_chains`] runs independent chains on scoped threads. Each chain owns
//! its RNG, seeded with `base_seed + chain_id`; nothing is shared between
//! chains except the read-only target and configuration.

pub mod adaptation;
pub mod metropolis;
pub mod nuts;

pub use metropolis::AdaptiveMetropolis;
pub use nuts::Nuts;

use putt_common::{DomainError, Error};
use putt_config::validate::validate_sampler;
use putt_config::{SamplerConfig, SamplerKind};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Attempts at random initialization before a chain gives up.
pub const MAX_INIT_ATTEMPTS: usize = 100;

/// Random initial points are drawn uniformly on `(-2, 2)` in `ln σ`.
const INIT_RADIUS: f64 = 2.0;

/// Unnormalized log density of a strictly positive scalar parameter.
pub trait PositiveLogDensity: Sync {
    /// Log density at `x`; an error for `x` outside the support.
    fn log_density(&self, x: f64) -> Result<f64, DomainError>;

    /// Derivative of the log density. Central differences unless overridden.
    fn log_density_gradient(&self, x: f64) -> Result<f64, DomainError> {
        let h = x * 1e-6;
        let up = self.log_density(x + h)?;
        let down = self.log_density(x - h)?;
        Ok((up - down) / (2.0 * h))
    }
}

/// Sampler failures. Convergence problems are not failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("invalid sampler configuration: {0}")]
    InvalidConfig(String),

    #[error("chain {chain}: no finite log density after {attempts} initialization attempts")]
    NoFiniteInitialPoint { chain: usize, attempts: usize },

    #[error("chain {chain} panicked")]
    ChainPanicked { chain: usize },
}

impl From<SamplerError> for Error {
    fn from(err: SamplerError) -> Self {
        Error::Sampler(err.to_string())
    }
}

/// One sampler transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawRecord {
    /// Zero-based iteration index, warm-up included.
    pub iteration: usize,
    pub sigma: f64,
    /// Log posterior density of `sigma` (without the log-scale Jacobian).
    pub log_density: f64,
    pub divergent: bool,
    /// Trajectory doublings; 0 for random-walk proposals.
    pub tree_depth: u32,
    /// Leapfrog steps (or proposals) spent on this transition.
    pub n_steps: u32,
    /// Mean Metropolis acceptance probability of the transition.
    pub accept_stat: f64,
    /// Hamiltonian of the selected state, when the sampler has one.
    pub energy: Option<f64>,
}

/// Output of one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDraws {
    pub chain_id: usize,
    pub seed: u64,
    pub initial_value: f64,
    /// Step size (or proposal scale) used after warm-up.
    pub step_size: f64,
    /// Inverse metric in log-sigma space after warm-up.
    pub inverse_metric: f64,
    pub warmup_iterations: usize,
    pub warmup_divergences: usize,
    /// Warm-up transitions; empty unless `save_warmup` is set.
    #[serde(default)]
    pub warmup: Vec<DrawRecord>,
    pub draws: Vec<DrawRecord>,
}

impl ChainDraws {
    pub fn sigma(&self) -> Vec<f64> {
        self.draws.iter().map(|d| d.sigma).collect()
    }

    /// Energies of the retained draws, if every draw recorded one.
    pub fn energies(&self) -> Option<Vec<f64>> {
        self.draws.iter().map(|d| d.energy).collect()
    }
}

/// Retained draws of every chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorDraws {
    pub sampler: String,
    pub base_seed: u64,
    pub max_tree_depth: u32,
    pub chains: Vec<ChainDraws>,
}

impl PosteriorDraws {
    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn total_draws(&self) -> usize {
        self.chains.iter().map(|c| c.draws.len()).sum()
    }

    pub fn sigma_by_chain(&self) -> Vec<Vec<f64>> {
        self.chains.iter().map(ChainDraws::sigma).collect()
    }

    /// Every retained sigma, chain after chain.
    pub fn all_sigma(&self) -> Vec<f64> {
        self.chains
            .iter()
            .flat_map(|c| c.draws.iter().map(|d| d.sigma))
            .collect()
    }

    pub fn chain_seeds(&self) -> Vec<u64> {
        self.chains.iter().map(|c| c.seed).collect()
    }
}

/// A strategy that draws one chain from a positive log density.
pub trait PosteriorSampler: Sync {
    fn name(&self) -> &'static str;

    fn sample_chain(
        &self,
        target: &dyn PositiveLogDensity,
        config: &SamplerConfig,
        chain_id: usize,
        seed: u64,
    ) -> Result<ChainDraws, SamplerError>;
}

/// The sampler configured by `kind`.
pub fn sampler_for(kind: SamplerKind) -> Box<dyn PosteriorSampler> {
    match kind {
        SamplerKind::Nuts => Box::new(Nuts::default()),
        SamplerKind::Metropolis => Box::new(AdaptiveMetropolis::default()),
    }
}

/// Seed of chain `chain` for a given base seed.
pub fn chain_seed(base_seed: u64, chain: usize) -> u64 {
    base_seed.wrapping_add(chain as u64)
}

/// Run `config.chains` chains in parallel and collect their draws.
pub fn run_chains(
    sampler: &dyn PosteriorSampler,
    target: &dyn PositiveLogDensity,
    config: &SamplerConfig,
) -> Result<PosteriorDraws, SamplerError> {
    validate_sampler(config).map_err(|e| SamplerError::InvalidConfig(e.to_string()))?;
    let base_seed = config.seed.unwrap_or_else(rand::random);

    info!(
        sampler = sampler.name(),
        chains = config.chains,
        iterations = config.iterations,
        warmup = config.warmup_iterations(),
        base_seed,
        "Starting chains"
    );

    let results: Vec<Result<ChainDraws, SamplerError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..config.chains)
            .map(|chain| {
                let seed = chain_seed(base_seed, chain);
                scope.spawn(move || sampler.sample_chain(target, config, chain, seed))
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(chain, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(SamplerError::ChainPanicked { chain }))
            })
            .collect()
    });

    let chains = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    for chain in &chains {
        debug!(
            chain = chain.chain_id,
            seed = chain.seed,
            step_size = chain.step_size,
            inverse_metric = chain.inverse_metric,
            warmup_divergences = chain.warmup_divergences,
            "Chain finished"
        );
    }

    Ok(PosteriorDraws {
        sampler: sampler.name().to_string(),
        base_seed,
        max_tree_depth: config.max_tree_depth,
        chains,
    })
}

/// The target seen from `u = ln σ`: `ℓ(u) = log π(e^u) + u`.
///
/// Any domain error or non-finite value reads as zero density.
pub(crate) struct LogScale<'a> {
    target: &'a dyn PositiveLogDensity,
}

impl<'a> LogScale<'a> {
    pub(crate) fn new(target: &'a dyn PositiveLogDensity) -> Self {
        Self { target }
    }

    pub(crate) fn value(&self, u: f64) -> Option<f64> {
        let lp = self.target.log_density(u.exp()).ok()? + u;
        lp.is_finite().then_some(lp)
    }

    pub(crate) fn value_and_gradient(&self, u: f64) -> Option<(f64, f64)> {
        let sigma = u.exp();
        let lp = self.target.log_density(sigma).ok()? + u;
        let grad = sigma * self.target.log_density_gradient(sigma).ok()? + 1.0;
        (lp.is_finite() && grad.is_finite()).then_some((lp, grad))
    }
}

/// Starting point in `ln σ`: the configured sigma, or uniform draws on
/// `(-2, 2)` until the density is finite.
pub(crate) fn initial_point(
    target: &LogScale<'_>,
    config: &SamplerConfig,
    chain: usize,
    rng: &mut StdRng,
) -> Result<f64, SamplerError> {
    if let Some(sigma) = config.initial_value {
        let u = sigma.ln();
        return match target.value_and_gradient(u) {
            Some(_) => Ok(u),
            None => Err(SamplerError::InvalidConfig(format!(
                "initial sigma {sigma} has zero posterior density"
            ))),
        };
    }
    for _ in 0..MAX_INIT_ATTEMPTS {
        let u = rng.random_range(-INIT_RADIUS..INIT_RADIUS);
        if target.value_and_gradient(u).is_some() {
            return Ok(u);
        }
    }
    Err(SamplerError::NoFiniteInitialPoint {
        chain,
        attempts: MAX_INIT_ATTEMPTS,
    })
}
