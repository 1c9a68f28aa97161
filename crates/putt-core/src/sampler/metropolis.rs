//! Adaptive random-walk Metropolis on `u = ln σ`.
//!
//! Gaussian proposals; during warm-up the log proposal scale follows a
//! Robbins-Monro recursion towards acceptance probability 0.44, the optimum
//! for one-dimensional targets. The scale is frozen afterwards.

use putt_config::SamplerConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::debug;

use super::{
    initial_point, ChainDraws, DrawRecord, LogScale, PosteriorSampler, PositiveLogDensity,
    SamplerError,
};

pub const TARGET_ACCEPTANCE: f64 = 0.44;
const INITIAL_SCALE: f64 = 0.1;
const ADAPTATION_DECAY: f64 = 0.6;

#[derive(Debug, Clone, Copy)]
pub struct AdaptiveMetropolis {
    pub initial_scale: f64,
    pub target_acceptance: f64,
}

impl Default for AdaptiveMetropolis {
    fn default() -> Self {
        Self {
            initial_scale: INITIAL_SCALE,
            target_acceptance: TARGET_ACCEPTANCE,
        }
    }
}

impl PosteriorSampler for AdaptiveMetropolis {
    fn name(&self) -> &'static str {
        "metropolis"
    }

    fn sample_chain(
        &self,
        target: &dyn PositiveLogDensity,
        config: &SamplerConfig,
        chain_id: usize,
        seed: u64,
    ) -> Result<ChainDraws, SamplerError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let log_scale_target = LogScale::new(target);
        let u0 = initial_point(&log_scale_target, config, chain_id, &mut rng)?;
        let mut u = u0;
        let mut lp = log_scale_target
            .value(u)
            .ok_or(SamplerError::NoFiniteInitialPoint {
                chain: chain_id,
                attempts: 1,
            })?;

        let num_warmup = config.warmup_iterations();
        let mut log_scale = self.initial_scale.ln();
        let mut warmup = Vec::new();
        let mut draws = Vec::with_capacity(config.retained_iterations());
        let mut accepted = 0usize;

        for iteration in 0..config.iterations {
            let z: f64 = rng.sample(StandardNormal);
            let proposal = u + log_scale.exp() * z;
            let candidate = log_scale_target.value(proposal);
            let log_alpha = candidate.map_or(f64::NEG_INFINITY, |lp_new| lp_new - lp);
            let accept_prob = log_alpha.exp().min(1.0);
            if let Some(lp_new) = candidate {
                if (1.0 - rng.random::<f64>()).ln() < log_alpha {
                    u = proposal;
                    lp = lp_new;
                    if iteration >= num_warmup {
                        accepted += 1;
                    }
                }
            }

            let record = DrawRecord {
                iteration,
                sigma: u.exp(),
                log_density: lp - u,
                divergent: false,
                tree_depth: 0,
                n_steps: 1,
                accept_stat: accept_prob,
                energy: None,
            };
            if iteration < num_warmup {
                let gain = ((iteration + 1) as f64).powf(-ADAPTATION_DECAY);
                log_scale += gain * (accept_prob - self.target_acceptance);
                if config.save_warmup {
                    warmup.push(record);
                }
            } else {
                draws.push(record);
            }
        }

        debug!(
            chain = chain_id,
            scale = log_scale.exp(),
            acceptance = accepted as f64 / draws.len().max(1) as f64,
            "Metropolis chain done"
        );

        Ok(ChainDraws {
            chain_id,
            seed,
            initial_value: u0.exp(),
            step_size: log_scale.exp(),
            inverse_metric: 1.0,
            warmup_iterations: num_warmup,
            warmup_divergences: 0,
            warmup,
            draws,
        })
    }
}
