//! No-U-Turn Sampler on `u = ln σ`.
//!
//! Slice-based NUTS (Hoffman & Gelman 2014, algorithm 6): each iteration
//! doubles a leapfrog trajectory in a random direction until it turns back
//! on itself or reaches the maximum tree depth, then picks a state uniformly
//! from those inside the slice. Warm-up adapts the step size by dual
//! averaging and the (scalar) inverse metric by windowed variance estimates.

use putt_config::SamplerConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, trace};

use super::adaptation::{DualAveraging, WindowedAdaptation};
use super::{
    initial_point, ChainDraws, DrawRecord, LogScale, PosteriorSampler, PositiveLogDensity,
    SamplerError,
};

/// Energy error beyond which a trajectory is declared divergent.
const MAX_ENERGY_ERROR: f64 = 1000.0;

/// Limits for the initial step size search.
const MIN_STEP: f64 = 1e-10;
const MAX_STEP: f64 = 1e7;
const STEP_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct Nuts;

#[derive(Debug, Clone, Copy)]
struct Phase {
    u: f64,
    r: f64,
    log_density: f64,
    grad: f64,
}

#[derive(Debug, Clone, Copy)]
struct Tree {
    minus: Phase,
    plus: Phase,
    proposal: Phase,
    /// States inside the slice.
    n_valid: f64,
    keep_going: bool,
    divergent: bool,
    sum_accept: f64,
    n_accept: u32,
}

/// State of one chain's integrator.
struct Integrator<'a> {
    target: &'a LogScale<'a>,
    inv_metric: f64,
    step_size: f64,
}

impl Integrator<'_> {
    fn kinetic(&self, r: f64) -> f64 {
        0.5 * r * r * self.inv_metric
    }

    /// `log p(u) - K(r)`, the negative Hamiltonian.
    fn joint(&self, state: &Phase) -> f64 {
        state.log_density - self.kinetic(state.r)
    }

    fn leapfrog(&self, state: &Phase, direction: f64) -> Option<Phase> {
        let eps = direction * self.step_size;
        let r_half = state.r + 0.5 * eps * state.grad;
        let u = state.u + eps * self.inv_metric * r_half;
        let (log_density, grad) = self.target.value_and_gradient(u)?;
        let r = r_half + 0.5 * eps * grad;
        r.is_finite().then_some(Phase {
            u,
            r,
            log_density,
            grad,
        })
    }

    fn draw_momentum(&self, rng: &mut StdRng) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        z / self.inv_metric.sqrt()
    }

    fn no_u_turn(&self, minus: &Phase, plus: &Phase) -> bool {
        let span = plus.u - minus.u;
        span * minus.r >= 0.0 && span * plus.r >= 0.0
    }

    #[allow(clippy::too_many_arguments)]
    fn build_tree(
        &self,
        state: &Phase,
        log_slice: f64,
        direction: f64,
        depth: u32,
        joint0: f64,
        steps: &mut u32,
        rng: &mut StdRng,
    ) -> Tree {
        if depth == 0 {
            *steps += 1;
            return match self.leapfrog(state, direction) {
                Some(next) => {
                    let joint = self.joint(&next);
                    let keep_going = log_slice < joint + MAX_ENERGY_ERROR;
                    Tree {
                        minus: next,
                        plus: next,
                        proposal: next,
                        n_valid: if log_slice <= joint { 1.0 } else { 0.0 },
                        keep_going,
                        divergent: !keep_going,
                        sum_accept: (joint - joint0).exp().min(1.0),
                        n_accept: 1,
                    }
                }
                None => Tree {
                    minus: *state,
                    plus: *state,
                    proposal: *state,
                    n_valid: 0.0,
                    keep_going: false,
                    divergent: true,
                    sum_accept: 0.0,
                    n_accept: 1,
                },
            };
        }

        let mut tree = self.build_tree(state, log_slice, direction, depth - 1, joint0, steps, rng);
        if !tree.keep_going {
            return tree;
        }
        let edge = if direction < 0.0 { tree.minus } else { tree.plus };
        let outer = self.build_tree(&edge, log_slice, direction, depth - 1, joint0, steps, rng);
        if direction < 0.0 {
            tree.minus = outer.minus;
        } else {
            tree.plus = outer.plus;
        }
        let total = tree.n_valid + outer.n_valid;
        if total > 0.0 && rng.random::<f64>() < outer.n_valid / total {
            tree.proposal = outer.proposal;
        }
        tree.n_valid = total;
        tree.sum_accept += outer.sum_accept;
        tree.n_accept += outer.n_accept;
        tree.divergent |= outer.divergent;
        tree.keep_going = outer.keep_going && self.no_u_turn(&tree.minus, &tree.plus);
        tree
    }

    /// One NUTS transition from `current`.
    fn transition(
        &self,
        current: Phase,
        max_depth: u32,
        rng: &mut StdRng,
    ) -> (Phase, Transition) {
        let start = Phase {
            r: self.draw_momentum(rng),
            ..current
        };
        let joint0 = self.joint(&start);
        // ln u with u ~ Uniform(0, exp(joint0)]
        let log_slice = joint0 + (1.0 - rng.random::<f64>()).ln();

        let mut minus = start;
        let mut plus = start;
        let mut selected = start;
        let mut n_valid = 1.0;
        let mut depth = 0;
        let mut steps = 0u32;
        let mut sum_accept = 0.0;
        let mut n_accept = 0u32;
        let mut divergent = false;

        while depth < max_depth {
            let direction = if rng.random::<bool>() { 1.0 } else { -1.0 };
            let edge = if direction < 0.0 { minus } else { plus };
            let tree =
                self.build_tree(&edge, log_slice, direction, depth, joint0, &mut steps, rng);
            if direction < 0.0 {
                minus = tree.minus;
            } else {
                plus = tree.plus;
            }
            sum_accept += tree.sum_accept;
            n_accept += tree.n_accept;
            divergent |= tree.divergent;
            depth += 1;

            if tree.keep_going && rng.random::<f64>() < tree.n_valid / n_valid {
                selected = tree.proposal;
            }
            n_valid += tree.n_valid;
            if !(tree.keep_going && self.no_u_turn(&minus, &plus)) {
                break;
            }
        }

        let accept_stat = if n_accept > 0 {
            sum_accept / n_accept as f64
        } else {
            0.0
        };
        let info = Transition {
            depth,
            steps,
            accept_stat,
            divergent,
            energy: -self.joint(&selected),
        };
        (selected, info)
    }

    fn one_step_log_ratio(&self, start: &Phase, joint0: f64) -> f64 {
        self.leapfrog(start, 1.0)
            .map(|next| self.joint(&next) - joint0)
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Heuristic initial step: double or halve until the one-step acceptance
    /// ratio crosses one half.
    fn find_reasonable_step(&mut self, current: &Phase, rng: &mut StdRng) {
        self.step_size = 1.0;
        let start = Phase {
            r: self.draw_momentum(rng),
            ..*current
        };
        let joint0 = self.joint(&start);
        let half = 0.5f64.ln();
        let a = if self.one_step_log_ratio(&start, joint0) > half {
            1.0
        } else {
            -1.0
        };
        for _ in 0..STEP_SEARCH_LIMIT {
            if a * self.one_step_log_ratio(&start, joint0) <= a * half {
                break;
            }
            let next = self.step_size * 2f64.powf(a);
            if !(MIN_STEP..=MAX_STEP).contains(&next) {
                break;
            }
            self.step_size = next;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    depth: u32,
    steps: u32,
    accept_stat: f64,
    divergent: bool,
    energy: f64,
}

fn record(iteration: usize, state: &Phase, info: &Transition) -> DrawRecord {
    DrawRecord {
        iteration,
        sigma: state.u.exp(),
        log_density: state.log_density - state.u,
        divergent: info.divergent,
        tree_depth: info.depth,
        n_steps: info.steps,
        accept_stat: info.accept_stat,
        energy: Some(info.energy),
    }
}

impl PosteriorSampler for Nuts {
    fn name(&self) -> &'static str {
        "nuts"
    }

    fn sample_chain(
        &self,
        target: &dyn PositiveLogDensity,
        config: &SamplerConfig,
        chain_id: usize,
        seed: u64,
    ) -> Result<ChainDraws, SamplerError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let log_scale = LogScale::new(target);
        let u0 = initial_point(&log_scale, config, chain_id, &mut rng)?;
        let (log_density, grad) = log_scale
            .value_and_gradient(u0)
            .ok_or(SamplerError::NoFiniteInitialPoint {
                chain: chain_id,
                attempts: 1,
            })?;
        let mut current = Phase {
            u: u0,
            r: 0.0,
            log_density,
            grad,
        };

        let num_warmup = config.warmup_iterations();
        let mut integrator = Integrator {
            target: &log_scale,
            inv_metric: 1.0,
            step_size: 1.0,
        };
        integrator.find_reasonable_step(&current, &mut rng);
        let mut step_adapt = DualAveraging::new(integrator.step_size, config.target_accept);
        let mut metric_adapt = WindowedAdaptation::new(num_warmup);
        trace!(
            chain = chain_id,
            step_size = integrator.step_size,
            "Initial step size"
        );

        let mut warmup = Vec::new();
        let mut warmup_divergences = 0;
        let mut draws = Vec::with_capacity(config.retained_iterations());

        for iteration in 0..config.iterations {
            let in_warmup = iteration < num_warmup;
            let (next, info) = integrator.transition(current, config.max_tree_depth, &mut rng);
            current = next;

            if in_warmup {
                integrator.step_size = step_adapt.update(info.accept_stat);
                if let Some(var) = metric_adapt.learn(current.u) {
                    integrator.inv_metric = var;
                    integrator.find_reasonable_step(&current, &mut rng);
                    step_adapt.restart(integrator.step_size);
                    debug!(
                        chain = chain_id,
                        iteration,
                        inverse_metric = var,
                        step_size = integrator.step_size,
                        "Metric window closed"
                    );
                }
                if iteration + 1 == num_warmup {
                    integrator.step_size = step_adapt.final_step();
                }
                if info.divergent {
                    warmup_divergences += 1;
                }
                if config.save_warmup {
                    warmup.push(record(iteration, &current, &info));
                }
            } else {
                draws.push(record(iteration, &current, &info));
            }
        }

        Ok(ChainDraws {
            chain_id,
            seed,
            initial_value: u0.exp(),
            step_size: integrator.step_size,
            inverse_metric: integrator.inv_metric,
            warmup_iterations: num_warmup,
            warmup_divergences,
            warmup,
            draws,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::{config, LogNormal};
    use putt_math::sample::{mean, std_dev};

    fn log_draws(chain: &ChainDraws) -> Vec<f64> {
        chain.draws.iter().map(|d| d.sigma.ln()).collect()
    }

    #[test]
    fn recovers_log_normal_moments() {
        let target = LogNormal { mu: -3.5, s: 0.3 };
        let chain = Nuts.sample_chain(&target, &config(1, 2000, 7), 0, 7).unwrap();
        let u = log_draws(&chain);
        assert_eq!(u.len(), 1000);
        assert!((mean(&u) + 3.5).abs() < 0.05, "mean={}", mean(&u));
        assert!((std_dev(&u) - 0.3).abs() < 0.05, "sd={}", std_dev(&u));
    }

    #[test]
    fn adapts_metric_to_target_scale() {
        let target = LogNormal { mu: 0.0, s: 0.01 };
        let chain = Nuts.sample_chain(&target, &config(1, 1000, 3), 0, 3).unwrap();
        // variance of ln σ is 1e-4; regularization pulls it up slightly
        assert!(chain.inverse_metric < 1e-3, "{}", chain.inverse_metric);
        assert!(chain.draws.iter().all(|d| d.tree_depth <= 10));
    }

    #[test]
    fn same_seed_same_chain() {
        let target = LogNormal { mu: -1.0, s: 0.5 };
        let cfg = config(1, 200, 11);
        let a = Nuts.sample_chain(&target, &cfg, 0, 11).unwrap();
        let b = Nuts.sample_chain(&target, &cfg, 0, 11).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn records_transition_details() {
        let target = LogNormal { mu: 0.0, s: 1.0 };
        let cfg = SamplerConfig {
            save_warmup: true,
            ..config(1, 100, 5)
        };
        let chain = Nuts.sample_chain(&target, &cfg, 0, 5).unwrap();
        assert_eq!(chain.warmup.len(), 50);
        assert_eq!(chain.draws.len(), 50);
        assert_eq!(chain.draws[0].iteration, 50);
        for d in &chain.draws {
            assert!(d.sigma > 0.0);
            assert!(d.n_steps >= 1);
            assert!((0.0..=1.0).contains(&d.accept_stat));
            assert!(d.energy.is_some_and(f64::is_finite));
        }
    }

    #[test]
    fn tree_depth_is_capped() {
        let target = LogNormal { mu: 0.0, s: 1.0 };
        let cfg = SamplerConfig {
            max_tree_depth: 1,
            ..config(1, 100, 9)
        };
        let chain = Nuts.sample_chain(&target, &cfg, 0, 9).unwrap();
        assert!(chain.draws.iter().all(|d| d.tree_depth <= 1 && d.n_steps <= 1));
    }

    #[test]
    fn zero_warmup_runs_unadapted() {
        let target = LogNormal { mu: 0.0, s: 1.0 };
        let cfg = SamplerConfig {
            warmup: Some(0),
            ..config(1, 20, 2)
        };
        let chain = Nuts.sample_chain(&target, &cfg, 0, 2).unwrap();
        assert_eq!(chain.draws.len(), 20);
        assert_eq!(chain.inverse_metric, 1.0);
    }
}
