//! Sampler transition summaries: divergences, tree depth saturation, E-BFMI.

use serde::{Deserialize, Serialize};

use crate::sampler::{ChainDraws, DrawRecord, PosteriorDraws};

/// Position of a draw: chain id and zero-based iteration (warm-up included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawLocation {
    pub chain: usize,
    pub iteration: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergenceSummary {
    /// Divergent retained transitions.
    pub count: usize,
    pub locations: Vec<DrawLocation>,
    /// Divergences during warm-up; informative only.
    pub warmup_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreedepthSummary {
    pub max_tree_depth: u32,
    /// Retained transitions that hit `max_tree_depth`.
    pub saturated: usize,
    pub locations: Vec<DrawLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSummary {
    pub divergences: DivergenceSummary,
    pub treedepth: TreedepthSummary,
    /// Mean acceptance statistic over retained transitions.
    pub mean_accept_stat: Option<f64>,
    /// Mean leapfrog steps (or proposals) per retained transition.
    pub mean_steps: Option<f64>,
}

/// Energy Bayesian fraction of missing information of one chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainEbfmi {
    pub chain: usize,
    pub ebfmi: f64,
}

fn locate(chains: &[ChainDraws], pred: impl Fn(&DrawRecord) -> bool) -> Vec<DrawLocation> {
    let pred = &pred;
    chains
        .iter()
        .flat_map(move |c| {
            let chain = c.chain_id;
            c.draws
                .iter()
                .filter(move |d| pred(*d))
                .map(move |d| DrawLocation {
                    chain,
                    iteration: d.iteration,
                })
        })
        .collect()
}

pub fn summarize_transitions(draws: &PosteriorDraws) -> TransitionSummary {
    let divergent = locate(&draws.chains, |d| d.divergent);
    let max_depth = draws.max_tree_depth;
    let saturated = locate(&draws.chains, |d| max_depth > 0 && d.tree_depth >= max_depth);

    let total = draws.total_draws();
    let all = || draws.chains.iter().flat_map(|c| c.draws.iter());
    let (mean_accept_stat, mean_steps) = if total == 0 {
        (None, None)
    } else {
        let n = total as f64;
        (
            Some(all().map(|d| d.accept_stat).sum::<f64>() / n),
            Some(all().map(|d| d.n_steps as f64).sum::<f64>() / n),
        )
    };

    TransitionSummary {
        divergences: DivergenceSummary {
            count: divergent.len(),
            locations: divergent,
            warmup_count: draws.chains.iter().map(|c| c.warmup_divergences).sum(),
        },
        treedepth: TreedepthSummary {
            max_tree_depth: max_depth,
            saturated: saturated.len(),
            locations: saturated,
        },
        mean_accept_stat,
        mean_steps,
    }
}

/// `Σ (E_t - E_{t-1})² / Σ (E_t - Ē)²`; `None` without energies, with fewer
/// than two draws, or for constant energies.
pub fn ebfmi(energies: &[f64]) -> Option<f64> {
    if energies.len() < 2 {
        return None;
    }
    let mean = energies.iter().sum::<f64>() / energies.len() as f64;
    let denom: f64 = energies.iter().map(|e| (e - mean).powi(2)).sum();
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }
    let numer: f64 = energies.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    Some(numer / denom)
}

/// E-BFMI of every chain that recorded energies.
pub fn chain_ebfmi(draws: &PosteriorDraws) -> Vec<ChainEbfmi> {
    draws
        .chains
        .iter()
        .filter_map(|c| {
            let energies = c.energies()?;
            Some(ChainEbfmi {
                chain: c.chain_id,
                ebfmi: ebfmi(&energies)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(iteration: usize, divergent: bool, depth: u32, energy: Option<f64>) -> DrawRecord {
        DrawRecord {
            iteration,
            sigma: 0.03,
            log_density: -10.0,
            divergent,
            tree_depth: depth,
            n_steps: 1 << depth,
            accept_stat: 0.8,
            energy,
        }
    }

    fn chain(chain_id: usize, draws: Vec<DrawRecord>) -> ChainDraws {
        ChainDraws {
            chain_id,
            seed: chain_id as u64,
            initial_value: 1.0,
            step_size: 0.1,
            inverse_metric: 1.0,
            warmup_iterations: 10,
            warmup_divergences: 2,
            warmup: Vec::new(),
            draws,
        }
    }

    #[test]
    fn divergences_and_saturation_located() {
        let draws = PosteriorDraws {
            sampler: "nuts".into(),
            base_seed: 0,
            max_tree_depth: 3,
            chains: vec![
                chain(0, vec![record(10, false, 2, None), record(11, true, 3, None)]),
                chain(1, vec![record(10, true, 1, None), record(11, false, 1, None)]),
            ],
        };
        let s = summarize_transitions(&draws);
        assert_eq!(s.divergences.count, 2);
        assert_eq!(
            s.divergences.locations,
            vec![
                DrawLocation { chain: 0, iteration: 11 },
                DrawLocation { chain: 1, iteration: 10 }
            ]
        );
        assert_eq!(s.divergences.warmup_count, 4);
        assert_eq!(s.treedepth.saturated, 1);
        assert_eq!(s.treedepth.locations, vec![DrawLocation { chain: 0, iteration: 11 }]);
        assert!((s.mean_accept_stat.unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(s.mean_steps, Some((4.0 + 8.0 + 2.0 + 2.0) / 4.0));
    }

    #[test]
    fn ebfmi_of_random_walk_energy_is_small() {
        let slow: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert!(ebfmi(&slow).unwrap() < 0.01);
        let alternating: Vec<f64> = (0..100).map(|i| (i % 2) as f64).collect();
        assert!(ebfmi(&alternating).unwrap() > 3.0);
        assert_eq!(ebfmi(&[1.0]), None);
        assert_eq!(ebfmi(&[2.0, 2.0, 2.0]), None);
    }

    #[test]
    fn chains_without_energy_skipped() {
        let draws = PosteriorDraws {
            sampler: "metropolis".into(),
            base_seed: 0,
            max_tree_depth: 10,
            chains: vec![
                chain(0, vec![record(0, false, 0, None), record(1, false, 0, None)]),
                chain(1, vec![record(0, false, 0, Some(1.0)), record(1, false, 0, Some(3.0))]),
            ],
        };
        let e = chain_ebfmi(&draws);
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].chain, 1);
        assert_eq!(e[0].ebfmi, 2.0);
    }
}
