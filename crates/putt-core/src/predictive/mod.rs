//! Posterior predictive success curves.
//!
//! Every retained sigma draw is turned into a success-probability curve over
//! a distance grid and over the observed distances. Curves are streamed into
//! per-point accumulators (Welford moments plus quantiles) so the full
//! draws × points matrix is never held, apart from a thinned ensemble of raw
//! curves kept for overlay plots.

pub mod quantile;

pub use quantile::{P2Quantile, QuantileAccumulator};

use putt_common::{DomainError, Error, PhysicalConstants};
use putt_config::{PredictiveConfig, QuantileMode};
use putt_math::sample::RunningMoments;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::DrawLocation;
use crate::model::{capture_angle, probability_from_angle, PuttingModel};
use crate::sampler::PosteriorDraws;

/// A central credible band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibleBand {
    /// Posterior mass inside the band, e.g. 0.9.
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Pointwise posterior summaries of the success curve on a distance grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveCurves {
    pub distance: Vec<f64>,
    pub mean: Vec<f64>,
    pub sd: Vec<f64>,
    pub median: Vec<f64>,
    pub bands: Vec<CredibleBand>,
}

/// One raw per-draw curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleCurve {
    pub chain: usize,
    pub iteration: usize,
    pub sigma: f64,
    pub probability: Vec<f64>,
}

/// Predicted vs empirical success at one observed distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationComparison {
    pub distance: f64,
    pub attempts: u64,
    pub successes: u64,
    pub empirical: f64,
    pub mean_predicted: f64,
    pub sd_predicted: f64,
    pub median_predicted: f64,
    /// `(empirical - mean) / sqrt(mean (1 - mean) / attempts)`; `None` when
    /// the predicted probability is exactly 0 or 1.
    pub standardized_residual: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorPredictive {
    pub quantile_mode: QuantileMode,
    pub draws_used: usize,
    pub grid: PredictiveCurves,
    pub observations: Vec<ObservationComparison>,
    pub ensemble: Vec<EnsembleCurve>,
}

/// `points` evenly spaced values from `start` to `end` inclusive.
pub fn distance_grid(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points)
                .map(|i| {
                    if i == points - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Quantile levels needed for the median and every band, ascending.
fn quantile_levels(band_levels: &[f64]) -> Vec<f64> {
    let mut levels = vec![0.5];
    for &mass in band_levels {
        levels.push((1.0 - mass) / 2.0);
        levels.push((1.0 + mass) / 2.0);
    }
    levels.sort_by(f64::total_cmp);
    levels.dedup();
    levels
}

#[derive(Debug, Clone)]
struct PointAccumulator {
    moments: RunningMoments,
    quantiles: QuantileAccumulator,
}

impl PointAccumulator {
    fn new(mode: QuantileMode, levels: &[f64]) -> Self {
        Self {
            moments: RunningMoments::new(),
            quantiles: QuantileAccumulator::new(mode, levels),
        }
    }

    fn add(&mut self, p: f64) {
        self.moments.push(p);
        self.quantiles.add(p);
    }
}

struct PointSummary {
    mean: f64,
    sd: f64,
    quantiles: Vec<f64>,
}

fn summarize(points: &[PointAccumulator]) -> Vec<PointSummary> {
    points
        .iter()
        .map(|acc| PointSummary {
            mean: acc.moments.mean(),
            sd: acc.moments.variance().unwrap_or(0.0).sqrt(),
            quantiles: acc.quantiles.estimates(),
        })
        .collect()
}

/// Streams per-draw success curves into pointwise summaries.
pub struct PredictiveAggregator {
    mode: QuantileMode,
    levels: Vec<f64>,
    band_levels: Vec<f64>,
    grid: Vec<f64>,
    grid_angles: Vec<f64>,
    grid_points: Vec<PointAccumulator>,
    observations: Vec<(f64, u64, u64)>,
    obs_angles: Vec<f64>,
    obs_points: Vec<PointAccumulator>,
    ensemble_size: usize,
    stride: usize,
    ensemble: Vec<EnsembleCurve>,
    seen: usize,
}

impl PredictiveAggregator {
    /// Aggregator for `model`'s observations, expecting about
    /// `expected_draws` pushes (used to thin the ensemble evenly).
    pub fn new(
        model: &PuttingModel,
        config: &PredictiveConfig,
        expected_draws: usize,
    ) -> Result<Self, Error> {
        let constants = model.constants();
        let observations: Vec<(f64, u64, u64)> = model
            .observations()
            .iter()
            .map(|o| (o.distance, o.attempts, o.successes))
            .collect();
        let (min, max) = model.distance_range();
        let start = if config.grid_from_clearance {
            constants.clearance()
        } else {
            min
        };
        let grid = distance_grid(start, max, config.grid_points);
        let grid_angles = angles(&grid, constants)?;
        let levels = quantile_levels(&config.band_levels);
        let stride = if config.ensemble_size == 0 {
            usize::MAX
        } else {
            expected_draws.div_ceil(config.ensemble_size).max(1)
        };

        Ok(Self {
            mode: config.quantile_mode,
            band_levels: config.band_levels.clone(),
            grid_points: grid
                .iter()
                .map(|_| PointAccumulator::new(config.quantile_mode, &levels))
                .collect(),
            obs_points: observations
                .iter()
                .map(|_| PointAccumulator::new(config.quantile_mode, &levels))
                .collect(),
            obs_angles: model.capture_angles().collect(),
            levels,
            grid,
            grid_angles,
            observations,
            ensemble_size: config.ensemble_size,
            stride,
            ensemble: Vec::new(),
            seen: 0,
        })
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    /// Add the curve of one draw.
    pub fn push(&mut self, location: DrawLocation, sigma: f64) -> Result<(), DomainError> {
        let curve = self
            .grid_angles
            .iter()
            .map(|&a| probability_from_angle(a, sigma))
            .collect::<Result<Vec<_>, _>>()?;
        for (acc, &p) in self.grid_points.iter_mut().zip(&curve) {
            acc.add(p);
        }
        for (acc, &a) in self.obs_points.iter_mut().zip(&self.obs_angles) {
            acc.add(probability_from_angle(a, sigma)?);
        }

        if self.seen % self.stride == 0 && self.ensemble.len() < self.ensemble_size {
            self.ensemble.push(EnsembleCurve {
                chain: location.chain,
                iteration: location.iteration,
                sigma,
                probability: curve,
            });
        }
        self.seen += 1;
        Ok(())
    }

    pub fn finish(self) -> PosteriorPredictive {
        let level_index = |p: f64| {
            self.levels
                .iter()
                .position(|&l| l == p)
                .unwrap_or_default()
        };
        let grid_summary = summarize(&self.grid_points);
        let pick = |summary: &[PointSummary], p: f64| -> Vec<f64> {
            let idx = level_index(p);
            summary
                .iter()
                .map(|s| s.quantiles.get(idx).copied().unwrap_or(s.mean))
                .collect()
        };

        let bands = self
            .band_levels
            .iter()
            .map(|&mass| CredibleBand {
                level: mass,
                lower: pick(&grid_summary, (1.0 - mass) / 2.0),
                upper: pick(&grid_summary, (1.0 + mass) / 2.0),
            })
            .collect();
        let grid = PredictiveCurves {
            distance: self.grid.clone(),
            mean: grid_summary.iter().map(|s| s.mean).collect(),
            sd: grid_summary.iter().map(|s| s.sd).collect(),
            median: pick(&grid_summary, 0.5),
            bands,
        };

        let obs_summary = summarize(&self.obs_points);
        let obs_median = pick(&obs_summary, 0.5);
        let observations = self
            .observations
            .iter()
            .zip(&obs_summary)
            .zip(obs_median)
            .map(|((&(distance, attempts, successes), s), median)| {
                let empirical = successes as f64 / attempts as f64;
                let binomial_var = s.mean * (1.0 - s.mean) / attempts as f64;
                ObservationComparison {
                    distance,
                    attempts,
                    successes,
                    empirical,
                    mean_predicted: s.mean,
                    sd_predicted: s.sd,
                    median_predicted: median,
                    standardized_residual: (binomial_var > 0.0)
                        .then(|| (empirical - s.mean) / binomial_var.sqrt()),
                }
            })
            .collect();

        debug!(
            draws = self.seen,
            grid_points = self.grid.len(),
            ensemble = self.ensemble.len(),
            "Predictive curves aggregated"
        );

        PosteriorPredictive {
            quantile_mode: self.mode,
            draws_used: self.seen,
            grid,
            observations,
            ensemble: self.ensemble,
        }
    }
}

fn angles(distances: &[f64], constants: &PhysicalConstants) -> Result<Vec<f64>, DomainError> {
    distances
        .iter()
        .map(|&d| capture_angle(d, constants))
        .collect()
}

/// Aggregate the predictive curves of every retained draw.
pub fn posterior_predictive(
    model: &PuttingModel,
    draws: &PosteriorDraws,
    config: &PredictiveConfig,
) -> Result<PosteriorPredictive, Error> {
    let mut aggregator = PredictiveAggregator::new(model, config, draws.total_draws())?;
    for chain in &draws.chains {
        for draw in &chain.draws {
            let location = DrawLocation {
                chain: chain.chain_id,
                iteration: draw.iteration,
            };
            aggregator.push(location, draw.sigma)?;
        }
    }
    Ok(aggregator.finish())
}
