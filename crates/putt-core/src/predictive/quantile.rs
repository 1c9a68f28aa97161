//! Per-point quantile accumulators for predictive curves.
//!
//! - [`P2Quantile`]: the P² estimator of Jain & Chlamtac (1985), five
//!   markers per quantile, constant memory
//! - [`QuantileAccumulator`]: one P² estimator per level, or every value kept
//!   for exact order statistics
//!
//! Both agree exactly while at most five values have been seen.

use putt_config::QuantileMode;
use putt_math::sample::quantile_sorted;

// ============================================================================
// P² estimator
// ============================================================================

/// Streaming estimate of a single quantile.
#[derive(Debug, Clone)]
pub struct P2Quantile {
    p: f64,
    count: usize,
    /// Marker heights.
    heights: [f64; 5],
    /// Actual marker positions (zero-based).
    positions: [f64; 5],
    /// Desired marker positions.
    desired: [f64; 5],
    increments: [f64; 5],
}

impl P2Quantile {
    /// Estimator for quantile `p` in `[0, 1]`.
    pub fn new(p: f64) -> Self {
        Self {
            p,
            count: 0,
            heights: [0.0; 5],
            positions: [0.0, 1.0, 2.0, 3.0, 4.0],
            desired: [0.0, 2.0 * p, 4.0 * p, 2.0 + 2.0 * p, 4.0],
            increments: [0.0, p / 2.0, p, (1.0 + p) / 2.0, 1.0],
        }
    }

    pub fn level(&self) -> f64 {
        self.p
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Add a value. Non-finite values are ignored.
    pub fn add(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }
        if self.count < 5 {
            self.heights[self.count] = x;
            self.count += 1;
            if self.count == 5 {
                self.heights.sort_by(f64::total_cmp);
            }
            return;
        }
        self.count += 1;

        let q = &mut self.heights;
        let k = if x < q[0] {
            q[0] = x;
            0
        } else if x >= q[4] {
            q[4] = x;
            3
        } else {
            (0..4).find(|&i| x < q[i + 1]).unwrap_or(3)
        };

        for pos in &mut self.positions[k + 1..] {
            *pos += 1.0;
        }
        for (d, inc) in self.desired.iter_mut().zip(&self.increments) {
            *d += inc;
        }

        for i in 1..4 {
            let offset = self.desired[i] - self.positions[i];
            let room_up = self.positions[i + 1] - self.positions[i];
            let room_down = self.positions[i - 1] - self.positions[i];
            if (offset >= 1.0 && room_up > 1.0) || (offset <= -1.0 && room_down < -1.0) {
                let d = offset.signum();
                let candidate = self.parabolic(i, d);
                self.heights[i] = if self.heights[i - 1] < candidate && candidate < self.heights[i + 1]
                {
                    candidate
                } else {
                    self.linear(i, d)
                };
                self.positions[i] += d;
            }
        }
    }

    fn parabolic(&self, i: usize, d: f64) -> f64 {
        let (q, n) = (&self.heights, &self.positions);
        q[i] + d / (n[i + 1] - n[i - 1])
            * ((n[i] - n[i - 1] + d) * (q[i + 1] - q[i]) / (n[i + 1] - n[i])
                + (n[i + 1] - n[i] - d) * (q[i] - q[i - 1]) / (n[i] - n[i - 1]))
    }

    fn linear(&self, i: usize, d: f64) -> f64 {
        let j = if d > 0.0 { i + 1 } else { i - 1 };
        let (q, n) = (&self.heights, &self.positions);
        q[i] + d * (q[j] - q[i]) / (n[j] - n[i])
    }

    /// Current estimate; exact for up to five values, `None` when empty.
    pub fn estimate(&self) -> Option<f64> {
        match self.count {
            0 => None,
            1..=5 => {
                let mut seen = self.heights[..self.count].to_vec();
                seen.sort_by(f64::total_cmp);
                Some(quantile_sorted(&seen, self.p))
            }
            _ => Some(self.heights[2]),
        }
    }
}

// ============================================================================
// Accumulator
// ============================================================================

/// Quantiles at a fixed set of levels for one curve point.
#[derive(Debug, Clone)]
pub enum QuantileAccumulator {
    Streaming(Vec<P2Quantile>),
    Exact { levels: Vec<f64>, values: Vec<f64> },
}

impl QuantileAccumulator {
    pub fn new(mode: QuantileMode, levels: &[f64]) -> Self {
        match mode {
            QuantileMode::Streaming => {
                Self::Streaming(levels.iter().map(|&p| P2Quantile::new(p)).collect())
            }
            QuantileMode::Exact => Self::Exact {
                levels: levels.to_vec(),
                values: Vec::new(),
            },
        }
    }

    pub fn add(&mut self, x: f64) {
        match self {
            Self::Streaming(estimators) => estimators.iter_mut().for_each(|e| e.add(x)),
            Self::Exact { values, .. } => {
                if x.is_finite() {
                    values.push(x);
                }
            }
        }
    }

    /// Estimates in level order, forced non-decreasing across levels.
    /// Empty before the first value.
    pub fn estimates(&self) -> Vec<f64> {
        let raw: Vec<f64> = match self {
            Self::Streaming(estimators) => estimators.iter().filter_map(P2Quantile::estimate).collect(),
            Self::Exact { levels, values } => {
                if values.is_empty() {
                    return Vec::new();
                }
                let mut sorted = values.clone();
                sorted.sort_by(f64::total_cmp);
                levels.iter().map(|&p| quantile_sorted(&sorted, p)).collect()
            }
        };
        let mut running = f64::NEG_INFINITY;
        raw.into_iter()
            .map(|q| {
                running = running.max(q);
                running
            })
            .collect()
    }
}
