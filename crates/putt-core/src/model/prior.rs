//! Prior densities on sigma.

use putt_config::SigmaPrior;
use putt_math::{half_cauchy_dlog_pdf, half_cauchy_log_pdf, half_normal_dlog_pdf, half_normal_log_pdf};

/// A normalized density on the positive half-line.
pub trait PriorDensity {
    /// Log density; `-inf` for `x <= 0`.
    fn log_density(&self, x: f64) -> f64;

    /// Derivative of the log density with respect to `x` (for `x > 0`).
    fn dlog_density(&self, x: f64) -> f64;
}

impl PriorDensity for SigmaPrior {
    fn log_density(&self, x: f64) -> f64 {
        match *self {
            SigmaPrior::HalfCauchy { scale } => half_cauchy_log_pdf(x, scale),
            SigmaPrior::HalfNormal { scale } => half_normal_log_pdf(x, scale),
        }
    }

    fn dlog_density(&self, x: f64) -> f64 {
        match *self {
            SigmaPrior::HalfCauchy { scale } => half_cauchy_dlog_pdf(x, scale),
            SigmaPrior::HalfNormal { scale } => half_normal_dlog_pdf(x, scale),
        }
    }
}
