//! The putting success model.
//!
//! - [`geometry`]: capture angle from ball/hole radii and distance
//! - [`success`]: success probability `2Φ(θ/σ) - 1` and its log-domain pair
//! - [`prior`]: half-Cauchy / half-Normal prior densities on sigma
//! - [`likelihood`]: [`PuttingModel`], the binomial log posterior

pub mod geometry;
pub mod likelihood;
pub mod prior;
pub mod success;

pub use geometry::{capture_angle, capture_angle_from_radii};
pub use likelihood::PuttingModel;
pub use prior::PriorDensity;
pub use success::{dprob_dlog_sigma, log_probabilities, probability_from_angle, success_probability};

use std::f64::consts::PI;

/// Convert an angular error from radians to degrees, `sigma·180/π`.
pub fn sigma_degrees(sigma: f64) -> f64 {
    sigma * 180.0 / PI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_conversion() {
        assert_eq!(sigma_degrees(0.0), 0.0);
        assert!((sigma_degrees(PI) - 180.0).abs() < 1e-12);
        assert!((sigma_degrees(0.0267) - 1.529_797).abs() < 1e-6);
    }
}
