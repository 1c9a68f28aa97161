//! Fake data from the putting model, for recovery checks.

use putt_common::{DataError, DomainError, Error, Observation, PhysicalConstants, PuttingData};
use rand::Rng;
use rand_distr::{Binomial, Distribution};
use tracing::debug;

use crate::model::success_probability;

/// Draw binomial successes at each `(distance, attempts)` design point with
/// true angular error `sigma`.
pub fn simulate<R: Rng + ?Sized>(
    constants: &PhysicalConstants,
    design: &[(f64, u64)],
    sigma: f64,
    rng: &mut R,
) -> Result<PuttingData, Error> {
    if design.is_empty() {
        return Err(DataError::Empty.into());
    }
    let observations = design
        .iter()
        .enumerate()
        .map(|(index, &(distance, attempts))| {
            if attempts == 0 {
                return Err(DataError::ZeroAttempts { index }.into());
            }
            let p = success_probability(distance, sigma, constants)?;
            let binomial = Binomial::new(attempts, p).map_err(|_| DomainError::NonFinite {
                name: "success probability",
                value: p,
            })?;
            Ok(Observation::new(distance, attempts, binomial.sample(rng)))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    debug!(bins = observations.len(), sigma, "Simulated dataset");
    Ok(PuttingData::new(
        2.0 * constants.ball_radius(),
        2.0 * constants.hole_radius(),
        observations,
    ))
}

/// The `(distance, attempts)` design of an existing dataset.
pub fn design_of(data: &PuttingData) -> Vec<(f64, u64)> {
    data.observations
        .iter()
        .map(|o| (o.distance, o.attempts))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use putt_common::published_dataset;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn successes_never_exceed_attempts() {
        let data = published_dataset();
        let mut rng = StdRng::seed_from_u64(8);
        let c = PhysicalConstants::standard();
        for sigma in [0.001, 0.0267, 0.5] {
            let fake = simulate(&c, &design_of(&data), sigma, &mut rng).unwrap();
            assert!(fake.validate().is_ok());
            assert_eq!(fake.total_attempts(), data.total_attempts());
        }
    }

    #[test]
    fn tiny_sigma_holes_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let c = PhysicalConstants::standard();
        let fake = simulate(&c, &[(24.0, 500), (240.0, 500)], 1e-6, &mut rng).unwrap();
        assert!(fake.observations.iter().all(|o| o.successes == o.attempts));
    }

    #[test]
    fn seeded_simulation_is_reproducible() {
        let c = PhysicalConstants::standard();
        let design = [(36.0, 200), (120.0, 300)];
        let a = simulate(&c, &design, 0.03, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = simulate(&c, &design, 0.03, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_inputs_rejected() {
        let c = PhysicalConstants::standard();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            simulate(&c, &[], 0.03, &mut rng),
            Err(Error::Data(DataError::Empty))
        ));
        assert!(matches!(
            simulate(&c, &[(24.0, 0)], 0.03, &mut rng),
            Err(Error::Data(DataError::ZeroAttempts { index: 0 }))
        ));
        assert!(matches!(
            simulate(&c, &[(24.0, 10)], -0.03, &mut rng),
            Err(Error::Domain(DomainError::NonPositiveSigma { .. }))
        ));
        assert!(matches!(
            simulate(&c, &[(1.0, 10)], 0.03, &mut rng),
            Err(Error::Domain(DomainError::DistanceTooShort { .. }))
        ));
    }
}
