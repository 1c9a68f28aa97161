//! Observations, physical constants, and the validated dataset.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DomainError, Error};

/// Regulation golf ball diameter in inches.
pub const STANDARD_BALL_DIAMETER: f64 = 1.68;

/// Regulation hole (cup) diameter in inches.
pub const STANDARD_HOLE_DIAMETER: f64 = 4.25;

/// Aggregated putting outcomes for one distance bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Distance to the hole in inches.
    pub distance: f64,
    /// Number of putts attempted from this distance.
    pub attempts: u64,
    /// Number of putts holed.
    pub successes: u64,
}

impl Observation {
    pub fn new(distance: f64, attempts: u64, successes: u64) -> Self {
        Self {
            distance,
            attempts,
            successes,
        }
    }

    /// Check the record invariants; `index` is reported in the error.
    pub fn validate(&self, index: usize) -> Result<(), DataError> {
        if !self.distance.is_finite() || self.distance <= 0.0 {
            return Err(DataError::InvalidDistance {
                index,
                distance: self.distance,
            });
        }
        if self.attempts == 0 {
            return Err(DataError::ZeroAttempts { index });
        }
        if self.successes > self.attempts {
            return Err(DataError::SuccessesExceedAttempts {
                index,
                successes: self.successes,
                attempts: self.attempts,
            });
        }
        Ok(())
    }

    /// Empirical success proportion `successes / attempts`.
    pub fn proportion(&self) -> f64 {
        self.successes as f64 / self.attempts as f64
    }

    pub fn failures(&self) -> u64 {
        self.attempts.saturating_sub(self.successes)
    }
}

/// Ball and hole radii in inches.
///
/// Construction guarantees `0 < ball_radius < hole_radius`, so the clearance
/// is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicalConstants {
    ball_radius: f64,
    hole_radius: f64,
}

impl PhysicalConstants {
    /// Build from diameters (inches); they are halved internally.
    pub fn from_diameters(ball_diameter: f64, hole_diameter: f64) -> Result<Self, DomainError> {
        Self::from_radii(ball_diameter / 2.0, hole_diameter / 2.0)
    }

    pub fn from_radii(ball_radius: f64, hole_radius: f64) -> Result<Self, DomainError> {
        for (name, value) in [("ball radius", ball_radius), ("hole radius", hole_radius)] {
            if !value.is_finite() {
                return Err(DomainError::NonFinite { name, value });
            }
            if value <= 0.0 {
                return Err(DomainError::NonPositive { name, value });
            }
        }
        if ball_radius >= hole_radius {
            return Err(DomainError::InvertedRadii {
                ball_radius,
                hole_radius,
            });
        }
        Ok(Self {
            ball_radius,
            hole_radius,
        })
    }

    /// Regulation ball (1.68") and hole (4.25").
    pub fn standard() -> Self {
        Self {
            ball_radius: STANDARD_BALL_DIAMETER / 2.0,
            hole_radius: STANDARD_HOLE_DIAMETER / 2.0,
        }
    }

    pub fn ball_radius(&self) -> f64 {
        self.ball_radius
    }

    pub fn hole_radius(&self) -> f64 {
        self.hole_radius
    }

    /// Hole radius minus ball radius: the shortest distance with a defined
    /// capture angle.
    pub fn clearance(&self) -> f64 {
        self.hole_radius - self.ball_radius
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::standard()
    }
}

fn default_ball_diameter() -> f64 {
    STANDARD_BALL_DIAMETER
}

fn default_hole_diameter() -> f64 {
    STANDARD_HOLE_DIAMETER
}

/// A complete putting dataset: global constants plus distance bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuttingData {
    /// Ball diameter in inches.
    #[serde(default = "default_ball_diameter")]
    pub ball_diameter: f64,
    /// Hole diameter in inches.
    #[serde(default = "default_hole_diameter")]
    pub hole_diameter: f64,
    pub observations: Vec<Observation>,
}

impl PuttingData {
    pub fn new(ball_diameter: f64, hole_diameter: f64, observations: Vec<Observation>) -> Self {
        Self {
            ball_diameter,
            hole_diameter,
            observations,
        }
    }

    /// Dataset using regulation ball and hole sizes.
    pub fn with_standard_constants(observations: Vec<Observation>) -> Self {
        Self::new(STANDARD_BALL_DIAMETER, STANDARD_HOLE_DIAMETER, observations)
    }

    pub fn from_json(input: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn constants(&self) -> Result<PhysicalConstants, DomainError> {
        PhysicalConstants::from_diameters(self.ball_diameter, self.hole_diameter)
    }

    /// Validate every record and the constants.
    ///
    /// Data errors are reported before domain errors so that a malformed
    /// row is never masked by a constants problem.
    pub fn validate(&self) -> Result<PhysicalConstants, Error> {
        if self.observations.is_empty() {
            return Err(DataError::Empty.into());
        }
        for (index, obs) in self.observations.iter().enumerate() {
            obs.validate(index)?;
        }
        self.total_attempts()?;
        Ok(self.constants()?)
    }

    /// Smallest and largest observed distance.
    pub fn distance_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.observations.iter().map(|o| o.distance);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Sum of attempts over all observations.
    pub fn total_attempts(&self) -> Result<u64, DataError> {
        checked_total("attempts", self.observations.iter().map(|o| o.attempts))
    }

    pub fn total_successes(&self) -> Result<u64, DataError> {
        checked_total("successes", self.observations.iter().map(|o| o.successes))
    }
}

fn checked_total(
    field: &'static str,
    mut counts: impl Iterator<Item = u64>,
) -> Result<u64, DataError> {
    counts
        .try_fold(0u64, |acc, n| acc.checked_add(n))
        .ok_or(DataError::TotalOverflow { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_constants_clearance() {
        let c = PhysicalConstants::standard();
        assert!((c.ball_radius() - 0.84).abs() < 1e-12);
        assert!((c.hole_radius() - 2.125).abs() < 1e-12);
        assert!((c.clearance() - 1.285).abs() < 1e-12);
        assert_eq!(
            PhysicalConstants::from_diameters(1.68, 4.25).unwrap(),
            PhysicalConstants::default()
        );
    }

    #[test]
    fn inverted_radii_rejected() {
        let err = PhysicalConstants::from_diameters(4.25, 1.68).unwrap_err();
        assert!(matches!(err, DomainError::InvertedRadii { .. }));
        let err = PhysicalConstants::from_diameters(2.0, 2.0).unwrap_err();
        assert!(matches!(err, DomainError::InvertedRadii { .. }));
    }

    #[test]
    fn non_positive_and_non_finite_constants_rejected() {
        assert!(matches!(
            PhysicalConstants::from_diameters(0.0, 4.25),
            Err(DomainError::NonPositive { .. })
        ));
        assert!(matches!(
            PhysicalConstants::from_diameters(1.68, f64::NAN),
            Err(DomainError::NonFinite { .. })
        ));
    }

    #[test]
    fn observation_validation() {
        assert!(Observation::new(24.0, 10, 10).validate(0).is_ok());
        assert_eq!(
            Observation::new(24.0, 10, 11).validate(2),
            Err(DataError::SuccessesExceedAttempts {
                index: 2,
                successes: 11,
                attempts: 10
            })
        );
        assert_eq!(
            Observation::new(24.0, 0, 0).validate(1),
            Err(DataError::ZeroAttempts { index: 1 })
        );
        assert!(matches!(
            Observation::new(-3.0, 5, 1).validate(0),
            Err(DataError::InvalidDistance { .. })
        ));
        assert!(matches!(
            Observation::new(f64::INFINITY, 5, 1).validate(0),
            Err(DataError::InvalidDistance { .. })
        ));
    }

    #[test]
    fn dataset_validation_order() {
        // Bad row and bad constants: the row is reported first.
        let data = PuttingData::new(5.0, 4.25, vec![Observation::new(24.0, 3, 4)]);
        let err = data.validate().unwrap_err();
        assert!(matches!(err, Error::Data(DataError::SuccessesExceedAttempts { .. })));

        let data = PuttingData::new(5.0, 4.25, vec![Observation::new(24.0, 3, 2)]);
        assert!(matches!(data.validate(), Err(Error::Domain(_))));

        let empty = PuttingData::with_standard_constants(vec![]);
        assert!(matches!(empty.validate(), Err(Error::Data(DataError::Empty))));
    }

    #[test]
    fn totals_that_overflow_are_data_errors() {
        let huge = 1u64 << 63;
        let data = PuttingData::with_standard_constants(vec![
            Observation::new(24.0, huge, 1),
            Observation::new(36.0, huge, 1),
        ]);
        let overflow = DataError::TotalOverflow { field: "attempts" };
        assert_eq!(data.total_attempts(), Err(overflow.clone()));
        assert_eq!(data.total_successes(), Ok(2));
        assert!(matches!(data.validate(), Err(Error::Data(e)) if e == overflow));

        let data = PuttingData::with_standard_constants(vec![
            Observation::new(24.0, huge - 1, 0),
            Observation::new(36.0, huge, 0),
        ]);
        assert_eq!(data.total_attempts(), Ok(u64::MAX));
    }

    #[test]
    fn json_defaults_constants() {
        let json = r#"{"observations":[{"distance":120.0,"attempts":200,"successes":100}]}"#;
        let data = PuttingData::from_json(json).unwrap();
        assert_eq!(data.ball_diameter, STANDARD_BALL_DIAMETER);
        assert_eq!(data.hole_diameter, STANDARD_HOLE_DIAMETER);
        assert_eq!(data.observations[0].successes, 100);
        assert_eq!(data.distance_range(), Some((120.0, 120.0)));
    }

    #[test]
    fn proportion_and_failures() {
        let obs = Observation::new(48.0, 455, 337);
        assert!((obs.proportion() - 337.0 / 455.0).abs() < 1e-15);
        assert_eq!(obs.failures(), 118);
    }
}
