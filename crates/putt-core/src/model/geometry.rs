//! Capture angle of a putt.
//!
//! A ball of radius `r` rolling towards a hole of radius `R` at distance `x`
//! drops when its aim deviates from the centre line by less than
//! `asin((R - r) / x)`.

use putt_common::{DomainError, PhysicalConstants};

/// Largest angular error (radians) that still holes a putt from `distance`.
///
/// Fails with [`DomainError::DistanceTooShort`] when the distance is below
/// the clearance `hole_radius - ball_radius`, since the angle is undefined
/// there. At exactly the clearance the angle is `π/2`.
pub fn capture_angle(distance: f64, constants: &PhysicalConstants) -> Result<f64, DomainError> {
    if !distance.is_finite() {
        return Err(DomainError::NonFinite {
            name: "distance",
            value: distance,
        });
    }
    let clearance = constants.clearance();
    if distance < clearance {
        return Err(DomainError::DistanceTooShort {
            distance,
            clearance,
        });
    }
    Ok((clearance / distance).min(1.0).asin())
}

/// [`capture_angle`] with explicit radii, validated on every call.
pub fn capture_angle_from_radii(
    distance: f64,
    ball_radius: f64,
    hole_radius: f64,
) -> Result<f64, DomainError> {
    let constants = PhysicalConstants::from_radii(ball_radius, hole_radius)?;
    capture_angle(distance, &constants)
}
