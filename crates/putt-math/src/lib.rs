//! Putting model math utilities.

pub mod math;

pub use math::binomial::*;
pub use math::gamma::*;
pub use math::half::*;
pub use math::normal::*;
pub use math::sample;
pub use math::stable::*;
