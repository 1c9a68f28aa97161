//! Core math modules.

pub mod binomial;
pub mod gamma;
pub mod half;
pub mod normal;
pub mod sample;
pub mod stable;
