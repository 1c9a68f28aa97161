//! Golf Putting Precision Core Library
//!
//! This library provides the core functionality for fitting putting data:
//! - The geometric success-probability model and its log posterior
//! - NUTS and adaptive Metropolis posterior samplers
//! - Convergence diagnostics and posterior predictive curves
//! - Data summaries, fake-data simulation, and the fit pipeline
//! - Exit codes and logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod diagnostics;
pub mod exit_codes;
pub mod fit;
pub mod logging;
pub mod model;
pub mod predictive;
pub mod sampler;
pub mod simulate;
pub mod summary;

pub use fit::{fit, fit_with, FitOptions, FitReport};
