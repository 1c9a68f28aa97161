//! Putting precision run configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the run configuration (TOML or JSON)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots recorded in fit reports

pub mod resolve;
pub mod run;
pub mod snapshot;
pub mod validate;

pub use resolve::{load_resolved, resolve_config_path, ConfigSource, LoadedConfig};
pub use run::{
    ConfigFormat, ConstantsConfig, DiagnosticsConfig, PredictiveConfig, QuantileMode, RunConfig,
    SamplerConfig, SamplerKind, SigmaPrior,
};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
