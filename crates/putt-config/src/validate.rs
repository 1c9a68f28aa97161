//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::run::{DiagnosticsConfig, PredictiveConfig, RunConfig, SamplerConfig, SigmaPrior};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Deepest trajectory tree the NUTS sampler may build (2^30 leapfrog steps).
const MAX_TREE_DEPTH_LIMIT: u32 = 30;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn require_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("Must be positive and finite, got {}", value)));
    }
    Ok(())
}

/// Validate a run configuration semantically.
pub fn validate_config(config: &RunConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    require_positive("constants.ball_diameter", config.constants.ball_diameter)?;
    require_positive("constants.hole_diameter", config.constants.hole_diameter)?;
    if config.constants.ball_diameter >= config.constants.hole_diameter {
        return Err(ValidationError::SemanticError(format!(
            "Ball diameter {} must be smaller than hole diameter {}",
            config.constants.ball_diameter, config.constants.hole_diameter
        )));
    }

    validate_prior(&config.prior)?;
    validate_sampler(&config.sampler)?;
    validate_diagnostics(&config.diagnostics)?;
    validate_predictive(&config.predictive)?;

    Ok(())
}

fn validate_prior(prior: &SigmaPrior) -> ValidationResult<()> {
    require_positive("prior.scale", prior.scale())
}

/// Validate sampler settings; also used for CLI overrides applied after load.
pub fn validate_sampler(sampler: &SamplerConfig) -> ValidationResult<()> {
    if sampler.chains == 0 {
        return Err(invalid("sampler.chains", "Must be at least 1"));
    }
    if sampler.iterations == 0 {
        return Err(invalid("sampler.iterations", "Must be at least 1"));
    }
    if let Some(warmup) = sampler.warmup {
        if warmup >= sampler.iterations {
            return Err(invalid(
                "sampler.warmup",
                format!(
                    "Must be smaller than iterations ({}), got {}",
                    sampler.iterations, warmup
                ),
            ));
        }
    }
    if let Some(init) = sampler.initial_value {
        require_positive("sampler.initial_value", init)?;
    }
    if sampler.max_tree_depth == 0 || sampler.max_tree_depth > MAX_TREE_DEPTH_LIMIT {
        return Err(invalid(
            "sampler.max_tree_depth",
            format!("Must be in [1, {}], got {}", MAX_TREE_DEPTH_LIMIT, sampler.max_tree_depth),
        ));
    }
    if !(sampler.target_accept > 0.0 && sampler.target_accept < 1.0) {
        return Err(invalid(
            "sampler.target_accept",
            format!("Must be in (0, 1), got {}", sampler.target_accept),
        ));
    }
    Ok(())
}

fn validate_diagnostics(diag: &DiagnosticsConfig) -> ValidationResult<()> {
    if !diag.rhat_threshold.is_finite() || diag.rhat_threshold <= 1.0 {
        return Err(invalid(
            "diagnostics.rhat_threshold",
            format!("Must be greater than 1, got {}", diag.rhat_threshold),
        ));
    }
    if !(diag.ess_ratio_threshold > 0.0 && diag.ess_ratio_threshold <= 1.0) {
        return Err(invalid(
            "diagnostics.ess_ratio_threshold",
            format!("Must be in (0, 1], got {}", diag.ess_ratio_threshold),
        ));
    }
    require_positive("diagnostics.ebfmi_threshold", diag.ebfmi_threshold)?;
    if diag.max_lag == 0 {
        return Err(invalid("diagnostics.max_lag", "Must be at least 1"));
    }
    Ok(())
}

fn validate_predictive(pred: &PredictiveConfig) -> ValidationResult<()> {
    if pred.grid_points < 2 {
        return Err(invalid(
            "predictive.grid_points",
            format!("Must be at least 2, got {}", pred.grid_points),
        ));
    }
    for (i, level) in pred.band_levels.iter().enumerate() {
        if !(*level > 0.0 && *level < 1.0) {
            return Err(invalid(
                &format!("predictive.band_levels[{}]", i),
                format!("Must be in (0, 1), got {}", level),
            ));
        }
        if pred.band_levels[..i].contains(level) {
            return Err(invalid(
                &format!("predictive.band_levels[{}]", i),
                format!("Duplicate band level {}", level),
            ));
        }
    }
    require_positive("predictive.se_multiplier", pred.se_multiplier)?;
    Ok(())
}
