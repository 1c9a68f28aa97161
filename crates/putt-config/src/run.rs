//! Run configuration types.
//!
//! Every section has complete defaults, so an empty file (or no file at all)
//! describes the standard fit: half-Cauchy(0, 2.5) prior, 4 NUTS chains of
//! 2000 iterations with the first half spent on warm-up.
//!
//! ```toml
//! schema_version = "1.0.0"
//!
//! [prior]
//! kind = "half_cauchy"
//! scale = 2.5
//!
//! [sampler]
//! kind = "nuts"
//! chains = 4
//! iterations = 2000
//! seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::validate::{validate_config, ValidationError, ValidationResult};

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub constants: ConstantsConfig,

    #[serde(default)]
    pub prior: SigmaPrior,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    #[serde(default)]
    pub predictive: PredictiveConfig,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            constants: ConstantsConfig::default(),
            prior: SigmaPrior::default(),
            sampler: SamplerConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            predictive: PredictiveConfig::default(),
        }
    }
}

/// On-disk syntax of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

impl RunConfig {
    /// Load, parse, and validate a configuration file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str_as(&content, ConfigFormat::from_path(path))
    }

    /// Parse and validate configuration text.
    pub fn from_str_as(content: &str, format: ConfigFormat) -> ValidationResult<Self> {
        let config: RunConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))?,
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))?,
        };
        validate_config(&config)?;
        Ok(config)
    }

    /// Render as TOML (used by `putt config show`).
    pub fn to_toml(&self) -> ValidationResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ValidationError::ParseError(format!("Cannot render TOML: {}", e)))
    }
}

/// Ball and hole diameters in inches, applied to text-table datasets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantsConfig {
    #[serde(default = "default_ball_diameter")]
    pub ball_diameter: f64,
    #[serde(default = "default_hole_diameter")]
    pub hole_diameter: f64,
}

fn default_ball_diameter() -> f64 {
    1.68
}

fn default_hole_diameter() -> f64 {
    4.25
}

impl Default for ConstantsConfig {
    fn default() -> Self {
        Self {
            ball_diameter: default_ball_diameter(),
            hole_diameter: default_hole_diameter(),
        }
    }
}

/// Prior on the angular error `sigma`, restricted to the positive half-line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SigmaPrior {
    /// Half-Cauchy(0, scale).
    HalfCauchy {
        #[serde(default = "default_cauchy_scale")]
        scale: f64,
    },
    /// Half-Normal(0, scale).
    HalfNormal {
        #[serde(default = "default_normal_scale")]
        scale: f64,
    },
}

fn default_cauchy_scale() -> f64 {
    2.5
}

fn default_normal_scale() -> f64 {
    1.0
}

impl Default for SigmaPrior {
    fn default() -> Self {
        SigmaPrior::HalfCauchy {
            scale: default_cauchy_scale(),
        }
    }
}

impl SigmaPrior {
    pub fn scale(&self) -> f64 {
        match *self {
            SigmaPrior::HalfCauchy { scale } | SigmaPrior::HalfNormal { scale } => scale,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SigmaPrior::HalfCauchy { .. } => "half_cauchy",
            SigmaPrior::HalfNormal { .. } => "half_normal",
        }
    }
}

/// Which sampling strategy drives the chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    /// No-U-Turn Hamiltonian Monte Carlo.
    #[default]
    Nuts,
    /// Adaptive random-walk Metropolis.
    Metropolis,
}

impl std::fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplerKind::Nuts => write!(f, "nuts"),
            SamplerKind::Metropolis => write!(f, "metropolis"),
        }
    }
}

/// Posterior sampler settings.
///
/// `iterations` counts every iteration of a chain, warm-up included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default)]
    pub kind: SamplerKind,

    #[serde(default = "default_chains")]
    pub chains: usize,

    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Warm-up iterations; half of `iterations` when unset.
    #[serde(default)]
    pub warmup: Option<usize>,

    /// Base seed; chain `c` uses `seed + c`. Drawn from OS entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Starting sigma for every chain; random initialization when unset.
    #[serde(default)]
    pub initial_value: Option<f64>,

    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: u32,

    #[serde(default = "default_target_accept")]
    pub target_accept: f64,

    #[serde(default)]
    pub save_warmup: bool,
}

fn default_chains() -> usize {
    4
}

fn default_iterations() -> usize {
    2000
}

fn default_max_tree_depth() -> u32 {
    10
}

fn default_target_accept() -> f64 {
    0.8
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            kind: SamplerKind::default(),
            chains: default_chains(),
            iterations: default_iterations(),
            warmup: None,
            seed: None,
            initial_value: None,
            max_tree_depth: default_max_tree_depth(),
            target_accept: default_target_accept(),
            save_warmup: false,
        }
    }
}

impl SamplerConfig {
    /// Effective warm-up length.
    pub fn warmup_iterations(&self) -> usize {
        self.warmup.unwrap_or(self.iterations / 2)
    }

    /// Draws kept per chain after warm-up.
    pub fn retained_iterations(&self) -> usize {
        self.iterations.saturating_sub(self.warmup_iterations())
    }
}

/// Thresholds for convergence warnings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_rhat_threshold")]
    pub rhat_threshold: f64,

    #[serde(default = "default_ess_ratio_threshold")]
    pub ess_ratio_threshold: f64,

    #[serde(default = "default_ebfmi_threshold")]
    pub ebfmi_threshold: f64,

    /// Largest autocorrelation lag reported per chain.
    #[serde(default = "default_max_lag")]
    pub max_lag: usize,
}

fn default_rhat_threshold() -> f64 {
    1.01
}

fn default_ess_ratio_threshold() -> f64 {
    0.1
}

fn default_ebfmi_threshold() -> f64 {
    0.3
}

fn default_max_lag() -> usize {
    50
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            rhat_threshold: default_rhat_threshold(),
            ess_ratio_threshold: default_ess_ratio_threshold(),
            ebfmi_threshold: default_ebfmi_threshold(),
            max_lag: default_max_lag(),
        }
    }
}

/// How per-point quantiles of the predictive curves are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantileMode {
    /// P² estimators, constant memory per grid point.
    #[default]
    Streaming,
    /// Keep every value and sort; exact but linear memory.
    Exact,
}

/// Posterior predictive grid and band settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveConfig {
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,

    /// Start the grid at the hole clearance instead of the shortest observed
    /// distance.
    #[serde(default)]
    pub grid_from_clearance: bool,

    /// Central credible band masses, e.g. 0.5 and 0.9.
    #[serde(default = "default_band_levels")]
    pub band_levels: Vec<f64>,

    /// Maximum number of raw curves kept for overlay plots.
    #[serde(default = "default_ensemble_size")]
    pub ensemble_size: usize,

    #[serde(default)]
    pub quantile_mode: QuantileMode,

    /// Width of the empirical error bars in standard errors.
    #[serde(default = "default_se_multiplier")]
    pub se_multiplier: f64,
}

fn default_grid_points() -> usize {
    100
}

fn default_band_levels() -> Vec<f64> {
    vec![0.5, 0.9]
}

fn default_ensemble_size() -> usize {
    100
}

fn default_se_multiplier() -> f64 {
    1.0
}

impl Default for PredictiveConfig {
    fn default() -> Self {
        Self {
            grid_points: default_grid_points(),
            grid_from_clearance: false,
            band_levels: default_band_levels(),
            ensemble_size: default_ensemble_size(),
            quantile_mode: QuantileMode::default(),
            se_multiplier: default_se_multiplier(),
        }
    }
}
