//! Error types for the putting precision model.
//!
//! Two failure kinds are part of the model contract and abort a run before
//! any sampling happens:
//! - [`DomainError`]: a mathematically impossible input (distance shorter than
//!   the hole clearance, inverted radii, non-positive sigma)
//! - [`DataError`]: an observation that violates the data model
//!   (`successes > attempts`, non-positive distance, zero attempts)
//!
//! Everything else is folded into the unified [`Error`] with stable codes,
//! categories, and remediation hints. Convergence problems are *not* errors;
//! they are reported as warnings alongside the draws.
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 21,
//!   "category": "data",
//!   "message": "data error: observation 3: successes 12 exceed attempts 10",
//!   "remediation": "Fix the offending row in the dataset ..."
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for putting model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Geometrically or mathematically impossible model inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("distance {distance} is shorter than the hole clearance {clearance} (hole radius - ball radius)")]
    DistanceTooShort { distance: f64, clearance: f64 },

    #[error("ball radius {ball_radius} must be smaller than hole radius {hole_radius}")]
    InvertedRadii { ball_radius: f64, hole_radius: f64 },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("sigma must be a positive finite angle in radians, got {sigma}")]
    NonPositiveSigma { sigma: f64 },

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
}

/// Observation records that violate the data model.
///
/// `index` is the zero-based position of the record in the dataset, `line`
/// the one-based line in a parsed text table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("dataset contains no observations")]
    Empty,

    #[error("observation {index}: successes {successes} exceed attempts {attempts}")]
    SuccessesExceedAttempts {
        index: usize,
        successes: u64,
        attempts: u64,
    },

    #[error("observation {index}: distance must be positive and finite, got {distance}")]
    InvalidDistance { index: usize, distance: f64 },

    #[error("observation {index}: attempts must be positive")]
    ZeroAttempts { index: usize },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("total {field} across observations exceeds {max}", max = u64::MAX)]
    TotalOverflow { field: &'static str },
}

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Impossible model inputs.
    Domain,
    /// Invalid observations or unparseable datasets.
    Data,
    /// Configuration file errors.
    Config,
    /// Posterior sampler failures.
    Sampler,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Domain => write!(f, "domain"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Sampler => write!(f, "sampler"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the putting precision workspace.
#[derive(Error, Debug)]
pub enum Error {
    // Domain errors (10-19)
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    // Data errors (20-29)
    #[error("data error: {0}")]
    Data(#[from] DataError),

    // Configuration errors (30-39)
    #[error("configuration error: {0}")]
    Config(String),

    // Sampler errors (40-49)
    #[error("sampler failed: {0}")]
    Sampler(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Domain errors
    /// - 20-29: Data errors
    /// - 30-39: Configuration errors
    /// - 40-49: Sampler errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Domain(DomainError::DistanceTooShort { .. }) => 10,
            Error::Domain(DomainError::InvertedRadii { .. }) => 11,
            Error::Domain(DomainError::NonPositive { .. }) => 12,
            Error::Domain(DomainError::NonPositiveSigma { .. }) => 13,
            Error::Domain(DomainError::NonFinite { .. }) => 14,
            Error::Data(DataError::Empty) => 20,
            Error::Data(DataError::SuccessesExceedAttempts { .. }) => 21,
            Error::Data(DataError::InvalidDistance { .. }) => 22,
            Error::Data(DataError::ZeroAttempts { .. }) => 23,
            Error::Data(DataError::Parse { .. }) => 24,
            Error::Data(DataError::TotalOverflow { .. }) => 25,
            Error::Config(_) => 30,
            Error::Sampler(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Domain(_) => ErrorCategory::Domain,
            Error::Data(_) => ErrorCategory::Data,
            Error::Config(_) => ErrorCategory::Config,
            Error::Sampler(_) => ErrorCategory::Sampler,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Domain(DomainError::DistanceTooShort { .. }) => {
                "Every distance must be at least the hole radius minus the ball radius. Check the distance unit (inches expected)."
            }
            Error::Domain(DomainError::InvertedRadii { .. }) => {
                "The ball diameter must be smaller than the hole diameter. Check the constants section of the config."
            }
            Error::Domain(DomainError::NonPositive { .. } | DomainError::NonFinite { .. }) => {
                "Physical constants must be positive finite numbers."
            }
            Error::Domain(DomainError::NonPositiveSigma { .. }) => {
                "Sigma is an angular standard deviation and must be strictly positive."
            }
            Error::Data(DataError::Parse { .. }) => {
                "The dataset needs a header naming distance, attempts, and successes columns. Use '#' for comments."
            }
            Error::Data(DataError::TotalOverflow { .. }) => {
                "Attempt and success counts must sum to a 64-bit total. Split the dataset or rescale the counts."
            }
            Error::Data(_) => {
                "Fix the offending row in the dataset: distance > 0, attempts > 0, and successes <= attempts."
            }
            Error::Config(_) => {
                "Run 'putt config validate' to locate the problem, or remove the config file to use defaults."
            }
            Error::Sampler(_) => {
                "Retry with a different --seed or an explicit --init value. If persistent, report with the fit config."
            }
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Invalid JSON input. Check syntax with 'jq . <file>'.",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Remediation hint.
    pub remediation: String,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            remediation: err.remediation().to_string(),
        }
    }
}

impl StructuredError {
    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code))
    }
}
