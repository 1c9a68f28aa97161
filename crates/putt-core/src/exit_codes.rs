//! Exit codes for the putt CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Completed runs (1 = completed with convergence warnings)
//! - 10-19: User/input errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use putt_common::Error;
use putt_config::ValidationError;

/// Exit codes for putt operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success: run completed, no warnings
    Clean = 0,

    /// Fit completed but convergence diagnostics raised warnings
    ConvergenceWarnings = 1,

    /// Invalid arguments
    ArgsError = 10,

    /// Dataset invalid or unparseable
    DataError = 11,

    /// Mathematically impossible input (distance below clearance, sigma <= 0)
    DomainError = 12,

    /// Configuration invalid
    ConfigError = 13,

    /// I/O error
    IoError = 14,

    /// Internal or sampler error (bug - please report)
    InternalError = 20,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if the command produced its payload (codes 0-1).
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::ConvergenceWarnings)
    }

    /// Check if this exit code is a user/input error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ConvergenceWarnings => "OK_WARNINGS",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::DataError => "ERR_DATA",
            ExitCode::DomainError => "ERR_DOMAIN",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::IoError => "ERR_IO",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Data(_) => ExitCode::DataError,
            Error::Domain(_) => ExitCode::DomainError,
            Error::Config(_) => ExitCode::ConfigError,
            Error::Io(_) | Error::Json(_) => ExitCode::IoError,
            Error::Sampler(_) => ExitCode::InternalError,
        }
    }
}

impl From<&ValidationError> for ExitCode {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::IoError(_) => ExitCode::IoError,
            _ => ExitCode::ConfigError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use putt_common::{DataError, DomainError};

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::ConvergenceWarnings.as_i32(), 1);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::DataError.as_i32(), 11);
        assert_eq!(ExitCode::DomainError.as_i32(), 12);
        assert_eq!(ExitCode::ConfigError.as_i32(), 13);
        assert_eq!(ExitCode::IoError.as_i32(), 14);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
    }

    #[test]
    fn test_classification() {
        assert!(ExitCode::ConvergenceWarnings.is_success());
        assert!(ExitCode::DataError.is_user_error());
        assert!(!ExitCode::InternalError.is_user_error());
        assert!(ExitCode::InternalError.is_internal_error());
    }

    #[test]
    fn test_error_mapping() {
        let data: Error = DataError::Empty.into();
        assert_eq!(ExitCode::from(&data), ExitCode::DataError);
        let domain: Error = DomainError::NonPositiveSigma { sigma: -1.0 }.into();
        assert_eq!(ExitCode::from(&domain), ExitCode::DomainError);
        let sampler = Error::Sampler("chain 2 panicked".to_string());
        assert_eq!(ExitCode::from(&sampler), ExitCode::InternalError);
        let io = ValidationError::IoError("missing".to_string());
        assert_eq!(ExitCode::from(&io), ExitCode::IoError);
        let bad = ValidationError::SemanticError("bad".to_string());
        assert_eq!(ExitCode::from(&bad), ExitCode::ConfigError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::DataError.to_string(), "ERR_DATA (11)");
    }
}
