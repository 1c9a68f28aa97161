//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → `PUTT_CONFIG` → XDG config → defaults.

use std::path::{Path, PathBuf};

use crate::run::{ConfigFormat, RunConfig};
use crate::validate::{ValidationError, ValidationResult};

/// Where the configuration was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable naming a config file.
pub const ENV_CONFIG_PATH: &str = "PUTT_CONFIG";

/// Standard config file name.
const CONFIG_FILENAME: &str = "config.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "putt";

/// Resolve the configuration file path.
///
/// An explicit CLI path is returned even if it does not exist so that the
/// load reports the missing file instead of silently using defaults. The
/// environment variable and XDG locations are only used when the file exists.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    // 1. CLI argument
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 3. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    // 4. Built-in default
    (None, ConfigSource::BuiltinDefault)
}

/// Get the XDG config directory for putt.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// A validated configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RunConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    /// Raw file text, kept for the snapshot hash.
    pub raw: Option<String>,
}

impl LoadedConfig {
    /// Built-in defaults with no backing file.
    pub fn defaults() -> Self {
        Self {
            config: RunConfig::default(),
            path: None,
            source: ConfigSource::BuiltinDefault,
            raw: None,
        }
    }
}

/// Resolve, read, parse, and validate the configuration.
pub fn load_resolved(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    let (path, source) = resolve_config_path(cli_path);
    let Some(path) = path else {
        return Ok(LoadedConfig::defaults());
    };

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = RunConfig::from_str_as(&raw, ConfigFormat::from_path(&path))?;

    Ok(LoadedConfig {
        config,
        path: Some(path),
        source,
        raw: Some(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn cli_path_wins_even_if_missing() {
        let missing = Path::new("/nonexistent/putt/config.toml");
        let (path, source) = resolve_config_path(Some(missing));
        assert_eq!(path.as_deref(), Some(missing));
        assert_eq!(source, ConfigSource::CliArgument);

        let err = load_resolved(Some(missing)).unwrap_err();
        assert!(matches!(err, ValidationError::IoError(_)));
    }

    #[test]
    fn xdg_dir_ends_with_app_name() {
        if let Some(dir) = xdg_config_dir() {
            assert!(dir.ends_with("putt"));
        }
    }
}
