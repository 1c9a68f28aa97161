//! Configuration loading and resolution tests against real files.
//!
//! Covers:
//! - TOML and JSON files on disk
//! - Resolution order (CLI > PUTT_CONFIG > defaults)
//! - Validation failures surfaced from file loads

use putt_config::resolve::ENV_CONFIG_PATH;
use putt_config::{
    load_resolved, resolve_config_path, ConfigSnapshot, ConfigSource, RunConfig, SamplerKind,
    SigmaPrior, ValidationError,
};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    key: String,
    value: Option<String>,
}

impl EnvGuard {
    fn set(key: &str, value: &Path) -> Self {
        let saved = env::var(key).ok();
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            value: saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.value {
            Some(value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

const TOML_CONFIG: &str = r#"
schema_version = "1.0.0"

[prior]
kind = "half_normal"
scale = 0.5

[sampler]
kind = "metropolis"
chains = 2
iterations = 400
warmup = 100
seed = 1234
"#;

#[test]
fn loads_toml_file_from_cli_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fit.toml");
    fs::write(&path, TOML_CONFIG).unwrap();

    let loaded = load_resolved(Some(&path)).unwrap();
    assert_eq!(loaded.source, ConfigSource::CliArgument);
    assert_eq!(loaded.config.prior, SigmaPrior::HalfNormal { scale: 0.5 });
    assert_eq!(loaded.config.sampler.kind, SamplerKind::Metropolis);
    assert_eq!(loaded.config.sampler.retained_iterations(), 300);
    assert_eq!(loaded.raw.as_deref(), Some(TOML_CONFIG));
}

#[test]
fn loads_json_file_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fit.json");
    fs::write(&path, r#"{"sampler": {"chains": 3, "seed": 9}}"#).unwrap();

    let loaded = load_resolved(Some(&path)).unwrap();
    assert_eq!(loaded.config.sampler.chains, 3);
    assert_eq!(loaded.config.sampler.seed, Some(9));
    assert_eq!(loaded.config.prior, SigmaPrior::default());
}

#[test]
fn invalid_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sampler]\nchains = 0\n").unwrap();

    let err = load_resolved(Some(&path)).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "sampler.chains"));
}

#[test]
fn env_var_used_when_no_cli_path() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("env.toml");
        fs::write(&path, "[sampler]\nseed = 77\n").unwrap();
        let _guard = EnvGuard::set(ENV_CONFIG_PATH, &path);

        let (resolved, source) = resolve_config_path(None);
        assert_eq!(resolved.as_deref(), Some(path.as_path()));
        assert_eq!(source, ConfigSource::Environment);

        let loaded = load_resolved(None).unwrap();
        assert_eq!(loaded.config.sampler.seed, Some(77));
    });
}

#[test]
fn cli_path_beats_env_var() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let env_path = dir.path().join("env.toml");
        let cli_path = dir.path().join("cli.toml");
        fs::write(&env_path, "[sampler]\nseed = 1\n").unwrap();
        fs::write(&cli_path, "[sampler]\nseed = 2\n").unwrap();
        let _guard = EnvGuard::set(ENV_CONFIG_PATH, &env_path);

        let loaded = load_resolved(Some(&cli_path)).unwrap();
        assert_eq!(loaded.source, ConfigSource::CliArgument);
        assert_eq!(loaded.config.sampler.seed, Some(2));
    });
}

#[test]
fn missing_env_target_falls_through() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let _guard = EnvGuard::set(ENV_CONFIG_PATH, &dir.path().join("absent.toml"));

        let (_, source) = resolve_config_path(None);
        assert_ne!(source, ConfigSource::Environment);
    });
}

#[test]
fn snapshot_hashes_file_and_effective_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fit.toml");
    fs::write(&path, TOML_CONFIG).unwrap();
    let loaded = load_resolved(Some(&path)).unwrap();

    let mut effective = loaded.config.clone();
    let same = ConfigSnapshot::new(&loaded, &effective);
    effective.sampler.seed = Some(1);
    let overridden = ConfigSnapshot::new(&loaded, &effective);

    assert_eq!(same.file_hash, overridden.file_hash);
    assert!(!same.matches(&overridden));
    assert_eq!(overridden.config.sampler.seed, Some(1));
    assert_ne!(RunConfig::default(), overridden.config);
}
