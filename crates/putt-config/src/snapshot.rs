//! Configuration snapshots for fit provenance.
//!
//! A snapshot captures the exact configuration a fit ran with, so a report
//! can be audited and the fit reproduced later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::LoadedConfig;
use crate::run::RunConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Where the configuration came from.
    pub source: String,

    /// Path the configuration was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// SHA-256 of the raw config file text.
    #[serde(default)]
    pub file_hash: Option<String>,

    /// SHA-256 of the effective configuration (after CLI overrides).
    pub effective_hash: String,

    /// The effective configuration.
    pub config: RunConfig,
}

impl ConfigSnapshot {
    /// Snapshot a loaded configuration. `effective` is the configuration the
    /// fit actually runs with, which may differ from the file by CLI overrides.
    pub fn new(loaded: &LoadedConfig, effective: &RunConfig) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            source: loaded.source.to_string(),
            path: loaded.path.as_ref().map(|p| p.display().to_string()),
            file_hash: loaded.raw.as_deref().map(hash_content),
            effective_hash: hash_config(effective),
            config: effective.clone(),
        }
    }

    /// Create a snapshot with only defaults (no config file loaded).
    pub fn defaults_only() -> Self {
        Self::new(&LoadedConfig::defaults(), &RunConfig::default())
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same effective config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.effective_hash[..12.min(self.effective_hash.len())]
    }
}

fn hash_config(config: &RunConfig) -> String {
    // Field order is fixed by the struct definition, so the JSON is canonical.
    match serde_json::to_string(config) {
        Ok(json) => hash_content(&json),
        Err(_) => hash_content("unserializable"),
    }
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
