//! Configuration snapshots for run reproducibility.
//!
//! A snapshot records the exact configuration a selection run used, so a
//! result can be traced back to its inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::{ConfigPaths, ConfigSource};
use crate::selector::HmmSelectConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    /// SHA-256 of the raw selector.json content.
    #[serde(default)]
    pub content_hash: Option<String>,

    #[serde(default)]
    pub path: Option<String>,

    pub source: String,

    /// SHA-256 of the effective configuration after defaults were applied.
    pub effective_hash: String,

    pub summary: ConfigSummary,
}

/// Key values of the effective configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub min_components: usize,
    pub max_components: usize,
    pub n_constant: usize,
    pub random_state: u64,
    pub n_iter: usize,
    pub tol: f64,
}

impl ConfigSnapshot {
    /// Create a snapshot from a loaded configuration and its raw JSON.
    pub fn new(config: &HmmSelectConfig, paths: &ConfigPaths, raw_json: Option<&str>) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            content_hash: raw_json.map(hash_content),
            path: paths.selector.as_ref().map(|p| p.display().to_string()),
            source: paths.selector_source.to_string(),
            effective_hash: effective_hash(config),
            summary: ConfigSummary::from(config),
        }
    }

    /// Snapshot for a run with no config file.
    pub fn defaults_only() -> Self {
        let config = HmmSelectConfig::default();
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            content_hash: None,
            path: None,
            source: ConfigSource::BuiltinDefault.to_string(),
            effective_hash: effective_hash(&config),
            summary: ConfigSummary::from(&config),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Two snapshots describe the same effective configuration.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }

    /// First 12 hex chars of the effective hash.
    pub fn short_id(&self) -> &str {
        &self.effective_hash[..12.min(self.effective_hash.len())]
    }
}

impl From<&HmmSelectConfig> for ConfigSummary {
    fn from(config: &HmmSelectConfig) -> Self {
        ConfigSummary {
            min_components: config.selector.min_components,
            max_components: config.selector.max_components,
            n_constant: config.selector.n_constant,
            random_state: config.selector.random_state,
            n_iter: config.trainer.n_iter,
            tol: config.trainer.tol,
        }
    }
}

fn effective_hash(config: &HmmSelectConfig) -> String {
    // Struct field order is fixed, so the serialized form is canonical.
    let canonical = serde_json::to_string(config).unwrap_or_default();
    hash_content(&canonical)
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
