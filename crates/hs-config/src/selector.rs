//! Selector and trainer configuration types.
//!
//! These types match the selector.json layout:
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "selector": { "min_components": 2, "max_components": 10, "n_constant": 3,
//!                 "random_state": 14, "verbose": false },
//!   "trainer": { "n_iter": 1000, "tol": 0.01, "min_covar": 0.001, "kmeans_iters": 10 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

use crate::validate::ValidationError;

/// Complete selector.json configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmSelectConfig {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub selector: SelectorConfig,

    #[serde(default)]
    pub trainer: TrainerConfig,
}

impl Default for HmmSelectConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            selector: SelectorConfig::default(),
            trainer: TrainerConfig::default(),
        }
    }
}

impl HmmSelectConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }
}

/// Model-order search parameters shared by every selection strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Smallest hidden-state count tried (inclusive).
    pub min_components: usize,

    /// Largest hidden-state count tried (inclusive).
    pub max_components: usize,

    /// State count used by the constant strategy.
    pub n_constant: usize,

    /// Seed handed to every training run and fold shuffle.
    pub random_state: u64,

    /// Promote per-candidate diagnostics from debug to info.
    pub verbose: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_components: 2,
            max_components: 10,
            n_constant: 3,
            random_state: 14,
            verbose: false,
        }
    }
}

impl SelectorConfig {
    /// Candidate state counts in ascending order.
    pub fn candidates(&self) -> RangeInclusive<usize> {
        self.min_components..=self.max_components
    }

    /// Set the inclusive search range.
    pub fn with_range(mut self, min_components: usize, max_components: usize) -> Self {
        self.min_components = min_components;
        self.max_components = max_components;
        self
    }

    /// Set the constant-strategy state count.
    pub fn with_constant(mut self, n_constant: usize) -> Self {
        self.n_constant = n_constant;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Enable verbose per-candidate logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Baum-Welch training knobs for the Gaussian HMM trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Maximum EM iterations.
    pub n_iter: usize,

    /// Stop when the log-likelihood gain of one iteration drops below this.
    pub tol: f64,

    /// Floor added to every variance estimate.
    pub min_covar: f64,

    /// Lloyd iterations used to seed the state means.
    pub kmeans_iters: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_iter: 1000,
            tol: 1e-2,
            min_covar: 1e-3,
            kmeans_iters: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = SelectorConfig::default();
        assert_eq!(cfg.min_components, 2);
        assert_eq!(cfg.max_components, 10);
        assert_eq!(cfg.n_constant, 3);
        assert_eq!(cfg.random_state, 14);
        assert!(!cfg.verbose);
        assert_eq!(cfg.candidates().collect::<Vec<_>>(), (2..=10).collect::<Vec<_>>());
    }

    #[test]
    fn builder_overrides() {
        let cfg = SelectorConfig::default()
            .with_range(3, 5)
            .with_constant(4)
            .with_seed(7)
            .with_verbose(true);
        assert_eq!(cfg.candidates().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(cfg.n_constant, 4);
        assert_eq!(cfg.random_state, 7);
        assert!(cfg.verbose);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"schema_version": "1.0.0", "selector": {"max_components": 4}}"#;
        let cfg = HmmSelectConfig::from_json(json).unwrap();
        assert_eq!(cfg.selector.min_components, 2);
        assert_eq!(cfg.selector.max_components, 4);
        assert_eq!(cfg.trainer, TrainerConfig::default());
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = HmmSelectConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = HmmSelectConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back = HmmSelectConfig::from_json(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
