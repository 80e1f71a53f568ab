//! Configuration loading for the CLI.
//!
//! Resolves selector.json (CLI → env → XDG → defaults), parses and
//! validates it, and records a snapshot of what was used.

use hs_config::{
    resolve_config, validate_config, ConfigPaths, ConfigSnapshot, ConfigSource, HmmSelectConfig,
    ValidationError,
};
use std::path::PathBuf;
use thiserror::Error;

use crate::logging::event_names;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

impl From<ConfigError> for hs_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid { .. } => hs_common::Error::InvalidConfig(err.to_string()),
            _ => hs_common::Error::Config(err.to_string()),
        }
    }
}

/// Where to look for configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Explicit selector.json path; must exist when given.
    pub config_path: Option<PathBuf>,
}

/// Loaded configuration plus provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: HmmSelectConfig,
    pub paths: ConfigPaths,
    pub snapshot: ConfigSnapshot,
}

impl ResolvedConfig {
    pub fn using_defaults(&self) -> bool {
        self.paths.selector.is_none()
    }
}

/// Resolve, read, parse, and validate the selector configuration.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = &options.config_path {
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.clone() });
        }
    }

    let paths = resolve_config(options.config_path.as_deref());
    let Some(path) = paths.selector.clone() else {
        tracing::info!(
            target: event_names::CONFIG_DEFAULT_USED,
            source = %ConfigSource::BuiltinDefault,
            "no selector.json found, using built-in defaults"
        );
        return Ok(ResolvedConfig {
            config: HmmSelectConfig::default(),
            paths,
            snapshot: ConfigSnapshot::defaults_only(),
        });
    };

    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = HmmSelectConfig::from_json(&raw)
        .and_then(|config| validate_config(&config).map(|()| config))
        .map_err(|source| ConfigError::Invalid {
            path: path.clone(),
            source,
        })?;

    let snapshot = ConfigSnapshot::new(&config, &paths, Some(&raw));
    tracing::info!(
        target: event_names::CONFIG_LOADED,
        path = %path.display(),
        source = %paths.selector_source,
        hash = snapshot.short_id(),
        "loaded selector config"
    );

    Ok(ResolvedConfig {
        config,
        paths,
        snapshot,
    })
}
