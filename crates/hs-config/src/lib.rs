//! hmm-select configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for selector.json (selection range, seed, trainer knobs)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots for reproducible selection runs

pub mod resolve;
pub mod selector;
pub mod snapshot;
pub mod validate;

pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use selector::{HmmSelectConfig, SelectorConfig, TrainerConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{
    validate_config, validate_selector, validate_trainer, ValidationError, ValidationResult,
};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
