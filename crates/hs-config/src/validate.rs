//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::selector::{HmmSelectConfig, SelectorConfig, TrainerConfig};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a full configuration semantically.
pub fn validate_config(config: &HmmSelectConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }
    validate_selector(&config.selector)?;
    validate_trainer(&config.trainer)?;
    Ok(())
}

/// Validate the component search range and constant state count.
pub fn validate_selector(selector: &SelectorConfig) -> ValidationResult<()> {
    if selector.min_components == 0 {
        return Err(ValidationError::InvalidValue {
            field: "selector.min_components".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    if selector.max_components < selector.min_components {
        return Err(ValidationError::SemanticError(format!(
            "max_components ({}) must be >= min_components ({})",
            selector.max_components, selector.min_components
        )));
    }
    if selector.n_constant == 0 {
        return Err(ValidationError::InvalidValue {
            field: "selector.n_constant".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Validate the EM training knobs.
pub fn validate_trainer(trainer: &TrainerConfig) -> ValidationResult<()> {
    if trainer.n_iter == 0 {
        return Err(ValidationError::InvalidValue {
            field: "trainer.n_iter".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    if !(trainer.tol.is_finite() && trainer.tol > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "trainer.tol".to_string(),
            message: format!("must be a positive finite number, got {}", trainer.tol),
        });
    }
    if !(trainer.min_covar.is_finite() && trainer.min_covar > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "trainer.min_covar".to_string(),
            message: format!(
                "must be a positive finite number, got {}",
                trainer.min_covar
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        validate_config(&HmmSelectConfig::default()).unwrap();
    }

    #[test]
    fn rejects_zero_min_components() {
        let selector = SelectorConfig::default().with_range(0, 3);
        let err = validate_selector(&selector).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
        assert_eq!(err.code(), 65);
    }

    #[test]
    fn rejects_inverted_range() {
        let selector = SelectorConfig::default().with_range(5, 4);
        let err = validate_selector(&selector).unwrap_err();
        assert!(matches!(err, ValidationError::SemanticError(_)));
    }

    #[test]
    fn single_point_range_is_valid() {
        let selector = SelectorConfig::default().with_range(3, 3);
        validate_selector(&selector).unwrap();
    }

    #[test]
    fn rejects_zero_constant() {
        let selector = SelectorConfig::default().with_constant(0);
        assert!(validate_selector(&selector).is_err());
    }

    #[test]
    fn rejects_bad_trainer_values() {
        let mut trainer = TrainerConfig::default();
        trainer.tol = 0.0;
        assert!(validate_trainer(&trainer).is_err());

        let mut trainer = TrainerConfig::default();
        trainer.min_covar = f64::NAN;
        assert!(validate_trainer(&trainer).is_err());

        let mut trainer = TrainerConfig::default();
        trainer.n_iter = 0;
        assert!(validate_trainer(&trainer).is_err());
    }

    #[test]
    fn rejects_schema_mismatch() {
        let config = HmmSelectConfig {
            schema_version: "0.1.0".to_string(),
            ..HmmSelectConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
    }
}
