//! Error types for hmm-select.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! Errors serialize to structured JSON on the CLI's stdout:
//! ```json
//! {
//!   "code": 20,
//!   "category": "corpus",
//!   "message": "corpus error: category 'DOG' has no sequences",
//!   "recoverable": true,
//!   "context": {}
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::sequence::CorpusError;

/// Result type alias for hmm-select operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Corpus or test set shape errors.
    Corpus,
    /// Model training and selection errors.
    Selection,
    /// Recognition errors.
    Recognition,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Corpus => write!(f, "corpus"),
            ErrorCategory::Selection => write!(f, "selection"),
            ErrorCategory::Recognition => write!(f, "recognition"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for hmm-select.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid selector configuration: {0}")]
    InvalidConfig(String),

    // Corpus errors (20-29)
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),

    // Selection errors (30-39)
    #[error("no viable model for category '{category}'")]
    NoViableModel { category: String },

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    // Recognition errors (40-49)
    #[error("recognition failed: {0}")]
    Recognition(String),

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
    /// - 10-19: Configuration errors
    /// - 20-29: Corpus errors
    /// - 30-39: Selection errors
    /// - 40-49: Recognition errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::Corpus(_) => 20,
            Error::NoViableModel { .. } => 30,
            Error::UnknownCategory(_) => 31,
            Error::Recognition(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::Corpus(_) => ErrorCategory::Corpus,
            Error::NoViableModel { .. } | Error::UnknownCategory(_) => ErrorCategory::Selection,
            Error::Recognition(_) => ErrorCategory::Recognition,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the caller.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => true,
            Error::Corpus(_) => true,
            // A different component range or more data may help.
            Error::NoViableModel { .. } => true,
            Error::UnknownCategory(_) => false,
            Error::Recognition(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => {
                "Run 'hmm-select config validate' and check the component range in selector.json."
            }
            Error::Corpus(_) => {
                "Every observation vector must share the same dimension and every category needs at least one non-empty sequence."
            }
            Error::NoViableModel { .. } => {
                "Every candidate state count failed to train. Narrow the range or supply more sequences."
            }
            Error::UnknownCategory(_) => "The category is not present in the training corpus.",
            Error::Recognition(_) => "Check that test sequences match the training dimension.",
            Error::Io(_) => "Check that the input files exist and are readable.",
            Error::Json(_) => "Invalid JSON in input file. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfig(_) => "Invalid Selector Configuration",
            Error::Corpus(_) => "Corpus Error",
            Error::NoViableModel { .. } => "No Viable Model",
            Error::UnknownCategory(_) => "Unknown Category",
            Error::Recognition(_) => "Recognition Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
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

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., category name).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::NoViableModel { category } => {
                context.insert("category".to_string(), serde_json::json!(category));
            }
            Error::UnknownCategory(category) => {
                context.insert("category".to_string(), serde_json::json!(category));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_categories() {
        let cases: Vec<(Error, ErrorCategory, u32)> = vec![
            (Error::Config("x".into()), ErrorCategory::Config, 10),
            (Error::InvalidConfig("x".into()), ErrorCategory::Config, 11),
            (
                Error::Corpus(CorpusError::EmptyCorpus),
                ErrorCategory::Corpus,
                20,
            ),
            (
                Error::NoViableModel {
                    category: "CAT".into(),
                },
                ErrorCategory::Selection,
                30,
            ),
            (
                Error::UnknownCategory("CAT".into()),
                ErrorCategory::Selection,
                31,
            ),
            (Error::Recognition("x".into()), ErrorCategory::Recognition, 40),
        ];
        for (err, category, code) in cases {
            assert_eq!(err.category(), category, "{err}");
            assert_eq!(err.code(), code, "{err}");
        }
    }

    #[test]
    fn structured_error_carries_category_context() {
        let err = Error::NoViableModel {
            category: "BOOK".into(),
        };
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 30);
        assert!(structured.recoverable);
        assert_eq!(structured.context["category"], "BOOK");

        let json = structured.to_json();
        assert!(json.contains(r#""category":"selection""#));
    }

    #[test]
    fn headline_and_remediation_nonempty() {
        let err = Error::UnknownCategory("X".into());
        assert!(!err.headline().is_empty());
        assert!(!err.remediation().is_empty());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert_eq!(err.category(), ErrorCategory::Io);
        assert_eq!(err.code(), 60);
    }
}
