//! Training and scoring failures.
//!
//! Both are local to one candidate: selection logs them and moves on.

use thiserror::Error;

/// Why fitting a model at one state count failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainingError {
    #[error("number of hidden states must be at least 1")]
    ZeroStates,

    #[error("{rows} observation rows cannot support {n_states} hidden states")]
    InsufficientData { rows: usize, n_states: usize },

    #[error("no observations to train on")]
    EmptyInput,

    #[error("observation dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("log-likelihood became non-finite during EM")]
    NonFiniteLikelihood,

    #[error("hidden state {state} received no responsibility mass")]
    DegenerateCovariance { state: usize },
}

/// Why a fitted model could not score a sequence collection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("model expects dimension {expected}, data has {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cannot score an empty sequence")]
    EmptySequence,

    #[error("log-likelihood is not finite")]
    NonFinite,
}
