//! Hidden Markov models: the trainer/model seams and the Gaussian HMM.

pub mod error;
pub mod gaussian;
mod kmeans;

pub use error::{ScoringError, TrainingError};
pub use gaussian::{GaussianHmm, GaussianHmmTrainer};

use hs_common::ConcatenatedSequences;

/// A fitted sequence model.
pub trait SequenceModel: Send + Sync {
    /// Total log-likelihood of every sequence in `data`, each scored
    /// independently from the start distribution.
    fn score(&self, data: &ConcatenatedSequences) -> Result<f64, ScoringError>;

    /// Number of hidden states.
    fn n_states(&self) -> usize;
}

/// Fits a fresh model to concatenated sequences.
///
/// Training is deterministic for a fixed `(data, n_states, seed)`.
pub trait ModelTrainer: Send + Sync {
    type Model: SequenceModel;

    fn train(
        &self,
        data: &ConcatenatedSequences,
        n_states: usize,
        seed: u64,
    ) -> Result<Self::Model, TrainingError>;
}
