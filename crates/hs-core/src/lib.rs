//! hmm-select core library.
//!
//! Fits one Gaussian HMM per category, choosing the number of hidden states
//! with a configurable criterion, and classifies unseen sequences by
//! maximum likelihood:
//! - [`hmm`]: the trainer/model traits and the Baum-Welch Gaussian HMM
//! - [`selection`]: constant, BIC, DIC, and cross-validated model-order selection
//! - [`recognize`]: per-item scoring against every selected model
//! - [`config`], [`input`], [`logging`], [`exit_codes`]: CLI plumbing
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exit_codes;
pub mod hmm;
pub mod input;
pub mod logging;
pub mod recognize;
pub mod selection;

pub use hmm::{GaussianHmm, GaussianHmmTrainer, ModelTrainer, SequenceModel};
pub use recognize::{recognize, Recognition, ScoreRecord};
pub use selection::{
    select, select_all, CategoryModelMap, Selection, SelectionError, SelectionReport,
    SelectionStrategy,
};
