//! hmm-select common types and errors.
//!
//! This crate provides foundational types shared across hs-core modules:
//! - Observation sequences and their concatenated (flattened) form
//! - The per-category training corpus and the unlabeled test set
//! - The workspace error type with stable codes

pub mod error;
pub mod sequence;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use sequence::{
    CategoryData, ConcatenatedSequences, Corpus, CorpusError, Sequence, SequenceSet, TestSet,
};
