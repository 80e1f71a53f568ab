//! Model-order selection.
//!
//! Every strategy answers the same question for one category: which hidden
//! state count K, within the configured range, gives the best model? The
//! strategies differ only in how a candidate is scored:
//!
//! | strategy   | score                                   | best    |
//! |------------|-----------------------------------------|---------|
//! | `constant` | none, K is fixed                        | n/a     |
//! | `bic`      | `-2·logL + p·ln N`                      | lowest  |
//! | `dic`      | `logL(own) - mean logL(other categories)` | highest |
//! | `cv`       | mean held-out logL over K folds         | highest |
//!
//! Training or scoring failures only disqualify the candidate they belong
//! to. A category ends up without a model only when no candidate survives.

mod bic;
mod constant;
mod cv;
mod dic;
pub mod folds;

pub use bic::bic_score;
pub use dic::dic_score;
pub use folds::{build_folds, combine_sequences, Fold, FoldError};

use hs_common::{CategoryData, ConcatenatedSequences, Corpus};
use hs_config::SelectorConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::hmm::{ModelTrainer, SequenceModel};
use crate::logging::event_names;

/// One model per category; categories without a viable model are absent.
pub type CategoryModelMap<M> = BTreeMap<String, M>;

/// How candidate state counts are compared.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Always use `n_constant` states.
    Constant,
    /// Bayesian information criterion.
    #[default]
    Bic,
    /// Discriminative information criterion.
    Dic,
    /// K-fold cross-validated held-out likelihood.
    Cv,
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionStrategy::Constant => write!(f, "constant"),
            SelectionStrategy::Bic => write!(f, "bic"),
            SelectionStrategy::Dic => write!(f, "dic"),
            SelectionStrategy::Cv => write!(f, "cv"),
        }
    }
}

impl std::str::FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "constant" | "fixed" => Ok(SelectionStrategy::Constant),
            "bic" => Ok(SelectionStrategy::Bic),
            "dic" => Ok(SelectionStrategy::Dic),
            "cv" | "cross-validation" => Ok(SelectionStrategy::Cv),
            _ => Err(format!("unknown selection strategy: {}", s)),
        }
    }
}

/// Outcome of one candidate state count. `score` is `None` when training or
/// scoring failed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub n_states: usize,
    pub score: Option<f64>,
}

/// The winning model of one category.
#[derive(Debug, Clone)]
pub struct Selection<M> {
    pub category: String,
    pub strategy: SelectionStrategy,
    /// Chosen number of hidden states.
    pub n_states: usize,
    /// Criterion value of the winner (own-data log-likelihood for `constant`,
    /// when it scores).
    pub score: Option<f64>,
    /// Every candidate tried, in ascending K.
    pub candidates: Vec<CandidateScore>,
    pub model: M,
}

/// Selection failures. Per-candidate errors never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("no viable model for category '{category}' (tried K = {candidates:?})")]
    NoViableModel {
        category: String,
        candidates: Vec<usize>,
    },

    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}

impl From<SelectionError> for hs_common::Error {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::NoViableModel { category, .. } => {
                hs_common::Error::NoViableModel { category }
            }
            SelectionError::UnknownCategory(name) => hs_common::Error::UnknownCategory(name),
        }
    }
}

/// Result of selecting models for a whole corpus.
#[derive(Debug, Clone)]
pub struct SelectionReport<M> {
    pub strategy: SelectionStrategy,
    pub selections: BTreeMap<String, Selection<M>>,
    pub failures: BTreeMap<String, SelectionError>,
}

impl<M> SelectionReport<M> {
    /// True when every category produced a model.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// JSON-friendly view without the models themselves.
    pub fn summary(&self) -> SelectionSummary {
        SelectionSummary {
            strategy: self.strategy,
            selected: self
                .selections
                .iter()
                .map(|(name, s)| {
                    (
                        name.clone(),
                        SelectedModel {
                            n_states: s.n_states,
                            score: s.score,
                            candidates: s.candidates.clone(),
                        },
                    )
                })
                .collect(),
            failed: self
                .failures
                .iter()
                .map(|(name, e)| (name.clone(), e.to_string()))
                .collect(),
        }
    }

    /// Drop the diagnostics and keep one model per category.
    pub fn into_models(self) -> CategoryModelMap<M> {
        self.selections
            .into_iter()
            .map(|(name, s)| (name, s.model))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionSummary {
    pub strategy: SelectionStrategy,
    pub selected: BTreeMap<String, SelectedModel>,
    pub failed: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedModel {
    pub n_states: usize,
    pub score: Option<f64>,
    pub candidates: Vec<CandidateScore>,
}

/// Select the best model for one category.
pub fn select<T: ModelTrainer>(
    strategy: SelectionStrategy,
    category: &str,
    corpus: &Corpus,
    trainer: &T,
    config: &SelectorConfig,
) -> Result<Selection<T::Model>, SelectionError> {
    let data = corpus
        .get(category)
        .ok_or_else(|| SelectionError::UnknownCategory(category.to_string()))?;

    let selector = CategorySelector {
        category,
        data,
        corpus,
        trainer,
        config,
        strategy,
    };

    tracing::debug!(
        target: event_names::SELECT_STARTED,
        category,
        strategy = %strategy,
        sequences = data.n_sequences(),
        rows = data.concatenated.n_rows(),
        "selecting model"
    );

    let result = match strategy {
        SelectionStrategy::Constant => constant::select_constant(&selector),
        SelectionStrategy::Bic => bic::select_bic(&selector),
        SelectionStrategy::Dic => dic::select_dic(&selector),
        SelectionStrategy::Cv => cv::select_cv(&selector),
    };

    if let Ok(selection) = &result {
        tracing::debug!(
            target: event_names::SELECT_FINISHED,
            category,
            strategy = %strategy,
            n_states = selection.n_states,
            score = selection.score,
            "model selected"
        );
    }
    result
}

/// Select a model for every category, one category per rayon task.
pub fn select_all<T: ModelTrainer>(
    strategy: SelectionStrategy,
    corpus: &Corpus,
    trainer: &T,
    config: &SelectorConfig,
) -> SelectionReport<T::Model> {
    let names: Vec<&str> = corpus.categories().collect();
    tracing::info!(
        target: event_names::SELECT_STARTED,
        strategy = %strategy,
        categories = names.len(),
        min_components = config.min_components,
        max_components = config.max_components,
        "selecting models"
    );

    // Workers re-enter the caller's span so run context reaches their events.
    let span = tracing::Span::current();
    let results: Vec<(&str, Result<Selection<T::Model>, SelectionError>)> = names
        .par_iter()
        .map(|name| {
            let _entered = span.enter();
            (*name, select(strategy, name, corpus, trainer, config))
        })
        .collect();

    let mut report = SelectionReport {
        strategy,
        selections: BTreeMap::new(),
        failures: BTreeMap::new(),
    };
    for (name, result) in results {
        match result {
            Ok(selection) => {
                report.selections.insert(name.to_string(), selection);
            }
            Err(err) => {
                report.failures.insert(name.to_string(), err);
            }
        }
    }

    tracing::info!(
        target: event_names::SELECT_FINISHED,
        strategy = %strategy,
        selected = report.selections.len(),
        failed = report.failures.len(),
        "model selection finished"
    );
    report
}

/// Everything a strategy needs to evaluate one category.
pub(crate) struct CategorySelector<'a, T: ModelTrainer> {
    pub category: &'a str,
    pub data: &'a CategoryData,
    pub corpus: &'a Corpus,
    pub trainer: &'a T,
    pub config: &'a SelectorConfig,
    pub strategy: SelectionStrategy,
}

impl<T: ModelTrainer> CategorySelector<'_, T> {
    /// Train on all of the category's sequences with the configured seed.
    pub fn base_model(&self, n_states: usize) -> Option<T::Model> {
        self.train_on(&self.data.concatenated, n_states)
    }

    /// Train on an arbitrary subset; failures are logged and swallowed.
    pub fn train_on(&self, data: &ConcatenatedSequences, n_states: usize) -> Option<T::Model> {
        match self.trainer.train(data, n_states, self.config.random_state) {
            Ok(model) => Some(model),
            Err(err) => {
                if self.config.verbose {
                    tracing::info!(
                        target: event_names::SELECT_TRAIN_FAILED,
                        category = self.category,
                        n_states,
                        error = %err,
                        "training failed"
                    );
                } else {
                    tracing::debug!(
                        target: event_names::SELECT_TRAIN_FAILED,
                        category = self.category,
                        n_states,
                        error = %err,
                        "training failed"
                    );
                }
                None
            }
        }
    }

    /// Score `data` with `model`; failures are logged and swallowed.
    pub fn score(
        &self,
        model: &T::Model,
        data: &ConcatenatedSequences,
        against: &str,
    ) -> Option<f64> {
        match model.score(data) {
            Ok(score) => Some(score),
            Err(err) => {
                tracing::debug!(
                    target: event_names::SELECT_SCORE_FAILED,
                    category = self.category,
                    against,
                    n_states = model.n_states(),
                    error = %err,
                    "scoring failed"
                );
                None
            }
        }
    }

    /// Own-data log-likelihood.
    pub fn score_own(&self, model: &T::Model) -> Option<f64> {
        self.score(model, &self.data.concatenated, self.category)
    }

    pub fn log_candidate(&self, candidate: CandidateScore) {
        if self.config.verbose {
            tracing::info!(
                target: event_names::SELECT_CANDIDATE,
                category = self.category,
                strategy = %self.strategy,
                n_states = candidate.n_states,
                score = candidate.score,
                "candidate evaluated"
            );
        } else {
            tracing::debug!(
                target: event_names::SELECT_CANDIDATE,
                category = self.category,
                strategy = %self.strategy,
                n_states = candidate.n_states,
                score = candidate.score,
                "candidate evaluated"
            );
        }
    }

    pub fn no_viable_model(&self, candidates: Vec<usize>) -> SelectionError {
        tracing::warn!(
            target: event_names::SELECT_NO_VIABLE_MODEL,
            category = self.category,
            strategy = %self.strategy,
            "no candidate produced a usable model"
        );
        SelectionError::NoViableModel {
            category: self.category.to_string(),
            candidates,
        }
    }

    pub fn selection(
        &self,
        n_states: usize,
        score: Option<f64>,
        candidates: Vec<CandidateScore>,
        model: T::Model,
    ) -> Selection<T::Model> {
        Selection {
            category: self.category.to_string(),
            strategy: self.strategy,
            n_states,
            score,
            candidates,
            model,
        }
    }
}

/// Running best for criteria where a strictly better score replaces the
/// incumbent, so the smallest K wins ties.
pub(crate) struct Best<M> {
    n_states: usize,
    score: f64,
    model: M,
}

pub(crate) fn keep_best<M>(
    best: &mut Option<Best<M>>,
    n_states: usize,
    score: f64,
    model: M,
    better: impl Fn(f64, f64) -> bool,
) {
    let replace = match best {
        Some(current) => better(score, current.score),
        None => true,
    };
    if replace {
        *best = Some(Best {
            n_states,
            score,
            model,
        });
    }
}
