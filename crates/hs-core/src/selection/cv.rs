//! Cross-validation: highest mean held-out log-likelihood wins.
//!
//! Sequences of one category are split into `min(3, n)` folds. A category
//! with a single sequence cannot be split, so each candidate is scored on
//! its own training data instead. The winning K is retrained on every
//! sequence of the category.

use hs_common::ConcatenatedSequences;

use super::folds::{build_folds, combine_sequences};
use super::{keep_best, Best, CandidateScore, CategorySelector, Selection, SelectionError};
use crate::hmm::ModelTrainer;

const MAX_FOLDS: usize = 3;

pub(crate) fn select_cv<T: ModelTrainer>(
    sel: &CategorySelector<'_, T>,
) -> Result<Selection<T::Model>, SelectionError> {
    let n_sequences = sel.data.n_sequences();
    let n_folds = n_sequences.min(MAX_FOLDS);
    if n_folds < 2 {
        return select_on_training_data(sel);
    }

    let splits = match fold_data(sel, n_folds) {
        Ok(splits) => splits,
        Err(message) => {
            tracing::warn!(
                category = sel.category,
                error = %message,
                "could not build folds"
            );
            return Err(sel.no_viable_model(sel.config.candidates().collect()));
        }
    };

    let mut best: Option<Best<()>> = None;
    let mut candidates = Vec::new();
    for n_states in sel.config.candidates() {
        let fold_scores: Vec<f64> = splits
            .iter()
            .filter_map(|(train, validation)| {
                let model = sel.train_on(train, n_states)?;
                sel.score(&model, validation, sel.category)
            })
            .collect();

        // Zero successful folds leaves the candidate at -inf: it cannot win.
        let mean = if fold_scores.is_empty() {
            f64::NEG_INFINITY
        } else {
            fold_scores.iter().sum::<f64>() / fold_scores.len() as f64
        };

        let candidate = CandidateScore {
            n_states,
            score: (!fold_scores.is_empty()).then_some(mean),
        };
        sel.log_candidate(candidate);
        candidates.push(candidate);

        if !fold_scores.is_empty() {
            keep_best(&mut best, n_states, mean, (), |new, old| new > old);
        }
    }

    let Some(best) = best else {
        return Err(sel.no_viable_model(sel.config.candidates().collect()));
    };

    let model = sel
        .base_model(best.n_states)
        .ok_or_else(|| sel.no_viable_model(vec![best.n_states]))?;
    Ok(sel.selection(best.n_states, Some(best.score), candidates, model))
}

/// Degenerate path: train on all data and score on the same data.
fn select_on_training_data<T: ModelTrainer>(
    sel: &CategorySelector<'_, T>,
) -> Result<Selection<T::Model>, SelectionError> {
    tracing::debug!(
        category = sel.category,
        sequences = sel.data.n_sequences(),
        "too few sequences to split; scoring on training data"
    );

    let mut best: Option<Best<T::Model>> = None;
    let mut candidates = Vec::new();
    for n_states in sel.config.candidates() {
        let scored = sel
            .base_model(n_states)
            .and_then(|model| sel.score_own(&model).map(|score| (model, score)));

        let candidate = CandidateScore {
            n_states,
            score: scored.as_ref().map(|(_, score)| *score),
        };
        sel.log_candidate(candidate);
        candidates.push(candidate);

        if let Some((model, score)) = scored {
            keep_best(&mut best, n_states, score, model, |new, old| new > old);
        }
    }

    match best {
        Some(best) => Ok(sel.selection(best.n_states, Some(best.score), candidates, best.model)),
        None => Err(sel.no_viable_model(sel.config.candidates().collect())),
    }
}

/// `(train, validation)` concatenations for every fold.
fn fold_data<T: ModelTrainer>(
    sel: &CategorySelector<'_, T>,
    n_folds: usize,
) -> Result<Vec<(ConcatenatedSequences, ConcatenatedSequences)>, String> {
    let folds = build_folds(sel.data.n_sequences(), n_folds, sel.config.random_state)
        .map_err(|e| e.to_string())?;
    folds
        .iter()
        .map(|fold| {
            let train = combine_sequences(&fold.train, &sel.data.sequences)
                .map_err(|e| e.to_string())?;
            let validation = combine_sequences(&fold.validation, &sel.data.sequences)
                .map_err(|e| e.to_string())?;
            Ok((train, validation))
        })
        .collect()
}
