//! Fixed state count.

use super::{CandidateScore, CategorySelector, Selection, SelectionError};
use crate::hmm::ModelTrainer;

pub(crate) fn select_constant<T: ModelTrainer>(
    sel: &CategorySelector<'_, T>,
) -> Result<Selection<T::Model>, SelectionError> {
    let n_states = sel.config.n_constant;
    let model = sel
        .base_model(n_states)
        .ok_or_else(|| sel.no_viable_model(vec![n_states]))?;

    let score = sel.score_own(&model);
    let candidate = CandidateScore { n_states, score };
    sel.log_candidate(candidate);
    Ok(sel.selection(n_states, score, vec![candidate], model))
}
