//! Discriminative information criterion: how much better a model explains
//! its own category than the average competing category. Highest wins.

use hs_common::ConcatenatedSequences;

use super::{keep_best, Best, CandidateScore, CategorySelector, Selection, SelectionError};
use crate::hmm::ModelTrainer;
use crate::logging::event_names;

/// `logL(own) − Σ logL(others) / n_others`.
pub fn dic_score(own_log_likelihood: f64, others_sum: f64, n_others: usize) -> f64 {
    own_log_likelihood - others_sum / n_others as f64
}

pub(crate) fn select_dic<T: ModelTrainer>(
    sel: &CategorySelector<'_, T>,
) -> Result<Selection<T::Model>, SelectionError> {
    let others: Vec<(&str, &ConcatenatedSequences)> = sel
        .corpus
        .iter()
        .filter(|(name, _)| *name != sel.category)
        .map(|(name, data)| (name, &data.concatenated))
        .collect();

    if others.is_empty() {
        tracing::warn!(
            target: event_names::SELECT_NO_VIABLE_MODEL,
            category = sel.category,
            categories = sel.corpus.len(),
            "DIC needs at least two categories"
        );
        return Err(sel.no_viable_model(sel.config.candidates().collect()));
    }

    let mut best: Option<Best<T::Model>> = None;
    let mut candidates = Vec::new();
    for n_states in sel.config.candidates() {
        let scored = sel.base_model(n_states).and_then(|model| {
            let own = sel.score_own(&model)?;
            let mut others_sum = 0.0;
            // Any competitor the model cannot score disqualifies this K.
            for (name, data) in &others {
                others_sum += sel.score(&model, data, name)?;
            }
            Some((model, dic_score(own, others_sum, others.len())))
        });

        let candidate = CandidateScore {
            n_states,
            score: scored.as_ref().map(|(_, dic)| *dic),
        };
        sel.log_candidate(candidate);
        candidates.push(candidate);

        if let Some((model, dic)) = scored {
            keep_best(&mut best, n_states, dic, model, |new, old| new > old);
        }
    }

    match best {
        Some(best) => Ok(sel.selection(best.n_states, Some(best.score), candidates, best.model)),
        None => Err(sel.no_viable_model(sel.config.candidates().collect())),
    }
}
