//! Bayesian information criterion: lowest `-2·logL + p·ln N` wins.
//!
//! `p = K² + 2·K·D − 1` and `N` is the category's total observation rows.

use super::{keep_best, Best, CandidateScore, CategorySelector, Selection, SelectionError};
use crate::hmm::gaussian::bic_parameter_count;
use crate::hmm::ModelTrainer;

/// BIC of a model with `n_params` free parameters fitted to `n_rows` rows.
pub fn bic_score(log_likelihood: f64, n_params: usize, n_rows: usize) -> f64 {
    -2.0 * log_likelihood + n_params as f64 * (n_rows as f64).ln()
}

pub(crate) fn select_bic<T: ModelTrainer>(
    sel: &CategorySelector<'_, T>,
) -> Result<Selection<T::Model>, SelectionError> {
    let n_rows = sel.data.concatenated.n_rows();
    let dim = sel.corpus.dim();

    let mut best: Option<Best<T::Model>> = None;
    let mut candidates = Vec::new();
    for n_states in sel.config.candidates() {
        let scored = sel.base_model(n_states).and_then(|model| {
            let log_likelihood = sel.score_own(&model)?;
            let bic = bic_score(log_likelihood, bic_parameter_count(n_states, dim), n_rows);
            Some((model, bic))
        });

        let candidate = CandidateScore {
            n_states,
            score: scored.as_ref().map(|(_, bic)| *bic),
        };
        sel.log_candidate(candidate);
        candidates.push(candidate);

        if let Some((model, bic)) = scored {
            keep_best(&mut best, n_states, bic, model, |new, old| new < old);
        }
    }

    match best {
        Some(best) => Ok(sel.selection(best.n_states, Some(best.score), candidates, best.model)),
        None => Err(sel.no_viable_model(sel.config.candidates().collect())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bic_score_penalizes_parameters() {
        let n_rows = 100;
        let small = bic_score(-50.0, 5, n_rows);
        let large = bic_score(-50.0, 50, n_rows);
        assert!(small < large);
        assert!((small - (100.0 + 5.0 * 100f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn bic_score_rewards_likelihood() {
        assert!(bic_score(-10.0, 5, 20) < bic_score(-20.0, 5, 20));
    }
}
