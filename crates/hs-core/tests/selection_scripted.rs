//! Selection tests driven by a scripted trainer.
//!
//! The trainer returns a fixed log-likelihood per state count (or fails),
//! so the criterion arithmetic can be checked exactly.

use hs_common::{ConcatenatedSequences, Corpus, SequenceSet};
use hs_config::SelectorConfig;
use hs_core::hmm::{ModelTrainer, ScoringError, SequenceModel, TrainingError};
use hs_core::selection::{bic_score, dic_score, select, SelectionError, SelectionStrategy};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
struct ScriptedModel {
    n_states: usize,
    log_likelihood: f64,
    /// Collections with exactly this many rows cannot be scored.
    unscorable_rows: Option<usize>,
}

impl SequenceModel for ScriptedModel {
    fn score(&self, data: &ConcatenatedSequences) -> Result<f64, ScoringError> {
        if self.unscorable_rows == Some(data.n_rows()) {
            return Err(ScoringError::NonFinite);
        }
        // Scale by rows so held-out folds of different sizes stay comparable.
        Ok(self.log_likelihood * data.n_rows() as f64 / 100.0)
    }

    fn n_states(&self) -> usize {
        self.n_states
    }
}

/// Log-likelihood per K; K missing from the script fails to train.
struct ScriptedTrainer {
    script: BTreeMap<usize, f64>,
    calls: AtomicUsize,
    refused_rows: Option<usize>,
    unscorable: Option<(usize, usize)>,
}

impl ScriptedTrainer {
    fn new(script: &[(usize, f64)]) -> Self {
        ScriptedTrainer {
            script: script.iter().copied().collect(),
            calls: AtomicUsize::new(0),
            refused_rows: None,
            unscorable: None,
        }
    }

    /// Fail to train on any collection of exactly `rows` rows.
    fn refusing_rows(mut self, rows: usize) -> Self {
        self.refused_rows = Some(rows);
        self
    }

    /// Models with `n_states` cannot score collections of `rows` rows.
    fn unscorable_at(mut self, n_states: usize, rows: usize) -> Self {
        self.unscorable = Some((n_states, rows));
        self
    }
}

impl ModelTrainer for ScriptedTrainer {
    type Model = ScriptedModel;

    fn train(
        &self,
        data: &ConcatenatedSequences,
        n_states: usize,
        _seed: u64,
    ) -> Result<ScriptedModel, TrainingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = data.n_rows();
        match self.script.get(&n_states) {
            Some(&log_likelihood) if self.refused_rows != Some(rows) => Ok(ScriptedModel {
                n_states,
                log_likelihood,
                unscorable_rows: self
                    .unscorable
                    .filter(|(k, _)| *k == n_states)
                    .map(|(_, rows)| rows),
            }),
            _ => Err(TrainingError::InsufficientData { rows, n_states }),
        }
    }
}

/// 100 one-dimensional rows split over four sequences.
fn cat_sequences() -> SequenceSet {
    (0..4)
        .map(|s| (0..25).map(|t| vec![(s * 25 + t) as f64]).collect())
        .collect()
}

/// CAT alone.
fn corpus() -> Corpus {
    let mut raw = BTreeMap::new();
    raw.insert("CAT".to_string(), cat_sequences());
    Corpus::from_sequences(raw).unwrap()
}

/// CAT plus DOG: 60 rows over three sequences.
fn two_category_corpus() -> Corpus {
    let dog: SequenceSet = (0..3)
        .map(|s| (0..20).map(|t| vec![-((s * 20 + t) as f64)]).collect())
        .collect();
    let mut raw = BTreeMap::new();
    raw.insert("CAT".to_string(), cat_sequences());
    raw.insert("DOG".to_string(), dog);
    Corpus::from_sequences(raw).unwrap()
}

#[test]
fn bic_penalty_beats_raw_likelihood() {
    // K = 3 fits better, but its 14 parameters cost more than the 5 nats gained.
    let trainer = ScriptedTrainer::new(&[(2, -100.0), (3, -95.0)]);
    let config = SelectorConfig::default().with_range(2, 3);

    let selection = select(SelectionStrategy::Bic, "CAT", &corpus(), &trainer, &config).unwrap();
    assert_eq!(selection.n_states, 2);

    let expected = bic_score(-100.0, 7, 100);
    assert!((selection.score.unwrap() - expected).abs() < 1e-9);
    assert!(selection.score.unwrap() < bic_score(-95.0, 14, 100));
}

#[test]
fn bic_prefers_larger_model_when_gain_is_large() {
    let trainer = ScriptedTrainer::new(&[(2, -500.0), (3, -100.0)]);
    let config = SelectorConfig::default().with_range(2, 3);

    let selection = select(SelectionStrategy::Bic, "CAT", &corpus(), &trainer, &config).unwrap();
    assert_eq!(selection.n_states, 3);
}

#[test]
fn bic_with_single_viable_candidate_selects_it() {
    let trainer = ScriptedTrainer::new(&[(4, -80.0)]);
    let config = SelectorConfig::default().with_range(2, 5);

    let selection = select(SelectionStrategy::Bic, "CAT", &corpus(), &trainer, &config).unwrap();
    assert_eq!(selection.n_states, 4);

    let scored: Vec<(usize, bool)> = selection
        .candidates
        .iter()
        .map(|c| (c.n_states, c.score.is_some()))
        .collect();
    assert_eq!(scored, vec![(2, false), (3, false), (4, true), (5, false)]);
}

#[test]
fn every_strategy_fails_cleanly_when_nothing_trains() {
    let trainer = ScriptedTrainer::new(&[]);
    let config = SelectorConfig::default().with_range(2, 3).with_constant(2);

    for strategy in [
        SelectionStrategy::Constant,
        SelectionStrategy::Bic,
        SelectionStrategy::Cv,
    ] {
        let err = select(strategy, "CAT", &corpus(), &trainer, &config).unwrap_err();
        assert!(
            matches!(err, SelectionError::NoViableModel { ref category, .. } if category == "CAT"),
            "{strategy}: {err}"
        );
    }
}

#[test]
fn cv_retrains_winner_on_all_data() {
    let trainer = ScriptedTrainer::new(&[(2, -90.0), (3, -60.0)]);
    let config = SelectorConfig::default().with_range(2, 3);

    let selection = select(SelectionStrategy::Cv, "CAT", &corpus(), &trainer, &config).unwrap();
    assert_eq!(selection.n_states, 3);

    // Three folds per candidate, then one retrain of the winner.
    assert_eq!(trainer.calls.load(Ordering::SeqCst), 2 * 3 + 1);
}

#[test]
fn cv_averages_only_the_folds_that_trained() {
    // Four sequences of 25 rows in three folds: validation sizes 2, 1 and 1
    // sequences, so the first fold trains on 50 rows and the others on 75.
    let trainer = ScriptedTrainer::new(&[(2, -12.0)]).refusing_rows(50);
    let config = SelectorConfig::default().with_range(2, 2);

    let selection = select(SelectionStrategy::Cv, "CAT", &corpus(), &trainer, &config).unwrap();
    assert_eq!(selection.n_states, 2);

    // Each surviving fold scores 25 held-out rows: -12 * 25 / 100 = -3.
    // Counting the failed fold as zero or -inf would move the mean.
    assert_eq!(selection.score, Some(-3.0));
    assert_eq!(selection.candidates[0].score, Some(-3.0));
    assert_eq!(trainer.calls.load(Ordering::SeqCst), 3 + 1);
}

#[test]
fn cv_candidate_with_no_surviving_fold_cannot_win() {
    // K = 3 never trains. K = 2 survives only the fold that trains on 50
    // rows and validates on the other 50.
    let trainer = ScriptedTrainer::new(&[(2, -90.0)]).refusing_rows(75);
    let config = SelectorConfig::default().with_range(2, 3);

    let selection = select(SelectionStrategy::Cv, "CAT", &corpus(), &trainer, &config).unwrap();
    assert_eq!(selection.n_states, 2);
    assert_eq!(selection.score, Some(-45.0));
    assert_eq!(selection.candidates[1].n_states, 3);
    assert_eq!(selection.candidates[1].score, None);
}

#[test]
fn dic_picks_the_most_discriminative_state_count() {
    // Own data has 100 rows and DOG 60, so DIC = logL - 0.6 * logL.
    let trainer = ScriptedTrainer::new(&[(2, -100.0), (3, -50.0)]);
    let config = SelectorConfig::default().with_range(2, 3);

    let selection = select(
        SelectionStrategy::Dic,
        "CAT",
        &two_category_corpus(),
        &trainer,
        &config,
    )
    .unwrap();
    assert_eq!(selection.n_states, 3);
    assert_eq!(selection.score, Some(dic_score(-50.0, -30.0, 1)));
    assert_eq!(selection.candidates[0].score, Some(dic_score(-100.0, -60.0, 1)));
}

#[test]
fn dic_skips_state_count_that_cannot_score_a_competitor() {
    // K = 2 would win, but its model cannot score DOG's 60 rows.
    let trainer = ScriptedTrainer::new(&[(2, -10.0), (3, -100.0)]).unscorable_at(2, 60);
    let config = SelectorConfig::default().with_range(2, 3);

    let selection = select(
        SelectionStrategy::Dic,
        "CAT",
        &two_category_corpus(),
        &trainer,
        &config,
    )
    .unwrap();
    assert_eq!(selection.n_states, 3);
    assert_eq!(selection.candidates[0].n_states, 2);
    assert_eq!(selection.candidates[0].score, None);
    assert_eq!(selection.score, Some(dic_score(-100.0, -60.0, 1)));
}

#[test]
fn constant_ignores_the_search_range() {
    let trainer = ScriptedTrainer::new(&[(7, -10.0)]);
    let config = SelectorConfig::default().with_range(2, 3).with_constant(7);

    let selection =
        select(SelectionStrategy::Constant, "CAT", &corpus(), &trainer, &config).unwrap();
    assert_eq!(selection.n_states, 7);
    assert_eq!(selection.score, Some(-10.0));
}

#[test]
fn unknown_category_is_reported() {
    let trainer = ScriptedTrainer::new(&[(2, -1.0)]);
    let err = select(
        SelectionStrategy::Bic,
        "DOG",
        &corpus(),
        &trainer,
        &SelectorConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err, SelectionError::UnknownCategory("DOG".to_string()));
}
