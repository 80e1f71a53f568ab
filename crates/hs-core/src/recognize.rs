//! Maximum-likelihood recognition of test items against selected models.

use hs_common::{ConcatenatedSequences, TestSet};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::hmm::SequenceModel;
use crate::logging::event_names;
use crate::selection::CategoryModelMap;

/// Scores and guess for one test item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub id: usize,
    /// Log-likelihood under every category model that could score the item.
    pub scores: BTreeMap<String, f64>,
    /// Highest-scoring category; `None` when no model scored the item.
    pub guess: Option<String>,
}

/// Recognition output, one entry per test item in ascending id order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    pub ids: Vec<usize>,
    pub probabilities: Vec<BTreeMap<String, f64>>,
    pub guesses: Vec<Option<String>>,
}

impl Recognition {
    /// Items no model could score.
    pub fn unresolved(&self) -> usize {
        self.guesses.iter().filter(|g| g.is_none()).count()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ScoreRecord> for Recognition {
    fn from_iter<I: IntoIterator<Item = ScoreRecord>>(records: I) -> Self {
        let mut out = Recognition {
            ids: Vec::new(),
            probabilities: Vec::new(),
            guesses: Vec::new(),
        };
        for record in records {
            out.ids.push(record.id);
            out.probabilities.push(record.scores);
            out.guesses.push(record.guess);
        }
        out
    }
}

/// Score one item against every model.
///
/// Ties keep the first category in name order.
pub fn score_item<M: SequenceModel>(
    models: &CategoryModelMap<M>,
    id: usize,
    item: &ConcatenatedSequences,
) -> ScoreRecord {
    let mut scores = BTreeMap::new();
    let mut best: Option<(&str, f64)> = None;

    for (category, model) in models {
        match model.score(item) {
            Ok(score) => {
                scores.insert(category.clone(), score);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((category.as_str(), score));
                }
            }
            Err(err) => {
                tracing::debug!(
                    target: event_names::RECOGNIZE_SCORE_FAILED,
                    item = id,
                    category = category.as_str(),
                    error = %err,
                    "model could not score item"
                );
            }
        }
    }

    ScoreRecord {
        id,
        scores,
        guess: best.map(|(category, _)| category.to_string()),
    }
}

/// Score every test item against every category model, in parallel.
pub fn recognize<M: SequenceModel>(models: &CategoryModelMap<M>, test_set: &TestSet) -> Recognition {
    tracing::info!(
        target: event_names::RECOGNIZE_STARTED,
        items = test_set.len(),
        models = models.len(),
        "recognizing test items"
    );

    let span = tracing::Span::current();
    let items: Vec<(usize, &ConcatenatedSequences)> = test_set.iter().collect();
    let recognition: Recognition = items
        .par_iter()
        .map(|(id, item)| {
            let _entered = span.enter();
            score_item(models, *id, item)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    tracing::info!(
        target: event_names::RECOGNIZE_FINISHED,
        items = recognition.len(),
        unresolved = recognition.unresolved(),
        "recognition finished"
    );
    recognition
}
