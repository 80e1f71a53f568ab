//! Reading corpus and test-set documents.

use hs_common::{Corpus, Result, TestSet};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::logging::event_names;

/// Read a training corpus: `{ "CATEGORY": [[[f64; D]; len]; n] }`.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let corpus: Corpus = read_json(path)?;
    tracing::info!(
        target: event_names::INPUT_LOADED,
        path = %path.display(),
        categories = corpus.len(),
        dim = corpus.dim(),
        "loaded corpus"
    );
    Ok(corpus)
}

/// Read a test set: `{ "<item id>": [[f64; D]; len] }`.
pub fn load_test_set(path: &Path) -> Result<TestSet> {
    let test_set: TestSet = read_json(path)?;
    tracing::info!(
        target: event_names::INPUT_LOADED,
        path = %path.display(),
        items = test_set.len(),
        "loaded test set"
    );
    Ok(test_set)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
