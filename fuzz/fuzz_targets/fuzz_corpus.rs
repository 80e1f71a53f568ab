//! Fuzz target for corpus and test-set JSON parsing.
//!
//! Arbitrary input must either deserialize into a consistent corpus or be
//! rejected with an error, never panic.

#![no_main]

use hs_common::{Corpus, TestSet};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(corpus) = serde_json::from_slice::<Corpus>(data) {
        let dim = corpus.dim();
        for (_, category) in corpus.iter() {
            assert_eq!(category.concatenated.dim(), dim);
            assert_eq!(
                category.concatenated.lengths().iter().sum::<usize>(),
                category.concatenated.n_rows()
            );
        }
    }
    let _ = serde_json::from_slice::<TestSet>(data);
});
