//! Fuzz target for cross-validation fold construction.

#![no_main]

use arbitrary::Arbitrary;
use hs_core::selection::build_folds;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    n_items: u8,
    n_folds: u8,
    seed: u64,
}

fuzz_target!(|input: Input| {
    let n_items = input.n_items as usize;
    let Ok(folds) = build_folds(n_items, input.n_folds as usize, input.seed) else {
        return;
    };
    let mut seen = vec![false; n_items];
    for fold in &folds {
        for &i in &fold.validation {
            assert!(!seen[i], "index {} validated twice", i);
            seen[i] = true;
        }
    }
    assert!(seen.into_iter().all(|s| s));
});
