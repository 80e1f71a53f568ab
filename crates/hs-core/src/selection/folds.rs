//! Seeded K-fold splits over a category's sequence indices.

use hs_common::{ConcatenatedSequences, CorpusError, SequenceSet};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

/// One split: train on `train`, evaluate on `validation`.
///
/// Both lists are sorted ascending and together cover every index once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FoldError {
    #[error("need at least 2 folds, got {n_folds}")]
    TooFewFolds { n_folds: usize },

    #[error("cannot split {n_items} items into {n_folds} folds")]
    TooManyFolds { n_folds: usize, n_items: usize },
}

/// Shuffle `0..n_items` with `seed` and cut it into `n_folds` contiguous
/// validation chunks. The first `n_items % n_folds` chunks hold one extra
/// item.
pub fn build_folds(n_items: usize, n_folds: usize, seed: u64) -> Result<Vec<Fold>, FoldError> {
    if n_folds < 2 {
        return Err(FoldError::TooFewFolds { n_folds });
    }
    if n_folds > n_items {
        return Err(FoldError::TooManyFolds { n_folds, n_items });
    }

    let mut order: Vec<usize> = (0..n_items).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let base = n_items / n_folds;
    let extra = n_items % n_folds;

    let mut folds = Vec::with_capacity(n_folds);
    let mut start = 0;
    for f in 0..n_folds {
        let size = base + usize::from(f < extra);
        let mut validation = order[start..start + size].to_vec();
        validation.sort_unstable();
        start += size;

        let train = (0..n_items)
            .filter(|i| validation.binary_search(i).is_err())
            .collect();
        folds.push(Fold { train, validation });
    }
    Ok(folds)
}

/// Concatenate the sequences at `indices`, in the given order.
pub fn combine_sequences(
    indices: &[usize],
    set: &SequenceSet,
) -> Result<ConcatenatedSequences, CorpusError> {
    let selected = indices
        .iter()
        .map(|&index| {
            set.get(index).ok_or(CorpusError::IndexOutOfRange {
                index,
                count: set.len(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    ConcatenatedSequences::from_sequences(selected)
}
