//! Observation sequences, their concatenated form, and the corpus types.
//!
//! A *sequence* is an ordered list of D-dimensional observation vectors.
//! Trainers and models never see individual sequences: they consume a
//! [`ConcatenatedSequences`], a row-major `rows × D` matrix plus the length
//! of every original sequence, so segment boundaries survive flattening.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One observation sequence: `len` rows of D features each.
pub type Sequence = Vec<Vec<f64>>;

/// All training sequences of one category, in their original order.
pub type SequenceSet = Vec<Sequence>;

/// Shape errors raised while building sequences, corpora, and test sets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorpusError {
    #[error("corpus has no categories")]
    EmptyCorpus,

    #[error("category '{category}' has no sequences")]
    EmptyCategory { category: String },

    #[error("sequence {index} of '{owner}' has no observations")]
    EmptySequence { owner: String, index: usize },

    #[error("observation dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("observation vectors must have at least one feature")]
    ZeroDimension,

    #[error("no sequences to concatenate")]
    NoSequences,

    #[error("sequence lengths sum to {total} but data holds {rows} rows")]
    LengthMismatch { rows: usize, total: usize },

    #[error("data length {len} is not a multiple of dimension {dim}")]
    RaggedData { len: usize, dim: usize },

    #[error("sequence index {index} out of range for {count} sequences")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Flattened observation rows with per-sequence lengths.
///
/// Invariants (checked on construction): `dim > 0`, `data.len() == rows *
/// dim`, `lengths` non-empty with no zero entries, and `lengths` sums to
/// `rows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConcatenated")]
pub struct ConcatenatedSequences {
    data: Vec<f64>,
    dim: usize,
    lengths: Vec<usize>,
}

#[derive(Deserialize)]
struct RawConcatenated {
    data: Vec<f64>,
    dim: usize,
    lengths: Vec<usize>,
}

impl TryFrom<RawConcatenated> for ConcatenatedSequences {
    type Error = CorpusError;

    fn try_from(raw: RawConcatenated) -> Result<Self, Self::Error> {
        ConcatenatedSequences::new(raw.data, raw.dim, raw.lengths)
    }
}

impl ConcatenatedSequences {
    /// Build from an already-flattened matrix.
    pub fn new(data: Vec<f64>, dim: usize, lengths: Vec<usize>) -> Result<Self, CorpusError> {
        if dim == 0 {
            return Err(CorpusError::ZeroDimension);
        }
        if data.len() % dim != 0 {
            return Err(CorpusError::RaggedData {
                len: data.len(),
                dim,
            });
        }
        if lengths.is_empty() {
            return Err(CorpusError::NoSequences);
        }
        if let Some(index) = lengths.iter().position(|&l| l == 0) {
            return Err(CorpusError::EmptySequence {
                owner: "concatenated".to_string(),
                index,
            });
        }
        let rows = data.len() / dim;
        let total: usize = lengths.iter().sum();
        if total != rows {
            return Err(CorpusError::LengthMismatch { rows, total });
        }
        Ok(Self { data, dim, lengths })
    }

    /// Flatten a list of sequences, preserving their order.
    pub fn from_sequences<'a, I>(sequences: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = &'a Sequence>,
    {
        let mut data = Vec::new();
        let mut lengths = Vec::new();
        let mut dim: Option<usize> = None;

        for (index, seq) in sequences.into_iter().enumerate() {
            if seq.is_empty() {
                return Err(CorpusError::EmptySequence {
                    owner: "concatenated".to_string(),
                    index,
                });
            }
            for obs in seq {
                let expected = *dim.get_or_insert(obs.len());
                if obs.len() != expected {
                    return Err(CorpusError::DimensionMismatch {
                        expected,
                        got: obs.len(),
                    });
                }
                data.extend_from_slice(obs);
            }
            lengths.push(seq.len());
        }

        let dim = dim.ok_or(CorpusError::NoSequences)?;
        Self::new(data, dim, lengths)
    }

    /// Concatenated form of a single sequence.
    pub fn from_sequence(sequence: &Sequence) -> Result<Self, CorpusError> {
        Self::from_sequences(std::iter::once(sequence))
    }

    /// Row-major observation data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Observation dimension D.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Per-sequence lengths in original order.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Total number of observation rows across all sequences.
    pub fn n_rows(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Number of sequences.
    pub fn n_sequences(&self) -> usize {
        self.lengths.len()
    }

    /// Iterate over the flattened data of each original sequence.
    pub fn segments(&self) -> impl Iterator<Item = &[f64]> + '_ {
        let dim = self.dim;
        let mut offset = 0;
        self.lengths.iter().map(move |&len| {
            let start = offset;
            offset += len * dim;
            &self.data[start..offset]
        })
    }
}

/// One category's training material in both representations.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryData {
    /// Sequences in their original order.
    pub sequences: SequenceSet,
    /// The same sequences, flattened.
    pub concatenated: ConcatenatedSequences,
}

impl CategoryData {
    fn build(category: &str, sequences: SequenceSet) -> Result<Self, CorpusError> {
        if sequences.is_empty() {
            return Err(CorpusError::EmptyCategory {
                category: category.to_string(),
            });
        }
        if let Some(index) = sequences.iter().position(|s| s.is_empty()) {
            return Err(CorpusError::EmptySequence {
                owner: category.to_string(),
                index,
            });
        }
        let concatenated = ConcatenatedSequences::from_sequences(&sequences)?;
        Ok(Self {
            sequences,
            concatenated,
        })
    }

    /// Number of training sequences.
    pub fn n_sequences(&self) -> usize {
        self.sequences.len()
    }
}

/// Training corpus: every category with its sequences.
///
/// Iteration is in category-name order, which fixes the tie-breaking order
/// used by selection and recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, SequenceSet>",
    into = "BTreeMap<String, SequenceSet>"
)]
pub struct Corpus {
    categories: BTreeMap<String, CategoryData>,
    dim: usize,
}

impl TryFrom<BTreeMap<String, SequenceSet>> for Corpus {
    type Error = CorpusError;

    fn try_from(raw: BTreeMap<String, SequenceSet>) -> Result<Self, Self::Error> {
        Corpus::from_sequences(raw)
    }
}

impl From<Corpus> for BTreeMap<String, SequenceSet> {
    fn from(corpus: Corpus) -> Self {
        corpus
            .categories
            .into_iter()
            .map(|(name, data)| (name, data.sequences))
            .collect()
    }
}

impl Corpus {
    /// Build a corpus, validating that every observation shares one dimension.
    pub fn from_sequences(raw: BTreeMap<String, SequenceSet>) -> Result<Self, CorpusError> {
        if raw.is_empty() {
            return Err(CorpusError::EmptyCorpus);
        }

        let mut categories = BTreeMap::new();
        let mut dim: Option<usize> = None;
        for (name, sequences) in raw {
            let data = CategoryData::build(&name, sequences)?;
            let expected = *dim.get_or_insert(data.concatenated.dim());
            if data.concatenated.dim() != expected {
                return Err(CorpusError::DimensionMismatch {
                    expected,
                    got: data.concatenated.dim(),
                });
            }
            categories.insert(name, data);
        }

        let dim = dim.ok_or(CorpusError::EmptyCorpus)?;
        Ok(Self { categories, dim })
    }

    /// Look up one category.
    pub fn get(&self, category: &str) -> Option<&CategoryData> {
        self.categories.get(category)
    }

    /// Category names in iteration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.categories.keys().map(String::as_str)
    }

    /// Iterate over `(name, data)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryData)> + '_ {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the corpus has no categories (never true for a built corpus).
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Shared observation dimension D.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Unlabeled test items, one sequence each, consumed in id order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<usize, Sequence>")]
pub struct TestSet {
    items: BTreeMap<usize, ConcatenatedSequences>,
}

impl TryFrom<BTreeMap<usize, Sequence>> for TestSet {
    type Error = CorpusError;

    fn try_from(raw: BTreeMap<usize, Sequence>) -> Result<Self, Self::Error> {
        TestSet::from_sequences(raw)
    }
}

impl TestSet {
    /// Build from raw sequences keyed by item id.
    pub fn from_sequences(raw: BTreeMap<usize, Sequence>) -> Result<Self, CorpusError> {
        let mut items = BTreeMap::new();
        for (id, seq) in raw {
            if seq.is_empty() {
                return Err(CorpusError::EmptySequence {
                    owner: format!("test item {id}"),
                    index: 0,
                });
            }
            items.insert(id, ConcatenatedSequences::from_sequence(&seq)?);
        }
        Ok(Self { items })
    }

    /// Build from items that are already concatenated.
    pub fn from_concatenated(items: BTreeMap<usize, ConcatenatedSequences>) -> Self {
        Self { items }
    }

    /// Iterate `(id, item)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ConcatenatedSequences)> + '_ {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    /// Number of test items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no test items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(rows: &[[f64; 2]]) -> Sequence {
        rows.iter().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn concatenate_preserves_order_and_lengths() {
        let a = seq(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = seq(&[[5.0, 6.0]]);
        let cat = ConcatenatedSequences::from_sequences([&a, &b]).unwrap();
        assert_eq!(cat.dim(), 2);
        assert_eq!(cat.lengths(), &[2, 1]);
        assert_eq!(cat.n_rows(), 3);
        assert_eq!(cat.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(cat.segments().nth(1), Some(&[5.0, 6.0][..]));
    }

    #[test]
    fn segments_split_on_lengths() {
        let a = seq(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = seq(&[[5.0, 6.0]]);
        let cat = ConcatenatedSequences::from_sequences([&a, &b]).unwrap();
        let segments: Vec<&[f64]> = cat.segments().collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(segments[1], &[5.0, 6.0]);
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let err = ConcatenatedSequences::new(vec![0.0; 6], 2, vec![2, 2]).unwrap_err();
        assert_eq!(err, CorpusError::LengthMismatch { rows: 3, total: 4 });
    }

    #[test]
    fn new_rejects_ragged_and_zero_dim() {
        assert_eq!(
            ConcatenatedSequences::new(vec![0.0; 5], 2, vec![2]).unwrap_err(),
            CorpusError::RaggedData { len: 5, dim: 2 }
        );
        assert_eq!(
            ConcatenatedSequences::new(vec![], 0, vec![1]).unwrap_err(),
            CorpusError::ZeroDimension
        );
    }

    #[test]
    fn from_sequences_rejects_mixed_dimensions() {
        let a = vec![vec![1.0, 2.0], vec![1.0]];
        let err = ConcatenatedSequences::from_sequences([&a]).unwrap_err();
        assert_eq!(err, CorpusError::DimensionMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn from_sequences_empty_input() {
        let none: Vec<Sequence> = Vec::new();
        assert_eq!(
            ConcatenatedSequences::from_sequences(&none).unwrap_err(),
            CorpusError::NoSequences
        );
    }

    #[test]
    fn corpus_validates_shared_dimension() {
        let mut raw = BTreeMap::new();
        raw.insert("CAT".to_string(), vec![seq(&[[1.0, 2.0]])]);
        raw.insert("DOG".to_string(), vec![vec![vec![1.0, 2.0, 3.0]]]);
        let err = Corpus::from_sequences(raw).unwrap_err();
        assert!(matches!(err, CorpusError::DimensionMismatch { .. }));
    }

    #[test]
    fn corpus_rejects_empty_category() {
        let mut raw = BTreeMap::new();
        raw.insert("CAT".to_string(), Vec::new());
        let err = Corpus::from_sequences(raw).unwrap_err();
        assert_eq!(
            err,
            CorpusError::EmptyCategory {
                category: "CAT".into()
            }
        );
        assert_eq!(
            Corpus::from_sequences(BTreeMap::new()).unwrap_err(),
            CorpusError::EmptyCorpus
        );
    }

    #[test]
    fn corpus_iterates_in_name_order() {
        let mut raw = BTreeMap::new();
        raw.insert("ZEBRA".to_string(), vec![seq(&[[0.0, 0.0]])]);
        raw.insert("APPLE".to_string(), vec![seq(&[[1.0, 1.0]])]);
        let corpus = Corpus::from_sequences(raw).unwrap();
        let names: Vec<&str> = corpus.categories().collect();
        assert_eq!(names, vec!["APPLE", "ZEBRA"]);
        assert_eq!(corpus.dim(), 2);
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn corpus_json_roundtrip() {
        let json = r#"{"CAT": [[[1.0, 2.0], [3.0, 4.0]], [[5.0, 6.0]]]}"#;
        let corpus: Corpus = serde_json::from_str(json).unwrap();
        let cat = corpus.get("CAT").unwrap();
        assert_eq!(cat.n_sequences(), 2);
        assert_eq!(cat.concatenated.lengths(), &[2, 1]);

        let back = serde_json::to_string(&corpus).unwrap();
        let again: Corpus = serde_json::from_str(&back).unwrap();
        assert_eq!(corpus, again);
    }

    #[test]
    fn corpus_json_rejects_bad_shape() {
        let json = r#"{"CAT": [[[1.0, 2.0], [3.0]]]}"#;
        assert!(serde_json::from_str::<Corpus>(json).is_err());
    }

    #[test]
    fn test_set_orders_by_id() {
        let json = r#"{"10": [[1.0]], "2": [[2.0], [3.0]]}"#;
        let test_set: TestSet = serde_json::from_str(json).unwrap();
        let rows: Vec<(usize, usize)> = test_set
            .iter()
            .map(|(id, item)| (id, item.n_rows()))
            .collect();
        assert_eq!(rows, vec![(2, 2), (10, 1)]);
        assert_eq!(test_set.len(), 2);
    }

    #[test]
    fn concatenated_json_validates() {
        let ok = r#"{"data": [1.0, 2.0, 3.0, 4.0], "dim": 2, "lengths": [2]}"#;
        assert!(serde_json::from_str::<ConcatenatedSequences>(ok).is_ok());
        let bad = r#"{"data": [1.0, 2.0, 3.0, 4.0], "dim": 2, "lengths": [3]}"#;
        assert!(serde_json::from_str::<ConcatenatedSequences>(bad).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn sequences(dim: usize) -> impl Strategy<Value = Vec<Sequence>> {
            prop::collection::vec(
                prop::collection::vec(prop::collection::vec(-1e3f64..1e3, dim), 1..8),
                1..6,
            )
        }

        proptest! {
            #[test]
            fn segments_round_trip_sequences(set in (1usize..4).prop_flat_map(sequences)) {
                let cat = ConcatenatedSequences::from_sequences(&set).unwrap();
                prop_assert_eq!(cat.n_sequences(), set.len());
                prop_assert_eq!(cat.lengths().iter().sum::<usize>(), cat.n_rows());

                for (segment, sequence) in cat.segments().zip(&set) {
                    let flat: Vec<f64> = sequence.iter().flatten().copied().collect();
                    prop_assert_eq!(segment, flat.as_slice());
                }
            }
        }
    }
}
