use crate::error::PipelineError;
use crate::shingle::{Shingle, ShingleSet};
use rustc_hash::FxHashMap;

/// Frozen mapping from frequent shingles to dense row indices.
///
/// Indices follow ascending shingle order and cover `0..len()` without gaps.
#[derive(Clone, Debug)]
pub struct Vocabulary<'a> {
    /// Shingle lookup used while filling the characteristic matrix
    index: FxHashMap<Shingle<'a>, usize>,
}

impl<'a> Vocabulary<'a> {
    /// Builds the vocabulary from per-record shingle sets.
    ///
    /// ## Arguments
    ///
    /// * `sets` - One deduplicated shingle set per record.
    /// * `min_support` - Minimum number of records (inclusive) a shingle must
    /// occur in to be kept.
    ///
    /// Fails with [`PipelineError::EmptyVocabulary`] when nothing survives.
    pub fn build(sets: &[ShingleSet<'a>], min_support: usize) -> Result<Self, PipelineError> {
        let frequencies = document_frequencies(sets);
        let distinct_shingles = frequencies.len();
        let mut shingles: Vec<Shingle<'a>> = frequencies
            .into_iter()
            .filter(|&(_, count)| count >= min_support)
            .map(|(shingle, _)| shingle)
            .collect();
        if shingles.is_empty() {
            return Err(PipelineError::EmptyVocabulary {
                min_support,
                distinct_shingles,
                records: sets.len(),
            });
        }
        shingles.sort_unstable();
        let index = shingles
            .into_iter()
            .enumerate()
            .map(|(idx, shingle)| (shingle, idx))
            .collect();
        Ok(Vocabulary { index })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Row index of `shingle`, if it is frequent enough to be kept.
    #[inline]
    pub fn get(&self, shingle: &[&'a str]) -> Option<usize> {
        self.index.get(shingle).copied()
    }
}

/// Counts, for every distinct shingle, how many records contain it.
pub fn document_frequencies<'a>(sets: &[ShingleSet<'a>]) -> FxHashMap<Shingle<'a>, usize> {
    let mut frequencies: FxHashMap<Shingle<'a>, usize> = FxHashMap::default();
    for set in sets {
        for shingle in set {
            match frequencies.get_mut(shingle) {
                Some(count) => *count += 1,
                None => {
                    frequencies.insert(shingle.clone(), 1);
                }
            }
        }
    }
    frequencies
}
