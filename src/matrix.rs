use crate::error::PipelineError;
use crate::shingle::ShingleSet;
use crate::vocab::Vocabulary;
use bitvec::prelude::*;
use rayon::prelude::*;
use std::collections::TryReserveError;

/// Presence bits of one record over the vocabulary.
pub type Column = BitVec<u64, Lsb0>;

/// Shingles × records presence matrix.
///
/// Stored column-major: each record owns one bit column, which lets the
/// columns be filled in parallel without sharing any words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacteristicMatrix {
    rows: usize,
    columns: Vec<Column>,
}

impl CharacteristicMatrix {
    /// Sets bit `(i, j)` for every vocabulary shingle `i` found in record `j`.
    /// Shingles outside the vocabulary are skipped.
    pub fn build<'a>(
        vocab: &Vocabulary<'a>,
        sets: &[ShingleSet<'a>],
    ) -> Result<Self, PipelineError> {
        let rows = vocab.len();
        let cols = sets.len();
        let columns = sets
            .par_iter()
            .map(|set| -> Result<Column, PipelineError> {
                let mut column = zeroed_column(rows).map_err(|_| PipelineError::Allocation {
                    what: "characteristic matrix",
                    rows,
                    cols,
                })?;
                for shingle in set {
                    if let Some(row) = vocab.get(shingle) {
                        column.set(row, true);
                    }
                }
                Ok(column)
            })
            .collect::<Result<Vec<Column>, PipelineError>>()?;
        Ok(CharacteristicMatrix { rows, columns })
    }

    #[cfg(test)]
    pub(crate) fn from_columns(rows: usize, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|column| column.len() == rows));
        CharacteristicMatrix { rows, columns }
    }

    /// Vocabulary size.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Record count.
    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> impl IndexedParallelIterator<Item = &BitSlice<u64, Lsb0>> {
        self.columns.par_iter().map(|column| column.as_bitslice())
    }

    /// Number of set bits, i.e. (shingle, record) incidences.
    pub fn count_ones(&self) -> usize {
        self.columns.iter().map(|column| column.count_ones()).sum()
    }
}

fn zeroed_column(rows: usize) -> Result<Column, TryReserveError> {
    let words = rows.div_ceil(u64::BITS as usize);
    let mut raw: Vec<u64> = Vec::new();
    raw.try_reserve_exact(words)?;
    raw.resize(words, 0);
    let mut column = Column::from_vec(raw);
    column.truncate(rows);
    Ok(column)
}
