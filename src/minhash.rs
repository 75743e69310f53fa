use crate::error::PipelineError;
use crate::matrix::CharacteristicMatrix;
use bitvec::prelude::*;
use rand::prelude::*;
use rayon::prelude::*;

/// Signature value meaning "no set row found".
///
/// Every scan starts from a synthetic all-zero row at position 0, so a record
/// whose first hit is beyond the scan budget and the synthetic row itself
/// share this value. Banding treats it as carrying no evidence.
pub const NO_MATCH: u32 = 0;

/// Linear row permutation `h(x) = (a * x + b) mod m` over the vocabulary rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowPermutation {
    a: u64,
    b: u64,
    modulus: u64,
}

impl RowPermutation {
    pub fn new(a: u64, b: u64, modulus: u64) -> Self {
        debug_assert!(modulus > 0, "row permutation over an empty vocabulary");
        RowPermutation { a, b, modulus }
    }

    /// Draws `a` from `odd_primes` and `b` from `0..modulus`. Falls back to
    /// `a = 1` when there is no odd prime to pick.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, modulus: u64, odd_primes: &[u64]) -> Self {
        let a = odd_primes.choose(rng).copied().unwrap_or(1);
        let b = rng.gen_range(0..modulus);
        RowPermutation::new(a, b, modulus)
    }

    #[inline]
    pub fn apply(&self, offset: u64) -> u64 {
        let hashed = u128::from(self.a) * u128::from(offset) + u128::from(self.b);
        (hashed % u128::from(self.modulus)) as u64
    }

    /// Real rows visited for permuted offsets `0..max_rows-1`. Offset 0 of the
    /// stacked scan is the synthetic row, so only `max_rows - 1` real rows fit.
    pub fn scan_order(&self, max_rows: usize) -> Vec<usize> {
        (0..max_rows.saturating_sub(1) as u64)
            .map(|offset| self.apply(offset) as usize)
            .collect()
    }
}

/// Odd primes strictly below `limit`.
pub fn odd_primes_below(limit: u64) -> Vec<u64> {
    if limit <= 3 {
        return Vec::new();
    }
    let limit = limit as usize;
    let mut composite = bitvec![0; limit];
    let mut primes = Vec::new();
    for n in (3..limit).step_by(2) {
        if composite[n] {
            continue;
        }
        primes.push(n as u64);
        let mut multiple = n.saturating_mul(n);
        while multiple < limit {
            composite.set(multiple, true);
            multiple += 2 * n;
        }
    }
    primes
}

/// Produces MinHash signatures from a characteristic matrix.
#[derive(Clone, Debug)]
pub struct MinHasher {
    /// One permutation per signature row
    permutations: Vec<RowPermutation>,
    vocabulary_size: usize,
    max_rows: usize,
}

impl MinHasher {
    /// Draws `num_minhashes` independent row permutations.
    ///
    /// ## Arguments
    ///
    /// * `rng` - Source for the permutation coefficients. All draws happen
    /// here, sequentially, so a seeded source gives reproducible signatures.
    /// * `num_minhashes` - Signature length.
    /// * `vocabulary_size` - Row count of the matrix that will be hashed.
    /// * `max_rows` - Scan budget per signature, synthetic row included.
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        num_minhashes: usize,
        vocabulary_size: usize,
        max_rows: usize,
    ) -> Self {
        let modulus = vocabulary_size as u64;
        let odd_primes = odd_primes_below(modulus);
        let permutations = (0..num_minhashes)
            .map(|_| RowPermutation::random(rng, modulus, &odd_primes))
            .collect();
        MinHasher {
            permutations,
            vocabulary_size,
            max_rows,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_permutations(
        permutations: Vec<RowPermutation>,
        vocabulary_size: usize,
        max_rows: usize,
    ) -> Self {
        MinHasher {
            permutations,
            vocabulary_size,
            max_rows,
        }
    }

    pub fn num_minhashes(&self) -> usize {
        self.permutations.len()
    }

    /// Computes every record's signature. Records are processed in parallel,
    /// each writing only its own column of the output.
    pub fn signatures(&self, matrix: &CharacteristicMatrix) -> Result<SignatureMatrix, PipelineError> {
        if matrix.rows() != self.vocabulary_size {
            return Err(PipelineError::config(
                "vocabulary_size",
                format!(
                    "hash functions were drawn for {} rows but the matrix has {}",
                    self.vocabulary_size,
                    matrix.rows()
                ),
            ));
        }
        let num_minhashes = self.num_minhashes();
        let records = matrix.cols();
        let allocation_error = || PipelineError::Allocation {
            what: "signature matrix",
            rows: num_minhashes,
            cols: records,
        };
        let len = num_minhashes.checked_mul(records).ok_or_else(allocation_error)?;
        let mut values: Vec<u32> = Vec::new();
        values
            .try_reserve_exact(len)
            .map_err(|_| allocation_error())?;
        values.resize(len, NO_MATCH);

        if num_minhashes > 0 {
            let scan_orders: Vec<Vec<usize>> = self
                .permutations
                .iter()
                .map(|permutation| permutation.scan_order(self.max_rows))
                .collect();
            values
                .par_chunks_mut(num_minhashes)
                .zip(matrix.columns())
                .for_each(|(signature, column)| {
                    for (slot, order) in signature.iter_mut().zip(&scan_orders) {
                        *slot = first_hit(column, order);
                    }
                });
        }

        Ok(SignatureMatrix {
            num_minhashes,
            records,
            values,
        })
    }
}

/// Position of the first set row in the synthetic-row-prefixed scan.
#[inline]
fn first_hit(column: &BitSlice<u64, Lsb0>, scan_order: &[usize]) -> u32 {
    scan_order
        .iter()
        .position(|&row| column[row])
        .map_or(NO_MATCH, |offset| u32::try_from(offset + 1).unwrap_or(u32::MAX))
}

/// `num_minhashes × records` signature values, stored one record after another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureMatrix {
    num_minhashes: usize,
    records: usize,
    values: Vec<u32>,
}

impl SignatureMatrix {
    #[cfg(test)]
    pub(crate) fn from_signatures(signatures: &[Vec<u32>]) -> Self {
        let num_minhashes = signatures.first().map_or(0, Vec::len);
        debug_assert!(signatures.iter().all(|s| s.len() == num_minhashes));
        SignatureMatrix {
            num_minhashes,
            records: signatures.len(),
            values: signatures.concat(),
        }
    }

    /// Signature length.
    pub fn rows(&self) -> usize {
        self.num_minhashes
    }

    /// Record count.
    pub fn cols(&self) -> usize {
        self.records
    }

    /// Record `col`'s full signature.
    #[inline]
    pub fn signature(&self, col: usize) -> &[u32] {
        let start = col * self.num_minhashes;
        &self.values[start..start + self.num_minhashes]
    }

    /// Rows `start..start + len` of record `col`'s signature.
    #[inline]
    pub fn band(&self, col: usize, start: usize, len: usize) -> &[u32] {
        &self.signature(col)[start..start + len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Column;

    fn column(rows: usize, set: &[usize]) -> Column {
        let mut column = bitvec![u64, Lsb0; 0; rows];
        for &row in set {
            column.set(row, true);
        }
        column
    }

    #[test]
    fn primes_are_odd_and_below_limit() {
        assert_eq!(odd_primes_below(20), vec![3, 5, 7, 11, 13, 17, 19]);
        assert_eq!(odd_primes_below(4), vec![3]);
        assert!(odd_primes_below(3).is_empty());
        assert!(odd_primes_below(0).is_empty());
        assert_eq!(odd_primes_below(10_000).len(), 1228);
    }

    #[test]
    fn scan_order_wraps_modulus() {
        let permutation = RowPermutation::new(3, 2, 7);
        assert_eq!(permutation.scan_order(5), vec![2, 5, 1, 4]);
        assert!(permutation.scan_order(1).is_empty());
        assert!(permutation.scan_order(0).is_empty());
    }

    #[test]
    fn random_coefficients_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let primes = odd_primes_below(50);
        for _ in 0..200 {
            let permutation = RowPermutation::random(&mut rng, 50, &primes);
            assert!(primes.contains(&permutation.a));
            assert!(permutation.b < 50);
            assert_eq!(permutation.modulus, 50);
        }
        let fallback = RowPermutation::random(&mut rng, 3, &odd_primes_below(3));
        assert_eq!(fallback.a, 1);
    }

    #[test]
    fn signatures_record_first_hit_after_synthetic_row() {
        let matrix = CharacteristicMatrix::from_columns(
            4,
            vec![column(4, &[2]), column(4, &[0, 3]), column(4, &[])],
        );
        let identity = RowPermutation::new(1, 0, 4);

        let full = MinHasher::from_permutations(vec![identity], 4, 5)
            .signatures(&matrix)
            .unwrap();
        assert_eq!(full.signature(0), &[3]);
        assert_eq!(full.signature(1), &[1]);
        assert_eq!(full.signature(2), &[NO_MATCH]);

        let capped = MinHasher::from_permutations(vec![identity], 4, 3)
            .signatures(&matrix)
            .unwrap();
        assert_eq!(capped.signature(0), &[NO_MATCH]);
        assert_eq!(capped.signature(1), &[1]);
    }

    #[test]
    fn identical_columns_get_identical_signatures() {
        let matrix = CharacteristicMatrix::from_columns(
            64,
            vec![column(64, &[1, 9, 40]), column(64, &[5, 6]), column(64, &[1, 9, 40])],
        );
        let mut rng = StdRng::seed_from_u64(17);
        let signatures = MinHasher::new(&mut rng, 32, 64, 100).signatures(&matrix).unwrap();
        assert_eq!(signatures.rows(), 32);
        assert_eq!(signatures.cols(), 3);
        assert_eq!(signatures.signature(0), signatures.signature(2));
    }

    #[test]
    fn seeded_hashers_agree() {
        let first = MinHasher::new(&mut StdRng::seed_from_u64(3), 16, 1000, 500);
        let second = MinHasher::new(&mut StdRng::seed_from_u64(3), 16, 1000, 500);
        assert_eq!(first.permutations, second.permutations);
    }

    #[test]
    fn mismatched_matrix_is_rejected() {
        let matrix = CharacteristicMatrix::from_columns(4, vec![column(4, &[0])]);
        let hasher = MinHasher::from_permutations(vec![RowPermutation::new(1, 0, 8)], 8, 10);
        assert!(matches!(
            hasher.signatures(&matrix),
            Err(PipelineError::Config { .. })
        ));
    }

    #[test]
    fn bands_slice_one_signature() {
        let signatures = SignatureMatrix::from_signatures(&[
            vec![1, 2, 0, 4],
            vec![1, 3, 0, 4],
        ]);
        assert_eq!(signatures.band(1, 1, 2), &[3, 0]);
        assert_eq!(signatures.band(0, 2, 2), &[0, 4]);
    }
}
