use crate::error::PipelineError;
use crate::minhash::{SignatureMatrix, NO_MATCH};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Locality-Sensitive Hashing over a signature matrix: every band groups the
/// records whose sub-signatures match exactly.
#[derive(Clone)]
pub struct MinHashLSH<'a> {
    /// Number of signature rows per band
    band_size: usize,
    /// One table per band, mapping a band key to the records (ascending) that share it
    hash_tables: Vec<FxHashMap<&'a [u32], Vec<usize>>>,
}

impl<'a> MinHashLSH<'a> {
    /// Buckets every record in every band.
    ///
    /// ## Arguments
    ///
    /// * `signatures` - The signature matrix to band.
    /// * `num_bands` - Number of bands (hash tables).
    /// * `band_size` - Signature rows per band. `num_bands * band_size` must
    /// equal the signature length.
    ///
    /// Band keys containing [`NO_MATCH`] are left out of the tables.
    pub fn new(
        signatures: &'a SignatureMatrix,
        num_bands: usize,
        band_size: usize,
    ) -> Result<Self, PipelineError> {
        if num_bands.checked_mul(band_size) != Some(signatures.rows()) {
            return Err(PipelineError::config(
                "num_minhashes",
                format!(
                    "blocks * rows_per_block must equal num_minhashes \
                     (got {num_bands} blocks * {band_size} rows per block, {} minhashes)",
                    signatures.rows()
                ),
            ));
        }
        let hash_tables = (0..num_bands)
            .into_par_iter()
            .map(move |band| {
                let start = band * band_size;
                let mut table: FxHashMap<&'a [u32], Vec<usize>> = FxHashMap::default();
                for col in 0..signatures.cols() {
                    let key = signatures.band(col, start, band_size);
                    if key.contains(&NO_MATCH) {
                        continue;
                    }
                    table.entry(key).or_default().push(col);
                }
                table
            })
            .collect();
        Ok(MinHashLSH {
            band_size,
            hash_tables,
        })
    }

    pub fn num_bands(&self) -> usize {
        self.hash_tables.len()
    }

    pub fn band_size(&self) -> usize {
        self.band_size
    }

    /// Counts, for every pair of records, the bands in which they share a bucket.
    pub fn vote(&self) -> VoteTable {
        let band_pairs: Vec<Vec<(usize, usize)>> = self
            .hash_tables
            .par_iter()
            .map(|table| {
                let mut pairs = Vec::new();
                for bucket in table.values().filter(|bucket| bucket.len() > 1) {
                    for (i, &earlier) in bucket.iter().enumerate() {
                        for &later in &bucket[i + 1..] {
                            pairs.push((earlier, later));
                        }
                    }
                }
                pairs
            })
            .collect();
        let mut counts: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        for pair in band_pairs.into_iter().flatten() {
            *counts.entry(pair).or_insert(0) += 1;
        }
        VoteTable { counts }
    }
}

/// Band votes per record pair, keyed `(earlier, later)`.
#[derive(Clone, Debug, Default)]
pub struct VoteTable {
    counts: FxHashMap<(usize, usize), usize>,
}

impl VoteTable {
    /// Number of pairs with at least one vote.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Pairs with at least `threshold` votes, sorted.
    pub fn edges(&self, threshold: usize) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .counts
            .iter()
            .filter(|&(_, &count)| count >= threshold)
            .map(|(&pair, _)| pair)
            .collect();
        edges.sort_unstable();
        edges
    }
}

/// Undirected similarity graph over record indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimilarityGraph {
    adjacency: Vec<Vec<usize>>,
}

impl SimilarityGraph {
    /// Builds a symmetric adjacency from edges given in either direction.
    /// Duplicate edges collapse; self loops are dropped.
    pub fn from_edges<I>(vertices: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut adjacency = vec![Vec::new(); vertices];
        for (a, b) in edges {
            if a == b {
                continue;
            }
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        for neighbors in adjacency.iter_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        SimilarityGraph { adjacency }
    }

    /// Keeps the pairs of `table` that reached `threshold` votes. A zero
    /// threshold is rejected earlier by [`SimilarityParams::validate`].
    ///
    /// [`SimilarityParams::validate`]: crate::params::SimilarityParams::validate
    pub fn from_votes(vertices: usize, table: &VoteTable, threshold: usize) -> Self {
        Self::from_edges(vertices, table.edges(threshold))
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Sorted neighbours of `vertex`.
    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        &self.adjacency[vertex]
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].binary_search(&b).is_ok()
    }

    /// Every undirected edge once, as `(smaller, larger)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(a, neighbors)| neighbors.iter().filter(move |&&b| a < b).map(move |&b| (a, b)))
    }
}
