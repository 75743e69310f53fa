use crate::cluster::{connected_components, Components};
use crate::dto::Record;
use crate::error::PipelineError;
use crate::lsh::{MinHashLSH, SimilarityGraph};
use crate::matrix::CharacteristicMatrix;
use crate::minhash::MinHasher;
use crate::params::SimilarityParams;
use crate::shingle::shingle_records;
use crate::vocab::Vocabulary;
use rand::Rng;
use std::time::Instant;
use tracing::info;

/// Final artifacts of a similarity run.
#[derive(Clone, Debug)]
pub struct Clustering {
    pub graph: SimilarityGraph,
    pub components: Components,
}

/// Groups `records` into clusters of mutually similar texts.
///
/// ## Arguments
///
/// * `records` - Cleaned records; a record's position is its index in the output.
/// * `params` - Run parameters, validated before any work starts.
/// * `rng` - Source for the MinHash row permutations.
///
/// With fewer than two records there is nobody to vote with, so every record
/// is returned as its own component without building any matrices.
pub fn find_similar<R: Rng + ?Sized>(
    records: &[Record],
    params: &SimilarityParams,
    rng: &mut R,
) -> Result<Clustering, PipelineError> {
    params.validate()?;
    if records.len() < 2 {
        return Ok(Clustering {
            graph: SimilarityGraph::from_edges(records.len(), Vec::new()),
            components: Components::singletons(records.len()),
        });
    }

    let start = Instant::now();
    let sets = shingle_records(records, params.tokenizer, params.k);
    info!(
        records = records.len(),
        elapsed = start.elapsed().as_secs_f64(),
        "shingled records"
    );

    let start = Instant::now();
    let vocab = Vocabulary::build(&sets, params.min_support)?;
    info!(
        shingles = vocab.len(),
        min_support = params.min_support,
        elapsed = start.elapsed().as_secs_f64(),
        "built vocabulary"
    );

    let start = Instant::now();
    let matrix = CharacteristicMatrix::build(&vocab, &sets)?;
    drop(sets);
    drop(vocab);
    info!(
        rows = matrix.rows(),
        cols = matrix.cols(),
        ones = matrix.count_ones(),
        elapsed = start.elapsed().as_secs_f64(),
        "built characteristic matrix"
    );

    let start = Instant::now();
    let hasher = MinHasher::new(rng, params.num_minhashes, matrix.rows(), params.max_rows);
    let signatures = hasher.signatures(&matrix)?;
    drop(matrix);
    info!(
        num_minhashes = signatures.rows(),
        elapsed = start.elapsed().as_secs_f64(),
        "hashed records"
    );

    let start = Instant::now();
    let lsh = MinHashLSH::new(&signatures, params.blocks, params.rows_per_block)?;
    let table = lsh.vote();
    info!(
        bands = lsh.num_bands(),
        band_size = lsh.band_size(),
        voted_pairs = table.len(),
        elapsed = start.elapsed().as_secs_f64(),
        "banded signatures"
    );
    drop(lsh);
    drop(signatures);

    let start = Instant::now();
    let graph = SimilarityGraph::from_votes(records.len(), &table, params.votes);
    drop(table);
    info!(
        edges = graph.num_edges(),
        votes = params.votes,
        elapsed = start.elapsed().as_secs_f64(),
        "built similarity graph"
    );

    let start = Instant::now();
    let components = connected_components(&graph);
    info!(
        components = components.len(),
        elapsed = start.elapsed().as_secs_f64(),
        "clustered records"
    );

    Ok(Clustering { graph, components })
}

/// [`find_similar`] with the random source described by `params.seed`.
pub fn find_similar_seeded(
    records: &[Record],
    params: &SimilarityParams,
) -> Result<Clustering, PipelineError> {
    find_similar(records, params, &mut params.rng())
}
