use crate::error::PipelineError;
use crate::shingle::Tokenizer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Largest accepted shingle length, in tokens.
pub const MAX_K: usize = 1 << 16;

/// Tuning knobs for a similarity run.
///
/// `num_minhashes` must equal `blocks * rows_per_block`. The other sizes must
/// be positive and `k` at most [`MAX_K`]; see [`SimilarityParams::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilarityParams {
    /// Tokens per shingle.
    pub k: usize,
    /// Minimum number of records a shingle must occur in to enter the vocabulary.
    pub min_support: usize,
    /// Signature length.
    pub num_minhashes: usize,
    /// Number of LSH bands.
    pub blocks: usize,
    /// Signature rows per band.
    pub rows_per_block: usize,
    /// Band matches needed before two records are joined by an edge.
    pub votes: usize,
    /// Cap on the permuted rows scanned per signature, including the
    /// synthetic leading row.
    pub max_rows: usize,
    pub tokenizer: Tokenizer,
    /// Seed for hash function selection. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        SimilarityParams {
            k: 3,
            min_support: 4,
            num_minhashes: 144,
            blocks: 24,
            rows_per_block: 6,
            votes: 6,
            max_rows: 500,
            tokenizer: Tokenizer::default(),
            seed: None,
        }
    }
}

impl SimilarityParams {
    /// Checks the parameters before any matrix work is attempted.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.k == 0 {
            return Err(PipelineError::config("k", "must be greater than 0"));
        }
        if self.k > MAX_K {
            return Err(PipelineError::config("k", format!("must not exceed {MAX_K}")));
        }
        if self.num_minhashes == 0 {
            return Err(PipelineError::config("num_minhashes", "must be greater than 0"));
        }
        if self.blocks == 0 {
            return Err(PipelineError::config("blocks", "must be greater than 0"));
        }
        if self.rows_per_block == 0 {
            return Err(PipelineError::config("rows_per_block", "must be greater than 0"));
        }
        if self.blocks.checked_mul(self.rows_per_block) != Some(self.num_minhashes) {
            return Err(PipelineError::config(
                "num_minhashes",
                format!(
                    "blocks * rows_per_block must equal num_minhashes \
                     (got {} blocks * {} rows per block, {} minhashes)",
                    self.blocks, self.rows_per_block, self.num_minhashes
                ),
            ));
        }
        if self.votes == 0 {
            return Err(PipelineError::config(
                "votes",
                "must be greater than 0, otherwise every pair of records would be linked",
            ));
        }
        if self.max_rows == 0 {
            return Err(PipelineError::config("max_rows", "must be greater than 0"));
        }
        if u32::try_from(self.max_rows).is_err() {
            return Err(PipelineError::config(
                "max_rows",
                format!("must not exceed {}", u32::MAX),
            ));
        }
        Ok(())
    }

    /// Random source for hash function selection, seeded when `seed` is set.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn defaults_are_valid() {
        let params = SimilarityParams::default();
        assert_eq!(params.blocks * params.rows_per_block, params.num_minhashes);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn band_shape_must_cover_signature() {
        let params = SimilarityParams {
            num_minhashes: 100,
            ..Default::default()
        };
        match params.validate() {
            Err(PipelineError::Config { param, reason }) => {
                assert_eq!(param, "num_minhashes");
                assert!(reason.contains("24 blocks * 6 rows per block, 100 minhashes"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn zero_sizes_are_rejected() {
        for params in [
            SimilarityParams { k: 0, ..Default::default() },
            SimilarityParams { max_rows: 0, ..Default::default() },
            SimilarityParams {
                blocks: 0,
                num_minhashes: 0,
                ..Default::default()
            },
            SimilarityParams {
                rows_per_block: 0,
                ..Default::default()
            },
        ] {
            assert!(matches!(params.validate(), Err(PipelineError::Config { .. })));
        }
    }

    #[test]
    fn zero_votes_are_rejected() {
        let params = SimilarityParams {
            votes: 0,
            ..Default::default()
        };
        match params.validate() {
            Err(PipelineError::Config { param, .. }) => assert_eq!(param, "votes"),
            other => panic!("expected config error, got {other:?}"),
        }
        let params = SimilarityParams {
            votes: 1,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn oversized_k_is_rejected() {
        for k in [MAX_K + 1, usize::MAX] {
            let params = SimilarityParams { k, ..Default::default() };
            assert!(matches!(
                params.validate(),
                Err(PipelineError::Config { param: "k", .. })
            ));
        }
        let params = SimilarityParams {
            k: MAX_K,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let params = SimilarityParams {
            seed: Some(99),
            ..Default::default()
        };
        let a: Vec<u64> = params.rng().sample_iter(rand::distributions::Standard).take(4).collect();
        let b: Vec<u64> = params.rng().sample_iter(rand::distributions::Standard).take(4).collect();
        assert_eq!(a, b);
    }
}
