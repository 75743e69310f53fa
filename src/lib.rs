//! Near-duplicate detection for card rules text.
//!
//! Records flow through shingling, a frequent-shingle vocabulary, a
//! characteristic bit matrix, MinHash signatures and LSH band voting. The
//! surviving edges form a similarity graph whose connected components are the
//! returned clusters. The shared service plumbing (DTOs, errors, response
//! payloads, S3 helpers) lives here as well.

pub mod cluster;
pub mod dto;
pub mod error;
pub mod lsh;
pub mod matrix;
pub mod minhash;
pub mod params;
pub mod pipeline;
pub mod response;
pub mod shingle;
pub mod util;
pub mod vocab;

pub use cluster::{ComponentSummary, Components};
pub use dto::Record;
pub use error::{PipelineError, ServiceError};
pub use params::SimilarityParams;
pub use pipeline::{find_similar, find_similar_seeded, Clustering};
