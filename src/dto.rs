use crate::params::SimilarityParams;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DataFile {
    pub bucket: String,
    pub key: String,
}

/// Lambda event: where the cleaned records live plus optional tuning
/// parameters. Parameters left out of the event fall back to their defaults.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub data: DataFile,
    #[serde(flatten)]
    pub params: SimilarityParams,
}

/// One cleaned input record. `id` is what gets reported back (for cards, the
/// card name); `text` is the body that gets shingled.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    pub id: String,
    pub text: String,
}

impl Record {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, text: T) -> Self {
        Record {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One output row: a record and the cluster it landed in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordResult {
    #[serde(rename = "record_id")]
    pub id: String,
    pub cluster_id: String,
}
