use crate::response::Status;
use serde::{Deserialize, Serialize};
use serde_json;
use std::error;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceError {
    pub msg: String,
    pub status: Status,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl error::Error for ServiceError {}

impl ServiceError {
    pub fn bad_request<T: std::fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::BadRequest,
        }
    }

    pub fn internal_server_error<T: std::fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::InternalServerError,
        }
    }
}

/// Failures that abort a similarity run.
///
/// None of these are transient; the caller gets one back before any partial
/// output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A parameter is out of range or inconsistent with another one.
    #[error("invalid parameter '{param}': {reason}")]
    Config { param: &'static str, reason: String },

    /// No shingle met the minimum support, so there is nothing to compare on.
    #[error(
        "empty vocabulary: none of {distinct_shingles} distinct shingles across \
         {records} records appears in at least {min_support} records"
    )]
    EmptyVocabulary {
        min_support: usize,
        distinct_shingles: usize,
        records: usize,
    },

    /// A matrix buffer could not be reserved.
    #[error("failed to allocate {what} of {rows} x {cols}")]
    Allocation {
        what: &'static str,
        rows: usize,
        cols: usize,
    },
}

impl PipelineError {
    pub(crate) fn config<T: fmt::Display>(param: &'static str, reason: T) -> Self {
        PipelineError::Config {
            param,
            reason: reason.to_string(),
        }
    }
}

impl From<PipelineError> for ServiceError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Config { .. } | PipelineError::EmptyVocabulary { .. } => {
                ServiceError::bad_request(err)
            }
            PipelineError::Allocation { .. } => ServiceError::internal_server_error(err),
        }
    }
}
