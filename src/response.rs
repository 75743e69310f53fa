use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::error::ServiceError;

/// HTTP-style status carried in the Lambda response payload.
///
/// Serialized as its numeric code so API Gateway style consumers can read it
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Status {
    Ok,
    BadRequest,
    InternalServerError,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::InternalServerError => 500,
        }
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> u16 {
        status.code()
    }
}

impl TryFrom<u16> for Status {
    type Error = UnknownStatus;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(Status::Ok),
            400 => Ok(Status::BadRequest),
            500 => Ok(Status::InternalServerError),
            other => Err(UnknownStatus(other)),
        }
    }
}

#[derive(Debug)]
pub struct UnknownStatus(u16);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unsupported status code {}", self.0)
    }
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub status_code: Status,
    pub headers: Value,
    pub body: Value,
}

impl ResponsePayload {
    fn from_result(result: Result<Value, ServiceError>) -> Self {
        let headers = json!({
            "Content-Type": "application/json",
            "Access-Control-Allow-Origin": "*"
        });
        match result {
            Err(err) => ResponsePayload {
                status_code: err.status,
                headers,
                body: Value::String(err.msg),
            },
            Ok(body) => ResponsePayload {
                status_code: Status::Ok,
                headers,
                body,
            },
        }
    }
}

pub fn make_response_payload(
    result: Result<Value, ServiceError>,
) -> Result<Value, lambda_runtime::Error> {
    serde_json::to_value(ResponsePayload::from_result(result)).map_err(lambda_runtime::Error::from)
}
