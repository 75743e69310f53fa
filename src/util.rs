use crate::error::ServiceError;
use crate::response::Status;
use futures::stream::TryStreamExt;
use rusoto_core::Region;
use rusoto_s3::{GetObjectRequest, PutObjectRequest, S3Client, S3};
use std::env;
use std::str::FromStr;

pub fn get_region() -> Result<Region, ServiceError> {
    let val = get_env_var("REGION")?;
    Region::from_str(val.as_str()).map_err(|_| ServiceError {
        msg: format!("Unable to parse region {}", val),
        status: Status::InternalServerError,
    })
}

pub fn get_env_var(name: &str) -> Result<String, ServiceError> {
    env::var(name).map_err(|_| {
        ServiceError::internal_server_error(&format!("Environment variable '{}' not found", name))
    })
}

/// Reads and parses `name`, falling back to `default` when it is unset.
/// A value that is set but unparsable is an error rather than a silent default.
pub fn get_env_or<T>(name: &str, default: T) -> Result<T, ServiceError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => parse_setting(name, &val),
        Err(_) => Ok(default),
    }
}

pub fn parse_setting<T>(name: &str, val: &str) -> Result<T, ServiceError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    val.trim()
        .parse()
        .map_err(|err| ServiceError::bad_request(format!("Unable to parse {name}={val}: {err}")))
}

/// Results are written next to the input, under `/output` instead of `/input`.
pub fn output_bucket(input_bucket: &str) -> String {
    input_bucket.replace("/input", "/output")
}

pub async fn download_object_from_s3(
    client: &S3Client,
    bucket: String,
    key: String,
) -> Result<Vec<u8>, ServiceError> {
    let request = GetObjectRequest {
        bucket,
        key,
        ..Default::default()
    };
    let mut object = client
        .get_object(request)
        .await
        .map_err(ServiceError::internal_server_error)?;
    let body = object
        .body
        .take()
        .ok_or(ServiceError::internal_server_error(
            "Unable to extract body",
        ))?;
    body.map_ok(|b| b.to_vec())
        .try_concat()
        .await
        .map_err(ServiceError::internal_server_error)
}

pub async fn upload_object_to_s3(
    client: &S3Client,
    object: Vec<u8>,
    bucket: String,
    key: String,
    content_type: &str,
) -> Result<(), ServiceError> {
    let request = PutObjectRequest {
        bucket,
        key,
        body: Some(object.into()),
        content_type: Some(content_type.to_string()),
        ..Default::default()
    };
    client
        .put_object(request)
        .await
        .map(|_| ())
        .map_err(ServiceError::internal_server_error)
}
