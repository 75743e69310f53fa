mod util;

use card_similarity::dto::ClusterConfig;
use card_similarity::error::ServiceError;
use card_similarity::pipeline::find_similar_seeded;
use card_similarity::response::make_response_payload;
use card_similarity::util::get_region;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use lazy_static::lazy_static;
use rusoto_core::{Client, Region};
use rusoto_s3::S3Client;
use serde_json::{json, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

lazy_static! {
    // AWS Region
    static ref REGION: Region = get_region().unwrap();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .with_ansi(false)
        .json()
        .init();
    run(service_fn(process)).await?;
    Ok(())
}

async fn process(event: LambdaEvent<ClusterConfig>) -> Result<Value, Error> {
    let (config, _context) = event.into_parts();
    let result = cluster(config).await;
    if let Err(err) = &result {
        error!(status = err.status.code(), msg = %err.msg, "clustering failed");
    }
    make_response_payload(result)
}

async fn cluster(config: ClusterConfig) -> Result<Value, ServiceError> {
    config.params.validate()?;
    let start = std::time::Instant::now();
    let client = S3Client::new_with_client(Client::shared(), REGION.clone());
    let records = util::pull_data_file(&client, &config.data).await?;
    info!(
        bucket = %config.data.bucket,
        key = %config.data.key,
        records = records.len(),
        elapsed = start.elapsed().as_secs_f64(),
        "file downloaded"
    );
    let start = std::time::Instant::now();
    let clustering = find_similar_seeded(&records, &config.params)?;
    let summary = clustering.components.summary();
    info!(
        groups = summary.groups,
        singletons = summary.singletons,
        largest = summary.largest,
        elapsed = start.elapsed().as_secs_f64(),
        "clustering completed"
    );
    let object = util::write_results(&records, &clustering.components)?;
    let mut location =
        util::push_result_file(&client, config.data.bucket, config.data.key, object).await?;
    location["summary"] = json!(summary);
    Ok(location)
}
