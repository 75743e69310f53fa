use card_similarity::cluster::Components;
use card_similarity::dto::{DataFile, Record};
use card_similarity::error::ServiceError;
use card_similarity::util::{download_object_from_s3, output_bucket, upload_object_to_s3};
use csv::{Reader, Writer};
use rusoto_s3::S3Client;
use serde_json::{json, Value};

pub async fn pull_data_file(
    client: &S3Client,
    data: &DataFile,
) -> Result<Vec<Record>, ServiceError> {
    let bytes = download_object_from_s3(client, data.bucket.clone(), data.key.clone()).await?;
    parse_records(bytes.as_slice())
}

/// Reads `id`/`text` records from CSV. Extra columns are ignored.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>, ServiceError> {
    let mut reader = Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(ServiceError::internal_server_error)?
        .clone();
    reader
        .records()
        .map(|record| match record {
            Ok(rec) => rec.deserialize(Some(&headers)).map_err(|_| {
                ServiceError::bad_request(String::from("file must contain columns 'id' and 'text'"))
            }),
            Err(err) => Err(ServiceError::internal_server_error(err)),
        })
        .collect()
}

/// Serializes one `record_id,cluster_id` row per record.
pub fn write_results(records: &[Record], components: &Components) -> Result<Vec<u8>, ServiceError> {
    let mut writer = Writer::from_writer(vec![]);
    for row in components.record_results(records) {
        writer
            .serialize(row)
            .map_err(ServiceError::internal_server_error)?;
    }
    writer
        .into_inner()
        .map_err(ServiceError::internal_server_error)
}

pub async fn push_result_file(
    client: &S3Client,
    bucket: String,
    key: String,
    object: Vec<u8>,
) -> Result<Value, ServiceError> {
    let output_bucket = output_bucket(&bucket);
    upload_object_to_s3(client, object, output_bucket.clone(), key.clone(), "text/csv").await?;
    Ok(json!({ "bucket": output_bucket, "key": key }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_similarity::lsh::SimilarityGraph;
    use card_similarity::cluster::connected_components;
    use card_similarity::response::Status;

    #[test]
    fn parses_id_and_text_columns() {
        let data = b"id,text,set\nShock,deal 2 damage to any target,m19\nOpt,\"scry 1, then draw a card\",xln\n";
        let records = parse_records(data).unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("Shock", "deal 2 damage to any target"),
                Record::new("Opt", "scry 1, then draw a card"),
            ]
        );
    }

    #[test]
    fn missing_columns_are_a_bad_request() {
        let err = parse_records(b"name,oracle_text\nShock,deal 2 damage\n").unwrap_err();
        assert!(matches!(err.status, Status::BadRequest));
    }

    #[test]
    fn results_have_a_header_and_cluster_labels() {
        let records = vec![
            Record::new("Shock", "deal 2 damage to any target"),
            Record::new("Opt", "scry 1, then draw a card"),
            Record::new("Spark", "deal 2 damage to any target"),
        ];
        let components = connected_components(&SimilarityGraph::from_edges(3, vec![(0, 2)]));
        let bytes = write_results(&records, &components).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "record_id,cluster_id\nShock,0-2\nSpark,0-2\nOpt,1-1\n"
        );
    }
}
