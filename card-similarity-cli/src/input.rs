use crate::CliError;
use card_similarity::dto::Record;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A cleaned card entry. Accepts the plain `id`/`text` shape as well as the
/// `name`/`oracle_text` field names of a cleaned card dump.
#[derive(Deserialize)]
struct Entry {
    #[serde(alias = "name")]
    id: String,
    #[serde(alias = "oracle_text", default)]
    text: String,
}

impl From<Entry> for Record {
    fn from(entry: Entry) -> Self {
        Record::new(entry.id, entry.text)
    }
}

/// Loads records from a `.csv` file or, for any other extension, a JSON array.
pub fn load_records(path: &Path) -> Result<Vec<Record>, CliError> {
    if !path.is_file() {
        return Err(CliError::Usage(format!(
            "\"{}\" is not a file or cannot be found.",
            path.display()
        )));
    }
    let bytes = fs::read(path)?;
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        parse_csv(&bytes)
    } else {
        parse_json(&bytes)
    }
}

pub fn parse_json(bytes: &[u8]) -> Result<Vec<Record>, CliError> {
    let entries: Vec<Entry> = serde_json::from_slice(bytes)?;
    Ok(entries.into_iter().map(Record::from).collect())
}

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>, CliError> {
    csv::Reader::from_reader(bytes)
        .deserialize::<Entry>()
        .map(|entry| -> Result<Record, CliError> { Ok(Record::from(entry?)) })
        .collect()
}
