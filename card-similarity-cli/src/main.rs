mod input;

use card_similarity::error::{PipelineError, ServiceError};
use card_similarity::params::SimilarityParams;
use card_similarity::pipeline::find_similar_seeded;
use card_similarity::shingle::Tokenizer;
use card_similarity::util::{get_env_or, parse_setting};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const OUTPUT_FILE: &str = "card-similarity.json";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Setting(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("unable to read records: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl From<ServiceError> for CliError {
    fn from(err: ServiceError) -> Self {
        CliError::Setting(err.msg)
    }
}

#[derive(Debug, PartialEq)]
struct Options {
    records: PathBuf,
    params: SimilarityParams,
}

enum Command {
    Help,
    Run(Options),
}

fn usage(program: &str) -> String {
    let defaults = SimilarityParams::default();
    format!(
        "Usage: {program} <records-file> [num-minhashes] [blocks] [rows-per-block] [votes] [max-rows]\n\
         'records-file' is a JSON array of cleaned cards (id/text or name/oracle_text) or a CSV with id,text columns.\n\
         'num-minhashes' defaults to {}. It must be the result of blocks*rows_per_block.\n\
         'blocks' defaults to {}.\n\
         'rows-per-block' defaults to {}.\n\
         'votes' defaults to {}.\n\
         'max-rows' defaults to {}.\n\
         CARD_SIM_K, CARD_SIM_MIN_SUPPORT, CARD_SIM_TOKENIZER (chars|words) and CARD_SIM_SEED override the rest.",
        defaults.num_minhashes, defaults.blocks, defaults.rows_per_block, defaults.votes, defaults.max_rows,
    )
}

/// Positional arguments after the program name; `params` carries the
/// environment-derived settings and defaults.
fn parse_args(args: &[String], mut params: SimilarityParams) -> Result<Command, CliError> {
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        return Ok(Command::Help);
    }
    let records = args
        .first()
        .map(PathBuf::from)
        .ok_or_else(|| CliError::Usage(String::from("missing records file")))?;
    let numeric: [(&str, &mut usize); 5] = [
        ("num-minhashes", &mut params.num_minhashes),
        ("blocks", &mut params.blocks),
        ("rows-per-block", &mut params.rows_per_block),
        ("votes", &mut params.votes),
        ("max-rows", &mut params.max_rows),
    ];
    for ((name, slot), arg) in numeric.into_iter().zip(args.iter().skip(1)) {
        *slot = parse_setting(name, arg)?;
    }
    if args.len() > 6 {
        return Err(CliError::Usage(format!("unexpected argument '{}'", args[6])));
    }
    Ok(Command::Run(Options { records, params }))
}

fn env_params() -> Result<SimilarityParams, CliError> {
    let defaults = SimilarityParams::default();
    let tokenizer = match get_env_or("CARD_SIM_TOKENIZER", String::from("chars"))?.as_str() {
        "chars" => Tokenizer::Chars,
        "words" => Tokenizer::Words,
        other => {
            return Err(CliError::Setting(format!(
                "CARD_SIM_TOKENIZER must be 'chars' or 'words', got '{other}'"
            )))
        }
    };
    let seed = match std::env::var("CARD_SIM_SEED") {
        Ok(val) => Some(parse_setting("CARD_SIM_SEED", &val)?),
        Err(_) => None,
    };
    Ok(SimilarityParams {
        k: get_env_or("CARD_SIM_K", defaults.k)?,
        min_support: get_env_or("CARD_SIM_MIN_SUPPORT", defaults.min_support)?,
        tokenizer,
        seed,
        ..defaults
    })
}

fn run(options: Options) -> Result<(), CliError> {
    let records = input::load_records(&options.records)?;
    info!(path = %options.records.display(), records = records.len(), "loaded records");
    let clustering = find_similar_seeded(&records, &options.params)?;
    let components = clustering.components;

    let summary = components.summary();
    println!("\n{} groups of size >= 2 found.", summary.groups);
    println!("{} groups of size < 2 found.", summary.singletons);
    println!("Largest group size: {}", summary.largest);
    println!("Average group size: {:.2}", summary.average);
    println!("Median group size: {}", summary.median);

    println!("\nSaving to '{OUTPUT_FILE}'...");
    let json = serde_json::to_string_pretty(&components.labelled(&records))?;
    std::fs::write(OUTPUT_FILE, json)?;
    println!("Saved.");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| String::from("card-similarity-cli"));
    let args: Vec<String> = args.collect();

    let command = env_params().and_then(|params| parse_args(&args, params));
    let result = match command {
        Ok(Command::Help) => {
            eprintln!("{}", usage(&program));
            return ExitCode::SUCCESS;
        }
        Ok(Command::Run(options)) => run(options),
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ CliError::Usage(_)) => {
            eprintln!("{err}\n\n{}", usage(&program));
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
