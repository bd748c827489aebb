//! Status command implementation

use anyhow::Result;
use castlink::output::{generate_execution_id, output_json, JsonResponse, StatusResponse};
use castlink::{Config, OutputFormat, StoreError};
use std::path::PathBuf;

/// Run status query command
///
/// Usage: castlink status --db <FILE>
pub fn run_status(
    config: &Config,
    db_path: Option<PathBuf>,
    output_format: OutputFormat,
) -> Result<()> {
    let store = crate::open_store(config, db_path)?;
    let counts = store.counts().map_err(StoreError::from)?;

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = StatusResponse {
                db_path: store.db_path().display().to_string(),
                counts,
            };
            output_json(&JsonResponse::new(response, &generate_execution_id()), output_format)?;
        }
        OutputFormat::Human => {
            println!("db: {}", store.db_path().display());
            println!("persons: {} ({} fully ingested)", counts.persons, counts.expanded_persons);
            println!("films: {} ({} with cast)", counts.films, counts.cast_saved_films);
            println!("appearances: {}", counts.appearances);
        }
    }
    Ok(())
}
