//! Ingest command implementation
//!
//! Runs the ingestion pipeline for one person and reports what it wrote.

use anyhow::Result;
use castlink::output::{generate_execution_id, output_json, IngestResponse, JsonResponse};
use castlink::{Config, OutputFormat, PersonId, StoreError};
use std::path::PathBuf;

/// Run ingest command
///
/// Usage: castlink ingest --db <FILE> --person <ID>
pub fn run_ingest(
    config: &Config,
    db_path: Option<PathBuf>,
    person: PersonId,
    output_format: OutputFormat,
) -> Result<()> {
    let mut service = crate::open_service(config, db_path)?;
    let report = service.ingest(person)?;
    let counts = service.store().counts().map_err(StoreError::from)?;

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = IngestResponse { report, counts };
            output_json(&JsonResponse::new(response, &generate_execution_id()), output_format)?;
        }
        OutputFormat::Human => {
            let label = crate::person_label(service.store(), person);
            if report.cache_hit {
                println!("{}: already ingested", label);
            } else {
                println!("{}: ingested", label);
                println!("  films created: {}", report.films_created);
                println!("  persons created: {}", report.persons_created);
                println!("  appearances created: {}", report.appearances_created);
                println!("  casts saved: {}", report.films_cast_saved);
                if !report.films_skipped.is_empty() {
                    println!("  casts skipped: {}", report.films_skipped.len());
                }
            }
            println!(
                "store: {} persons, {} films, {} appearances",
                counts.persons, counts.films, counts.appearances
            );
        }
    }
    Ok(())
}
