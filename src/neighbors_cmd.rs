//! Neighbors command implementation
//!
//! Reads only the store: a person's stored credits and the one edge per
//! co-star the graph engine would load on expansion.

use anyhow::Result;
use castlink::output::{
    generate_execution_id, output_json, CreditEntry, JsonResponse, NeighborsResponse,
};
use castlink::{Config, OutputFormat, PersonId, StoreError};
use std::path::PathBuf;

/// Run neighbors command
///
/// Usage: castlink neighbors --db <FILE> --person <ID>
pub fn run_neighbors(
    config: &Config,
    db_path: Option<PathBuf>,
    person: PersonId,
    output_format: OutputFormat,
) -> Result<()> {
    let store = crate::open_store(config, db_path)?;
    let record = store.get_person(person).map_err(StoreError::from)?.ok_or_else(|| {
        anyhow::anyhow!(
            "Person {} is not in the store; run `castlink ingest` first",
            person
        )
    })?;
    let credits: Vec<CreditEntry> = store
        .films_of(person)
        .map_err(StoreError::from)?
        .into_iter()
        .map(CreditEntry::from)
        .collect();
    let neighbors = store.neighbors_of(person).map_err(StoreError::from)?;

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = NeighborsResponse {
                person: record,
                credits,
                neighbors,
            };
            output_json(&JsonResponse::new(response, &generate_execution_id()), output_format)?;
        }
        OutputFormat::Human => {
            println!(
                "{} ({}){}",
                record.name,
                record.id,
                if record.fully_expanded { "" } else { " [not fully ingested]" }
            );
            println!("credits: {}", credits.len());
            for credit in &credits {
                println!(
                    "  {:<40} {:<12} #{:<3} {}",
                    credit.film.title,
                    credit.film.release_date,
                    credit.billing_order,
                    credit.character
                );
            }
            println!("co-stars: {}", neighbors.len());
            for edge in &neighbors {
                println!(
                    "  {:<40} via {}",
                    crate::person_label(&store, edge.to),
                    edge.attr.title
                );
            }
        }
    }
    Ok(())
}
