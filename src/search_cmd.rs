//! Search command implementation
//!
//! Passes a free-text query to the catalog; nothing is stored.

use anyhow::Result;
use castlink::output::{generate_execution_id, output_json, JsonResponse, SearchResponse};
use castlink::{Config, OutputFormat};

/// Run search command
///
/// Usage: castlink search --query <TEXT>
pub fn run_search(config: &Config, query: &str, output_format: OutputFormat) -> Result<()> {
    let catalog = crate::open_catalog(config)?;
    let people = config
        .ingest
        .retry
        .run(|| catalog.search_people(query))
        .into_result()?;

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = SearchResponse {
                query: query.to_string(),
                people,
            };
            output_json(&JsonResponse::new(response, &generate_execution_id()), output_format)?;
        }
        OutputFormat::Human => {
            if people.is_empty() {
                println!("No performers match '{}'", query);
            }
            for person in &people {
                println!(
                    "{:>10}  {:<40} popularity {:.1}",
                    person.id, person.name, person.popularity
                );
            }
        }
    }
    Ok(())
}
