//! Connect command implementation
//!
//! Ingests both people, then prints the shortest co-star chain.

use anyhow::Result;
use castlink::output::{generate_execution_id, output_json, ConnectResponse, JsonResponse};
use castlink::{Config, Connection, OutputFormat, PersonId};
use std::path::PathBuf;

/// Run connect command
///
/// Usage: castlink connect --db <FILE> --from <ID> --to <ID>
pub fn run_connect(
    config: &Config,
    db_path: Option<PathBuf>,
    from: PersonId,
    to: PersonId,
    output_format: OutputFormat,
) -> Result<()> {
    let mut service = crate::open_service(config, db_path)?;
    let connection = service.find_connection(from, to)?;

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = ConnectResponse {
                from,
                to,
                degrees: connection.degrees(),
                connection,
            };
            output_json(&JsonResponse::new(response, &generate_execution_id()), output_format)?;
        }
        OutputFormat::Human => {
            let store = service.store();
            let from_label = crate::person_label(store, from);
            let to_label = crate::person_label(store, to);
            match &connection {
                Connection::Same => println!("{} is {}: 0 degrees", from_label, to_label),
                Connection::NotConnected => {
                    println!("No connection between {} and {}", from_label, to_label)
                }
                Connection::Path(hops) => {
                    println!("{} -> {}: {} degrees", from_label, to_label, hops.len());
                    for hop in hops {
                        println!(
                            "  {} and {} in \"{}\" ({})",
                            crate::person_label(store, hop.from),
                            crate::person_label(store, hop.to),
                            hop.via.title,
                            hop.via.film_id
                        );
                    }
                }
            }
        }
    }
    Ok(())
}
