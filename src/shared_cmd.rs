//! Shared command implementation

use anyhow::Result;
use castlink::output::{generate_execution_id, output_json, JsonResponse, SharedResponse};
use castlink::{Config, OutputFormat, PersonId};
use std::path::PathBuf;

/// Run shared command
///
/// Usage: castlink shared --db <FILE> --a <ID> --b <ID>
pub fn run_shared(
    config: &Config,
    db_path: Option<PathBuf>,
    a: PersonId,
    b: PersonId,
    output_format: OutputFormat,
) -> Result<()> {
    let mut service = crate::open_service(config, db_path)?;
    let film = service.shared_film(a, b)?;

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = SharedResponse { a, b, film };
            output_json(&JsonResponse::new(response, &generate_execution_id()), output_format)?;
        }
        OutputFormat::Human => match film {
            Some(film) => println!(
                "{} ({}) released {}, rated {:.1}",
                film.title,
                film.id,
                if film.release_date.is_empty() { "?" } else { film.release_date.as_str() },
                film.rating
            ),
            None => println!("No shared film"),
        },
    }
    Ok(())
}
