//! castlink CLI - shortest co-star chains between performers
//!
//! Usage: castlink <command> [arguments]

mod cli;
mod connect_cmd;
mod ingest_cmd;
mod neighbors_cmd;
mod search_cmd;
mod shared_cmd;
mod status_cmd;

use anyhow::Result;
use castlink::error_codes;
use castlink::output::{output_json, ErrorResponse};
use castlink::{
    CastStore, Catalog, CatalogError, Config, ConnectionService, IngestError, OutputFormat,
    StoreError, TmdbClient,
};
use cli::{parse_args, print_usage, requested_output_format, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    // stderr keeps stdout clean for JSON output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("castlink=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Open the store at `--db`, falling back to the configured path
pub(crate) fn open_store(config: &Config, db_path: Option<PathBuf>) -> Result<CastStore> {
    let path = db_path.unwrap_or_else(|| config.db_path.clone());
    let store = CastStore::open(&path).map_err(StoreError::from)?;
    Ok(store.with_max_billing_order(config.max_billing_order))
}

/// Catalog client built from `TMDB_*` settings
pub(crate) fn open_catalog(config: &Config) -> Result<Arc<dyn Catalog>> {
    Ok(Arc::new(TmdbClient::new(config.tmdb()?)))
}

pub(crate) fn open_service(config: &Config, db_path: Option<PathBuf>) -> Result<ConnectionService> {
    let store = open_store(config, db_path)?;
    let catalog = open_catalog(config)?;
    ConnectionService::new(store, catalog, config.ingest.clone())
}

/// Human-readable "Name (id)" for a stored person
pub(crate) fn person_label(store: &CastStore, id: castlink::PersonId) -> String {
    match store.get_person(id) {
        Ok(Some(person)) => format!("{} ({})", person.name, id),
        _ => format!("#{}", id),
    }
}

/// Stable error code for an error surfaced by a command
fn error_code_for(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<IngestError>() {
        return e.error_code();
    }
    if err.downcast_ref::<StoreError>().is_some() {
        return error_codes::CL_DB_001_STORE_FAILURE;
    }
    if let Some(e) = err.downcast_ref::<CatalogError>() {
        return match e {
            CatalogError::InvalidRequest(_) => error_codes::CL_CAT_002_INVALID_REQUEST,
            _ => error_codes::CL_CAT_001_UNAVAILABLE,
        };
    }
    error_codes::CL_GEN_001_INTERNAL
}

fn report_error(code: &str, err: &anyhow::Error, output_format: OutputFormat) -> ExitCode {
    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = ErrorResponse {
                error: code.to_string(),
                message: format!("{:#}", err),
            };
            if output_json(&response, output_format).is_err() {
                eprintln!("Error [{}]: {:#}", code, err);
            }
        }
        OutputFormat::Human => eprintln!("Error [{}]: {:#}", code, err),
    }
    ExitCode::from(1)
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Search {
            query,
            output_format,
        } => search_cmd::run_search(config, &query, output_format),
        Command::Ingest {
            db_path,
            person,
            output_format,
        } => ingest_cmd::run_ingest(config, db_path, person, output_format),
        Command::Connect {
            db_path,
            from,
            to,
            output_format,
        } => connect_cmd::run_connect(config, db_path, from, to, output_format),
        Command::Shared {
            db_path,
            a,
            b,
            output_format,
        } => shared_cmd::run_shared(config, db_path, a, b, output_format),
        Command::Neighbors {
            db_path,
            person,
            output_format,
        } => neighbors_cmd::run_neighbors(config, db_path, person, output_format),
        Command::Status {
            db_path,
            output_format,
        } => status_cmd::run_status(config, db_path, output_format),
        Command::Help => {
            print_usage();
            Ok(())
        }
        Command::Version => {
            println!("{}", castlink::version::version());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let output_format = requested_output_format(&args);

    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            let code = report_error(error_codes::CL_CLI_001_INVALID_ARGS, &e, output_format);
            if output_format == OutputFormat::Human {
                print_usage();
            }
            return code;
        }
    };

    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => return report_error(error_codes::CL_CLI_002_INVALID_CONFIG, &e, output_format),
    };

    match run(command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            report_error(error_code_for(&e), &e, output_format)
        }
    }
}
