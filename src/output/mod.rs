//! JSON output module for CLI commands
//!
//! Provides schema-versioned response types for every command.

pub mod command;

pub use command::{
    generate_execution_id, output_json, render_json, ConnectResponse, CreditEntry,
    ErrorResponse, IngestResponse, JsonResponse, NeighborsResponse, OutputFormat,
    SearchResponse, SharedResponse, StatusResponse,
};
