//! JSON output types for CLI commands
//!
//! Every JSON response is wrapped in a [`JsonResponse`] carrying the schema
//! version and an execution id, so scripts can detect format changes and
//! correlate output with log lines.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogPerson;
use crate::ingest::IngestReport;
use crate::model::{Appearance, Connection, Film, NeighborEdge, Person, PersonId};
use crate::store::StoreCounts;

/// Current JSON output schema version
pub const CASTLINK_JSON_SCHEMA_VERSION: &str = "1.0.0";

/// Wrapper for all JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Schema version for parsing stability
    pub schema_version: String,
    /// Unique execution ID for this run
    pub execution_id: String,
    /// Tool name
    pub tool: String,
    /// RFC 3339 time the response was produced
    pub timestamp: String,
    /// Response data
    pub data: T,
}

impl<T> JsonResponse<T> {
    pub fn new(data: T, execution_id: &str) -> Self {
        JsonResponse {
            schema_version: CASTLINK_JSON_SCHEMA_VERSION.to_string(),
            execution_id: execution_id.to_string(),
            tool: "castlink".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            data,
        }
    }
}

/// Response for search command
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub people: Vec<CatalogPerson>,
}

/// Response for ingest command
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub report: IngestReport,
    pub counts: StoreCounts,
}

/// Response for connect command
#[derive(Debug, Clone, Serialize)]
pub struct ConnectResponse {
    pub from: PersonId,
    pub to: PersonId,
    /// Hop count; absent when not connected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees: Option<usize>,
    pub connection: Connection,
}

/// Response for shared command
#[derive(Debug, Clone, Serialize)]
pub struct SharedResponse {
    pub a: PersonId,
    pub b: PersonId,
    pub film: Option<Film>,
}

/// One stored credit of a person
#[derive(Debug, Clone, Serialize)]
pub struct CreditEntry {
    pub film: Film,
    pub character: String,
    pub billing_order: i64,
}

impl From<(Film, Appearance)> for CreditEntry {
    fn from((film, appearance): (Film, Appearance)) -> Self {
        CreditEntry {
            film,
            character: appearance.character,
            billing_order: appearance.billing_order,
        }
    }
}

/// Response for neighbors command
#[derive(Debug, Clone, Serialize)]
pub struct NeighborsResponse {
    pub person: Person,
    pub credits: Vec<CreditEntry>,
    pub neighbors: Vec<NeighborEdge>,
}

/// Response for status command
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub db_path: String,
    pub counts: StoreCounts,
}

/// Response for errors in JSON mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code (`CL-*`)
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Human,
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}

impl OutputFormat {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Some(OutputFormat::Human),
            "json" => Some(OutputFormat::Json),
            "pretty" => Some(OutputFormat::Pretty),
            _ => None,
        }
    }
}

/// Generate a unique execution ID for this run
///
/// Uses timestamp + process ID for uniqueness.
pub fn generate_execution_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let pid = std::process::id();

    format!("{:x}-{:x}", timestamp, pid)
}

/// Serialize `data` in the JSON flavour `format` asks for
pub fn render_json<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<String> {
    let json = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(data)?,
        OutputFormat::Human | OutputFormat::Json => serde_json::to_string(data)?,
    };
    Ok(json)
}

/// Output JSON to stdout
pub fn output_json<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render_json(data, format)?);
    Ok(())
}
