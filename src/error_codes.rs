//! Castlink error codes
//!
//! Error codes follow the pattern: CL-{CATEGORY}-{3-digit number}
//!
//! Categories (1-3 uppercase letters):
//! - ING: Ingestion outcomes the caller can act on (unknown person, not an actor)
//! - CAT: External catalog failures that survived the retry policy
//! - DB: Persistent store failures
//! - CLI: Invalid command-line usage or configuration
//! - GEN: Anything else
//!
//! Each error code is stable and should not be reused.

/// Person unknown to the catalog
pub const CL_ING_001_PERSON_NOT_FOUND: &str = "CL-ING-001";

/// Person exists but is not a performer
pub const CL_ING_002_NOT_AN_ACTOR: &str = "CL-ING-002";

/// Catalog could not be reached or kept failing
pub const CL_CAT_001_UNAVAILABLE: &str = "CL-CAT-001";

/// Catalog rejected the request itself (e.g. empty search)
pub const CL_CAT_002_INVALID_REQUEST: &str = "CL-CAT-002";

/// Store read or write failed
pub const CL_DB_001_STORE_FAILURE: &str = "CL-DB-001";

/// Invalid arguments
pub const CL_CLI_001_INVALID_ARGS: &str = "CL-CLI-001";

/// Invalid environment configuration
pub const CL_CLI_002_INVALID_CONFIG: &str = "CL-CLI-002";

/// Unclassified failure
pub const CL_GEN_001_INTERNAL: &str = "CL-GEN-001";

/// Error code documentation
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | CL-ING-001 | Person not found | Check the id with `castlink search` |
/// | CL-ING-002 | Not an actor | Only performers can be connected |
/// | CL-CAT-001 | Catalog unavailable | Retry later; check `TMDB_API_KEY` and network |
/// | CL-CAT-002 | Invalid catalog request | Fix the request arguments |
/// | CL-DB-001 | Store failure | Check `--db` path and permissions |
/// | CL-CLI-001 | Invalid arguments | See `castlink --help` |
/// | CL-CLI-002 | Invalid configuration | Fix the named environment variable |
/// | CL-GEN-001 | Internal error | Re-run with `RUST_LOG=castlink=debug` |
pub const ERROR_CODE_DOCUMENTATION: &str = "Error code documentation available in source";
