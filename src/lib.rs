//! Castlink: shortest co-star chains between performers
//!
//! Castlink answers "how are these two people connected through the films
//! they appeared in?". The co-star graph is far too large to load up front
//! and lives behind a rate-limited catalog, so it is discovered on demand:
//!
//! 1. the [`ingest`] pipeline copies a person's relevant filmography and
//!    the cast of those films from the [`catalog`] into the SQLite [`store`];
//! 2. the [`graph`] engine runs a bidirectional breadth-first search,
//!    loading each vertex's neighbours from the store only when the search
//!    reaches it.
//!
//! [`service::ConnectionService`] ties the two together behind the two
//! queries an endpoint layer needs: `find_connection` and `shared_film`.
//!
//! # Relevance
//!
//! Only appearances with a billing order at or below the store's threshold
//! (15 by default) are ingested or become edges. Each co-star pair is
//! connected by exactly one edge, their most recent shared film.

pub mod catalog;
pub mod config;
pub mod error_codes;
pub mod graph;
pub mod ingest;
pub mod model;
pub mod output;
pub mod service;
pub mod store;
pub mod version;

pub use catalog::{
    CastCredit, Catalog, CatalogError, CatalogPerson, FilmCredit, TmdbClient, TmdbConfig,
};
pub use config::Config;
pub use graph::{CoStarGraph, NeighborSource};
pub use ingest::{IngestConfig, IngestError, IngestReport, Ingestor, RetryPolicy};
pub use model::{Appearance, Connection, EdgeAttr, Film, FilmId, Hop, Person, PersonId};
pub use output::OutputFormat;
pub use service::ConnectionService;
pub use store::{CastStore, StoreCounts, StoreError};
