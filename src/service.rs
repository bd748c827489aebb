//! Query surface for the endpoint layer
//!
//! Each query first ingests the people it names, then answers from the
//! store. The process-local graph cache lives as long as the service and is
//! discarded whenever ingestion reports new writes, so earlier expansions
//! never hide freshly stored edges.

use anyhow::Result;
use std::sync::Arc;

use crate::catalog::{Catalog, CatalogPerson};
use crate::graph::CoStarGraph;
use crate::ingest::{IngestConfig, IngestReport, Ingestor};
use crate::model::{Connection, Film, PersonId};
use crate::store::{CastStore, StoreError};

/// Connection and shared-film queries over an ingesting store
pub struct ConnectionService {
    ingestor: Ingestor,
    graph: CoStarGraph<CastStore>,
}

impl ConnectionService {
    pub fn new(store: CastStore, catalog: Arc<dyn Catalog>, config: IngestConfig) -> Result<Self> {
        let graph = CoStarGraph::new(store.clone());
        let ingestor = Ingestor::new(store, catalog, config)?;
        Ok(Self { ingestor, graph })
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    pub fn store(&self) -> &CastStore {
        self.ingestor.store()
    }

    /// Ingest one person, dropping the graph cache if anything changed
    pub fn ingest(&mut self, id: PersonId) -> Result<IngestReport> {
        let report = self.ingestor.ensure_person_ingested(id)?;
        if report.changed_store() {
            self.graph.clear();
        }
        Ok(report)
    }

    /// Shortest co-appearance chain between `a` and `b`
    ///
    /// `a == b` still ingests `a`, so an unknown person is reported, but
    /// runs no search.
    pub fn find_connection(&mut self, a: PersonId, b: PersonId) -> Result<Connection> {
        self.ingest(a)?;
        if a == b {
            return Ok(Connection::Same);
        }
        self.ingest(b)?;

        let path = self.graph.shortest_path(a, b).map_err(StoreError::from)?;
        let connection = match path {
            Some(hops) if hops.is_empty() => Connection::Same,
            Some(hops) => Connection::Path(hops),
            None => Connection::NotConnected,
        };
        tracing::info!(
            from = a.0,
            to = b.0,
            degrees = ?connection.degrees(),
            expanded = self.graph.expanded_count(),
            "connection query"
        );
        Ok(connection)
    }

    /// Highest-rated film both `a` and `b` appeared in
    ///
    /// `a == b` returns `None` without touching the catalog or the store.
    pub fn shared_film(&mut self, a: PersonId, b: PersonId) -> Result<Option<Film>> {
        if a == b {
            return Ok(None);
        }
        self.ingest(a)?;
        self.ingest(b)?;
        Ok(self.store().shared_film(a, b).map_err(StoreError::from)?)
    }

    /// Performers matching `query`, most popular first
    pub fn search_people(&self, query: &str) -> Result<Vec<CatalogPerson>> {
        let catalog = self.ingestor.catalog();
        let people = self
            .ingestor
            .config()
            .retry
            .run(|| catalog.search_people(query))
            .into_result()?;
        Ok(people)
    }
}
