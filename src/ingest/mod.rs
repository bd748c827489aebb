//! Ingestion pipeline: catalog → store
//!
//! [`Ingestor::ensure_person_ingested`] guarantees that a person, their
//! relevant filmography and the cast of every film in it are persisted.
//! Every step follows the same shape: collect from the catalog, dedupe in
//! memory, check existence against the store in one batch, then write in
//! one conflict-tolerant bulk insert. Cast lists are fetched concurrently
//! on a bounded [`FetchPool`], each film under its own [`RetryPolicy`].
//!
//! A person whose `fully_expanded` flag is set costs one store lookup and no
//! catalog calls.

mod batch;
mod pool;
mod retry;

pub use batch::{relevant_filmography, unique_by};
pub use pool::FetchPool;
pub use retry::{Attempted, RetryPolicy};

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CastCredit, Catalog, CatalogError};
use crate::error_codes;
use crate::model::{Appearance, FilmId, NewFilm, NewPerson, PersonId};
use crate::store::CastStore;

/// Default cap on films ingested per person
pub const DEFAULT_MAX_FILMS: usize = 150;

/// Default number of concurrent cast fetches
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Default number of films per fetch chunk
pub const DEFAULT_CHUNK_SIZE: usize = 40;

/// Default pause between fetch chunks
pub const DEFAULT_CHUNK_PAUSE: Duration = Duration::from_millis(250);

/// Tuning knobs for [`Ingestor`]
///
/// The relevance threshold is not here: it belongs to the store, so the
/// ingestion filter and the neighbour query can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Most recent productions kept per person
    pub max_films: usize,
    pub max_concurrent_fetches: usize,
    pub chunk_size: usize,
    pub chunk_pause: Duration,
    pub retry: RetryPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_films: DEFAULT_MAX_FILMS,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_pause: DEFAULT_CHUNK_PAUSE,
            retry: RetryPolicy::default(),
        }
    }
}

/// Why a person could not be ingested
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("person {id} not found in catalog")]
    PersonNotFound { id: PersonId },

    #[error("person {id} is not an actor (known for: {department})")]
    NotAnActor { id: PersonId, department: String },

    #[error("catalog unavailable while ingesting person {id}: {source}")]
    CatalogUnavailable {
        id: PersonId,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IngestError {
    /// Stable code for the endpoint boundary
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestError::PersonNotFound { .. } => error_codes::CL_ING_001_PERSON_NOT_FOUND,
            IngestError::NotAnActor { .. } => error_codes::CL_ING_002_NOT_AN_ACTOR,
            IngestError::CatalogUnavailable { .. } => error_codes::CL_CAT_001_UNAVAILABLE,
            IngestError::Store(_) => error_codes::CL_DB_001_STORE_FAILURE,
        }
    }

    /// Whether the person itself is unknown or unusable, as opposed to a failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IngestError::PersonNotFound { .. } | IngestError::NotAnActor { .. }
        )
    }
}

/// What one `ensure_person_ingested` call did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub person: PersonId,
    /// The person was already fully expanded; nothing was fetched or written
    pub cache_hit: bool,
    pub persons_created: usize,
    pub films_created: usize,
    pub appearances_created: usize,
    pub films_cast_saved: usize,
    /// Films whose cast could not be fetched within the retry ceiling
    pub films_skipped: Vec<FilmId>,
}

impl IngestReport {
    fn new(person: PersonId) -> Self {
        Self {
            person,
            cache_hit: false,
            persons_created: 0,
            films_created: 0,
            appearances_created: 0,
            films_cast_saved: 0,
            films_skipped: Vec::new(),
        }
    }

    /// Whether the call may have changed what neighbour queries return
    pub fn changed_store(&self) -> bool {
        !self.cache_hit
    }
}

/// Populates the store from the catalog
pub struct Ingestor {
    store: CastStore,
    catalog: Arc<dyn Catalog>,
    config: IngestConfig,
    pool: FetchPool,
}

impl Ingestor {
    pub fn new(
        store: CastStore,
        catalog: Arc<dyn Catalog>,
        config: IngestConfig,
    ) -> anyhow::Result<Self> {
        let pool = FetchPool::new(
            config.max_concurrent_fetches,
            config.chunk_size,
            config.chunk_pause,
        )?;
        Ok(Self {
            store,
            catalog,
            config,
            pool,
        })
    }

    pub fn store(&self) -> &CastStore {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Make sure `id`, its relevant filmography and those films' casts are stored
    ///
    /// On error the person row, if it was created, keeps
    /// `fully_expanded = false`; calling again repeats the work.
    pub fn ensure_person_ingested(&self, id: PersonId) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::new(id);

        match self.store.get_person(id)? {
            Some(person) if person.fully_expanded => {
                tracing::debug!(person = id.0, "already expanded");
                report.cache_hit = true;
                return Ok(report);
            }
            Some(_) => {}
            None => {
                self.create_person_from_catalog(id)?;
                report.persons_created += 1;
            }
        }

        let credits = self
            .config
            .retry
            .run(|| self.catalog.filmography(id))
            .into_result()
            .map_err(|source| IngestError::CatalogUnavailable { id, source })?;
        let credits = relevant_filmography(
            credits,
            self.store.max_billing_order(),
            self.config.max_films,
        );
        let film_ids: Vec<FilmId> = credits.iter().map(|c| c.film_id).collect();

        let existing = self.store.existing_film_ids(&film_ids)?;
        let new_films: Vec<NewFilm> = credits
            .iter()
            .filter(|c| !existing.contains(&c.film_id))
            .map(|c| NewFilm {
                id: c.film_id,
                title: c.title.clone(),
                release_date: c.release_date.clone(),
                poster: c.poster.clone(),
                rating: c.rating,
            })
            .collect();
        report.films_created += self.store.create_films_bulk(&new_films)?;

        let linked = self.store.linked_film_ids(id, &film_ids)?;
        let own_appearances: Vec<Appearance> = credits
            .iter()
            .filter(|c| !linked.contains(&c.film_id))
            .map(|c| Appearance {
                person_id: id,
                film_id: c.film_id,
                character: c.character.clone(),
                billing_order: c.billing_order,
            })
            .collect();
        report.appearances_created += self.store.create_appearances_bulk(&own_appearances)?;

        // Films created by an earlier run whose cast fetch was skipped are
        // picked up again here alongside the new ones.
        let cast_saved = self.store.cast_saved_film_ids(&film_ids)?;
        let needing_cast: Vec<FilmId> = film_ids
            .iter()
            .copied()
            .filter(|film| !cast_saved.contains(film))
            .collect();
        self.ingest_casts(&needing_cast, &mut report)?;

        self.store.mark_persons_expanded(&[id])?;

        tracing::info!(
            person = id.0,
            films = film_ids.len(),
            films_created = report.films_created,
            persons_created = report.persons_created,
            appearances_created = report.appearances_created,
            skipped = report.films_skipped.len(),
            "person ingested"
        );
        Ok(report)
    }

    fn create_person_from_catalog(&self, id: PersonId) -> Result<(), IngestError> {
        let person = self
            .config
            .retry
            .run(|| self.catalog.person(id))
            .into_result()
            .map_err(|source| IngestError::CatalogUnavailable { id, source })?
            .ok_or(IngestError::PersonNotFound { id })?;

        if !person.is_performer() {
            return Err(IngestError::NotAnActor {
                id,
                department: person.department.unwrap_or_else(|| "unknown".to_string()),
            });
        }

        self.store.create_person(&NewPerson {
            id,
            name: person.name,
            image: person.image,
            popularity: person.popularity,
        })?;
        Ok(())
    }

    /// Fetch and persist the cast of every film in `films`, chunk by chunk
    fn ingest_casts(&self, films: &[FilmId], report: &mut IngestReport) -> Result<(), IngestError> {
        if films.is_empty() {
            return Ok(());
        }
        let retry = self.config.retry;
        let catalog = &self.catalog;

        self.pool.for_each_chunk(
            films,
            |film| retry.run(|| catalog.film_cast(film)),
            |results| self.persist_cast_chunk(results, report),
        )?;
        Ok(())
    }

    fn persist_cast_chunk(
        &self,
        results: HashMap<FilmId, Attempted<Vec<CastCredit>>>,
        report: &mut IngestReport,
    ) -> anyhow::Result<()> {
        let mut fetched: Vec<(FilmId, Vec<CastCredit>)> = Vec::new();
        for (film, outcome) in results {
            match outcome {
                Attempted::Fetched { value, .. } => fetched.push((film, value)),
                Attempted::Skipped { error, attempts } => {
                    tracing::warn!(film = film.0, attempts, error = %error, "skipping film cast");
                    report.films_skipped.push(film);
                }
            }
        }
        fetched.sort_by_key(|(film, _)| *film);
        report.films_skipped.sort();

        let threshold = self.store.max_billing_order();
        let relevant = || {
            fetched.iter().flat_map(|(film, cast)| {
                cast.iter()
                    .filter(move |c| c.billing_order <= threshold)
                    .map(move |c| (*film, c))
            })
        };

        let performers = unique_by(relevant().map(|(_, c)| c), |c| c.person_id);
        let performer_ids: Vec<PersonId> = performers.iter().map(|c| c.person_id).collect();
        let existing = self.store.existing_person_ids(&performer_ids)?;
        let new_persons: Vec<NewPerson> = performers
            .into_iter()
            .filter(|c| !existing.contains(&c.person_id))
            .map(|c| NewPerson {
                id: c.person_id,
                name: c.name.clone(),
                image: c.image.clone(),
                popularity: c.popularity,
            })
            .collect();
        report.persons_created += self.store.create_persons_bulk(&new_persons)?;

        let fetched_ids: Vec<FilmId> = fetched.iter().map(|(film, _)| *film).collect();
        let stored_pairs = self.store.appearance_pairs_for_films(&fetched_ids)?;
        let appearances: Vec<Appearance> =
            unique_by(relevant(), |(film, c)| (c.person_id, *film))
                .into_iter()
                .filter(|(film, c)| !stored_pairs.contains(&(c.person_id, *film)))
                .map(|(film, c)| Appearance {
                    person_id: c.person_id,
                    film_id: film,
                    character: c.character.clone(),
                    billing_order: c.billing_order,
                })
                .collect();
        report.appearances_created += self.store.create_appearances_bulk(&appearances)?;

        report.films_cast_saved += self.store.mark_cast_saved(&fetched_ids)?;

        tracing::debug!(
            films = fetched_ids.len(),
            new_persons = new_persons.len(),
            appearances = appearances.len(),
            "cast chunk stored"
        );
        Ok(())
    }
}
