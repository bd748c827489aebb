//! Shared fixtures: an in-process catalog with scripted data and failures

#![allow(dead_code)]

use castlink::{
    CastCredit, CastStore, Catalog, CatalogError, CatalogPerson, FilmCredit, FilmId,
    IngestConfig, Ingestor, PersonId, RetryPolicy,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Scripted catalog: a small consistent world of people and films
#[derive(Default)]
pub struct FakeCatalog {
    people: HashMap<PersonId, CatalogPerson>,
    filmographies: HashMap<PersonId, Vec<FilmCredit>>,
    casts: HashMap<FilmId, Vec<CastCredit>>,
    /// Remaining transient failures per film cast fetch
    cast_failures: Mutex<HashMap<FilmId, u32>>,
    filmography_down: bool,
    pub person_calls: AtomicUsize,
    pub filmography_calls: AtomicUsize,
    pub cast_calls: Mutex<HashMap<FilmId, usize>>,
    pub search_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn performer(id: i64, name: &str, department: &str) -> CatalogPerson {
        CatalogPerson {
            id: PersonId(id),
            name: name.to_string(),
            image: None,
            popularity: id as f64,
            department: Some(department.to_string()),
        }
    }

    pub fn actor(mut self, id: i64, name: &str) -> Self {
        self.people
            .insert(PersonId(id), Self::performer(id, name, "Acting"));
        self
    }

    pub fn director(mut self, id: i64, name: &str) -> Self {
        self.people
            .insert(PersonId(id), Self::performer(id, name, "Directing"));
        self
    }

    /// Add a film with its cast as (person, billing order)
    ///
    /// Every cast member gets a matching filmography credit; unknown cast
    /// members become actors named "Person {id}".
    pub fn film(mut self, id: i64, release_date: &str, rating: f64, cast: &[(i64, i64)]) -> Self {
        let film_id = FilmId(id);
        let mut credits = Vec::new();
        for &(person, billing_order) in cast {
            let person_id = PersonId(person);
            let record = self
                .people
                .entry(person_id)
                .or_insert_with(|| Self::performer(person, &format!("Person {}", person), "Acting"))
                .clone();

            credits.push(CastCredit {
                person_id,
                name: record.name.clone(),
                image: None,
                popularity: record.popularity,
                character: format!("Role {}", person),
                billing_order,
            });
            self.filmographies
                .entry(person_id)
                .or_default()
                .push(FilmCredit {
                    film_id,
                    title: format!("Film {}", id),
                    poster: None,
                    release_date: release_date.to_string(),
                    rating,
                    character: format!("Role {}", person),
                    billing_order,
                });
        }
        self.casts.insert(film_id, credits);
        self
    }

    /// The next `times` cast fetches for `film` fail transiently
    pub fn failing_cast(self, film: i64, times: u32) -> Self {
        self.cast_failures
            .lock()
            .unwrap()
            .insert(FilmId(film), times);
        self
    }

    /// Every filmography fetch fails transiently
    pub fn filmography_down(mut self) -> Self {
        self.filmography_down = true;
        self
    }

    pub fn cast_calls_for(&self, film: i64) -> usize {
        self.cast_calls
            .lock()
            .unwrap()
            .get(&FilmId(film))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.person_calls.load(Ordering::SeqCst)
            + self.filmography_calls.load(Ordering::SeqCst)
            + self.cast_calls.lock().unwrap().values().sum::<usize>()
            + self.search_calls.load(Ordering::SeqCst)
    }
}

impl Catalog for FakeCatalog {
    fn person(&self, id: PersonId) -> Result<Option<CatalogPerson>, CatalogError> {
        self.person_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.people.get(&id).cloned())
    }

    fn filmography(&self, id: PersonId) -> Result<Vec<FilmCredit>, CatalogError> {
        self.filmography_calls.fetch_add(1, Ordering::SeqCst);
        if self.filmography_down {
            return Err(CatalogError::Status {
                code: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.filmographies.get(&id).cloned().unwrap_or_default())
    }

    fn film_cast(&self, id: FilmId) -> Result<Vec<CastCredit>, CatalogError> {
        *self.cast_calls.lock().unwrap().entry(id).or_default() += 1;

        let mut failures = self.cast_failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CatalogError::RateLimited { retry_after: None });
            }
        }
        drop(failures);

        self.casts
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                resource: format!("film {}", id),
            })
    }

    fn search_people(&self, query: &str) -> Result<Vec<CatalogPerson>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let needle = query.to_lowercase();
        let mut found: Vec<CatalogPerson> = self
            .people
            .values()
            .filter(|p| p.is_performer() && p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
        Ok(found)
    }
}

/// Fast settings: no sleeping, small chunks, three attempts
pub fn test_config() -> IngestConfig {
    IngestConfig {
        max_films: 150,
        max_concurrent_fetches: 4,
        chunk_size: 2,
        chunk_pause: Duration::ZERO,
        retry: RetryPolicy::immediate(3),
    }
}

pub struct Fixture {
    pub temp_dir: TempDir,
    pub store: CastStore,
    pub catalog: Arc<FakeCatalog>,
}

impl Fixture {
    pub fn new(catalog: FakeCatalog) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = CastStore::open(temp_dir.path().join("castlink.db")).unwrap();
        Self {
            temp_dir,
            store,
            catalog: Arc::new(catalog),
        }
    }

    pub fn dyn_catalog(&self) -> Arc<dyn Catalog> {
        self.catalog.clone()
    }

    pub fn ingestor(&self) -> Ingestor {
        self.ingestor_with(test_config())
    }

    pub fn ingestor_with(&self, config: IngestConfig) -> Ingestor {
        Ingestor::new(self.store.clone(), self.dyn_catalog(), config).unwrap()
    }
}
