//! External film catalog
//!
//! The catalog is a black box that knows people, filmographies and casts,
//! and may fail transiently (network, rate limits) at any call. Everything
//! the rest of the crate needs from it goes through the [`Catalog`] trait,
//! which is `Send + Sync` so cast fetches can fan out across worker threads.

mod tmdb;

pub use tmdb::{TmdbClient, TmdbConfig};

use serde::Serialize;

use crate::model::{FilmId, PersonId};

/// Primary profession the catalog uses for performers
pub const ACTING_DEPARTMENT: &str = "Acting";

/// Person as described by the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogPerson {
    pub id: PersonId,
    pub name: String,
    pub image: Option<String>,
    pub popularity: f64,
    /// Primary profession, e.g. "Acting" or "Directing"
    pub department: Option<String>,
}

impl CatalogPerson {
    pub fn is_performer(&self) -> bool {
        self.department.as_deref() == Some(ACTING_DEPARTMENT)
    }
}

/// One entry of a person's filmography
#[derive(Debug, Clone, PartialEq)]
pub struct FilmCredit {
    pub film_id: FilmId,
    pub title: String,
    pub poster: Option<String>,
    pub release_date: String,
    pub rating: f64,
    pub character: String,
    pub billing_order: i64,
}

/// One entry of a film's cast list
#[derive(Debug, Clone, PartialEq)]
pub struct CastCredit {
    pub person_id: PersonId,
    pub name: String,
    pub image: Option<String>,
    pub popularity: f64,
    pub character: String,
    pub billing_order: i64,
}

/// Failure of a single catalog call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("{resource} not found in catalog")]
    NotFound { resource: String },

    #[error("catalog rate limit hit (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("catalog returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("catalog transport error: {0}")]
    Transport(String),

    #[error("could not decode catalog response: {0}")]
    Decode(String),

    #[error("invalid catalog request: {0}")]
    InvalidRequest(String),
}

impl CatalogError {
    /// Whether repeating the same call later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::RateLimited { .. } | CatalogError::Transport(_) => true,
            CatalogError::Status { code, .. } => *code >= 500 || *code == 408,
            CatalogError::NotFound { .. }
            | CatalogError::Decode(_)
            | CatalogError::InvalidRequest(_) => false,
        }
    }
}

/// Read access to the external catalog
pub trait Catalog: Send + Sync {
    /// Person details, `None` when the catalog has no such person
    fn person(&self, id: PersonId) -> Result<Option<CatalogPerson>, CatalogError>;

    /// Every film credit of `id`, unfiltered
    fn filmography(&self, id: PersonId) -> Result<Vec<FilmCredit>, CatalogError>;

    /// Full cast list of `id`, unfiltered
    fn film_cast(&self, id: FilmId) -> Result<Vec<CastCredit>, CatalogError>;

    /// Free-text person search, ranked by the catalog
    fn search_people(&self, query: &str) -> Result<Vec<CatalogPerson>, CatalogError>;
}
