//! TMDB-compatible catalog client
//!
//! Uses `ureq` for synchronous HTTP requests. One agent (connection pool)
//! is shared by every call, including calls made from worker threads.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{CastCredit, Catalog, CatalogError, CatalogPerson, FilmCredit};
use crate::model::{FilmId, PersonId};

/// Billing order assumed when the catalog omits one; never passes a filter
const UNBILLED: i64 = 9_999;

/// Longest error body kept in a `CatalogError::Status`
const MAX_ERROR_BODY: usize = 500;

/// Connection settings for [`TmdbClient`]
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    /// Prefix turning catalog image paths into absolute URLs
    pub image_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct PersonDto {
    id: i64,
    #[serde(default)]
    name: String,
    profile_path: Option<String>,
    #[serde(default)]
    popularity: f64,
    known_for_department: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchDto {
    #[serde(default)]
    results: Vec<PersonDto>,
}

#[derive(Debug, Deserialize)]
struct MovieCreditDto {
    id: i64,
    title: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    vote_average: f64,
    character: Option<String>,
    order: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MovieCreditsDto {
    #[serde(default)]
    cast: Vec<MovieCreditDto>,
}

#[derive(Debug, Deserialize)]
struct CastMemberDto {
    id: i64,
    #[serde(default)]
    name: String,
    profile_path: Option<String>,
    #[serde(default)]
    popularity: f64,
    character: Option<String>,
    order: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreditsDto {
    #[serde(default)]
    cast: Vec<CastMemberDto>,
}

/// Catalog client speaking the TMDB v3 REST API
pub struct TmdbClient {
    config: TmdbConfig,
    agent: ureq::Agent,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self { config, agent }
    }

    fn image_url(&self, path: Option<String>) -> Option<String> {
        path.filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", self.config.image_base_url, p))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        resource: String,
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self
            .agent
            .get(&url)
            .set("accept", "application/json")
            .set("Authorization", &format!("Bearer {}", self.config.api_key));
        for (key, value) in query {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => response
                .into_json::<T>()
                .map_err(|e| CatalogError::Decode(format!("{}: {}", resource, e))),
            Err(ureq::Error::Status(404, _)) => Err(CatalogError::NotFound { resource }),
            Err(ureq::Error::Status(429, response)) => Err(CatalogError::RateLimited {
                retry_after: response
                    .header("Retry-After")
                    .and_then(|v| v.trim().parse().ok()),
            }),
            Err(ureq::Error::Status(code, response)) => {
                let mut body = response.into_string().unwrap_or_default();
                if body.len() > MAX_ERROR_BODY {
                    let mut cut = MAX_ERROR_BODY;
                    while !body.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    body.truncate(cut);
                }
                Err(CatalogError::Status { code, body })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(CatalogError::Transport(transport.to_string()))
            }
        }
    }

    fn to_person(&self, dto: PersonDto) -> CatalogPerson {
        CatalogPerson {
            id: PersonId(dto.id),
            name: dto.name,
            image: self.image_url(dto.profile_path),
            popularity: dto.popularity,
            department: dto.known_for_department,
        }
    }
}

impl Catalog for TmdbClient {
    fn person(&self, id: PersonId) -> Result<Option<CatalogPerson>, CatalogError> {
        let path = format!("/person/{}", id);
        match self.get_json::<PersonDto>(&path, &[], format!("person {}", id)) {
            Ok(dto) => Ok(Some(self.to_person(dto))),
            Err(CatalogError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn filmography(&self, id: PersonId) -> Result<Vec<FilmCredit>, CatalogError> {
        let credits: MovieCreditsDto = self.get_json(
            &format!("/person/{}/movie_credits", id),
            &[("language", "en-US")],
            format!("filmography of person {}", id),
        )?;

        Ok(credits
            .cast
            .into_iter()
            .map(|c| FilmCredit {
                film_id: FilmId(c.id),
                title: c.title.unwrap_or_default(),
                poster: self.image_url(c.poster_path),
                release_date: c.release_date.unwrap_or_default(),
                rating: c.vote_average,
                character: c.character.unwrap_or_default(),
                billing_order: c.order.unwrap_or(UNBILLED),
            })
            .collect())
    }

    fn film_cast(&self, id: FilmId) -> Result<Vec<CastCredit>, CatalogError> {
        let credits: CreditsDto = self.get_json(
            &format!("/movie/{}/credits", id),
            &[("language", "en-US")],
            format!("cast of film {}", id),
        )?;

        Ok(credits
            .cast
            .into_iter()
            .map(|c| CastCredit {
                person_id: PersonId(c.id),
                name: c.name,
                image: self.image_url(c.profile_path),
                popularity: c.popularity,
                character: c.character.unwrap_or_default(),
                billing_order: c.order.unwrap_or(UNBILLED),
            })
            .collect())
    }

    fn search_people(&self, query: &str) -> Result<Vec<CatalogPerson>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }

        let found: SearchDto = self.get_json(
            "/search/person",
            &[
                ("query", query),
                ("include_adult", "false"),
                ("language", "en-US"),
                ("page", "1"),
            ],
            format!("search '{}'", query),
        )?;

        let mut people: Vec<CatalogPerson> = found
            .results
            .into_iter()
            .map(|dto| self.to_person(dto))
            .filter(CatalogPerson::is_performer)
            .collect();
        // Stable sort keeps the catalog's relevance order among equals
        people.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
        Ok(people)
    }
}
