//! Domain records shared by the store, the catalog client and the graph engine
//!
//! Ids are the catalog's own identifiers: stable, globally unique, and used
//! unchanged as primary keys in the store and as vertex ids in the graph.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog identifier of a performer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub i64);

/// Catalog identifier of a film
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilmId(pub i64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FilmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A performer as persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    /// Absolute image URL, if the catalog has one
    pub image: Option<String>,
    pub popularity: f64,
    /// All relevant filmography and cast data has been ingested
    pub fully_expanded: bool,
    /// RFC 3339 timestamp of the last write to this row
    pub last_updated: String,
}

/// A film as persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    /// Free text from the catalog; may be empty or malformed
    pub release_date: String,
    pub poster: Option<String>,
    pub rating: f64,
    pub cast_fully_saved: bool,
}

/// Person x film edge with character and billing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub person_id: PersonId,
    pub film_id: FilmId,
    pub character: String,
    pub billing_order: i64,
}

/// Person row to insert, before the store assigns flags and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerson {
    pub id: PersonId,
    pub name: String,
    pub image: Option<String>,
    pub popularity: f64,
}

/// Film row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewFilm {
    pub id: FilmId,
    pub title: String,
    pub release_date: String,
    pub poster: Option<String>,
    pub rating: f64,
}

/// Attribute carried by a graph edge: the film connecting two performers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeAttr {
    pub film_id: FilmId,
    pub title: String,
    pub poster: Option<String>,
}

/// One neighbour edge as returned by the store's ranked co-star query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborEdge {
    pub from: PersonId,
    pub to: PersonId,
    pub attr: EdgeAttr,
}

/// One step of a connecting path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub from: PersonId,
    pub via: EdgeAttr,
    pub to: PersonId,
}

/// Outcome of a connection query
///
/// `Same` and `NotConnected` are distinct results, neither is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "hops", rename_all = "snake_case")]
pub enum Connection {
    Same,
    Path(Vec<Hop>),
    NotConnected,
}

impl Connection {
    /// Number of hops, `None` when the two people are not connected
    pub fn degrees(&self) -> Option<usize> {
        match self {
            Connection::Same => Some(0),
            Connection::Path(hops) => Some(hops.len()),
            Connection::NotConnected => None,
        }
    }
}

/// Normalized sort key for a free-text release date
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM` and `YYYY`; partial dates map to their
/// first day. Everything else, including the empty string, has no key and
/// sorts after every dated film.
pub fn release_sort_key(release_date: &str) -> Option<String> {
    let raw = release_date.trim();
    let date = match raw.len() {
        10 => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d").ok(),
        4 if raw.bytes().all(|b| b.is_ascii_digit()) => {
            NaiveDate::parse_from_str(&format!("{}-01-01", raw), "%Y-%m-%d").ok()
        }
        _ => None,
    }?;
    Some(date.format("%Y-%m-%d").to_string())
}
