//! Appearance rows and the queries that walk them
//!
//! The neighbour query is what the graph engine calls on every vertex
//! expansion. For each co-star it keeps exactly one connecting film, the
//! most recent shared one, which bounds the neighbour list of prolific
//! performers to one edge per co-star.

use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use std::collections::HashSet;

use super::films::{film_from_row, FILM_COLUMNS, RECENCY_ORDER};
use super::persons::person_from_row;
use super::{query_id_batches, CastStore};
use crate::model::{Appearance, EdgeAttr, Film, FilmId, NeighborEdge, Person, PersonId};

impl CastStore {
    /// Insert many appearances in one transaction
    ///
    /// Pairs already present are ignored. Returns the number of rows written.
    pub fn create_appearances_bulk(&self, appearances: &[Appearance]) -> Result<usize> {
        if appearances.is_empty() {
            return Ok(0);
        }
        let conn = self.connect()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| anyhow::anyhow!("Failed to start transaction: {}", e))?;

        let mut written = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO appearances
                        (person_id, film_id, character, billing_order)
                        VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| anyhow::anyhow!("Failed to prepare appearance insert: {}", e))?;
            for appearance in appearances {
                written += stmt
                    .execute(params![
                        appearance.person_id.0,
                        appearance.film_id.0,
                        appearance.character,
                        appearance.billing_order,
                    ])
                    .map_err(|e| {
                        anyhow::anyhow!(
                            "Failed to insert appearance ({}, {}): {}",
                            appearance.person_id,
                            appearance.film_id,
                            e
                        )
                    })?;
            }
        }

        tx.commit()
            .map_err(|e| anyhow::anyhow!("Failed to commit transaction: {}", e))?;
        Ok(written)
    }

    /// Which of `films` already link to `person`
    pub fn linked_film_ids(&self, person: PersonId, films: &[FilmId]) -> Result<HashSet<FilmId>> {
        let conn = self.connect()?;
        let raw: Vec<i64> = films.iter().map(|id| id.0).collect();
        let found = query_id_batches(
            &conn,
            "SELECT film_id FROM appearances WHERE person_id = ?1 AND film_id IN ({ids})",
            &raw,
            &[person.0],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(found.into_iter().map(FilmId).collect())
    }

    /// Every (person, film) pair already stored for any of `films`
    pub fn appearance_pairs_for_films(
        &self,
        films: &[FilmId],
    ) -> Result<HashSet<(PersonId, FilmId)>> {
        let conn = self.connect()?;
        let raw: Vec<i64> = films.iter().map(|id| id.0).collect();
        let found = query_id_batches(
            &conn,
            "SELECT person_id, film_id FROM appearances WHERE film_id IN ({ids})",
            &raw,
            &[],
            |row| Ok((PersonId(row.get(0)?), FilmId(row.get(1)?))),
        )?;
        Ok(found.into_iter().collect())
    }

    /// One edge per co-star of `person`, via their most recent shared film
    ///
    /// Appearances above the relevance threshold are ignored on both sides.
    /// Results are ordered by co-star id.
    pub fn neighbors_of(&self, person: PersonId) -> Result<Vec<NeighborEdge>> {
        let conn = self.connect()?;
        let sql = format!(
            "WITH mine AS (
                 SELECT film_id FROM appearances
                 WHERE person_id = ?1 AND billing_order <= ?2
             ),
             ranked AS (
                 SELECT a.person_id AS costar, f.id AS film_id, f.title AS title,
                        f.poster AS poster,
                        ROW_NUMBER() OVER (PARTITION BY a.person_id ORDER BY {}) AS rn
                 FROM appearances a
                 JOIN mine m ON m.film_id = a.film_id
                 JOIN films f ON f.id = a.film_id
                 WHERE a.person_id != ?1 AND a.billing_order <= ?2
             )
             SELECT costar, film_id, title, poster FROM ranked
             WHERE rn = 1
             ORDER BY costar",
            RECENCY_ORDER
        );

        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(|e| anyhow::anyhow!("Failed to prepare neighbour query: {}", e))?;
        let edges = stmt
            .query_map(params![person.0, self.max_billing_order()], |row| {
                Ok(NeighborEdge {
                    from: person,
                    to: PersonId(row.get(0)?),
                    attr: EdgeAttr {
                        film_id: FilmId(row.get(1)?),
                        title: row.get(2)?,
                        poster: row.get(3)?,
                    },
                })
            })
            .map_err(|e| anyhow::anyhow!("Failed to query neighbours of {}: {}", person, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Failed to read neighbour row: {}", e))?;

        Ok(edges)
    }

    /// A film both `a` and `b` appeared in, highest rated first
    ///
    /// Uses the same relevance threshold as the neighbour query.
    pub fn shared_film(&self, a: PersonId, b: PersonId) -> Result<Option<Film>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {} FROM films f
             JOIN appearances x ON x.film_id = f.id AND x.person_id = ?1
             JOIN appearances y ON y.film_id = f.id AND y.person_id = ?2
             WHERE x.billing_order <= ?3 AND y.billing_order <= ?3
             ORDER BY f.rating DESC, {}
             LIMIT 1",
            FILM_COLUMNS, RECENCY_ORDER
        );
        conn.query_row(&sql, params![a.0, b.0, self.max_billing_order()], film_from_row)
            .optional()
            .map_err(|e| anyhow::anyhow!("Failed to query shared film of {} and {}: {}", a, b, e))
    }

    /// Films `person` appeared in, most recent first
    pub fn films_of(&self, person: PersonId) -> Result<Vec<(Film, Appearance)>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {}, a.character, a.billing_order FROM films f
             JOIN appearances a ON a.film_id = f.id
             WHERE a.person_id = ?1
             ORDER BY {}",
            FILM_COLUMNS, RECENCY_ORDER
        );
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(|e| anyhow::anyhow!("Failed to prepare filmography query: {}", e))?;
        let rows = stmt
            .query_map(params![person.0], |row| {
                let film = film_from_row(row)?;
                let appearance = Appearance {
                    person_id: person,
                    film_id: film.id,
                    character: row.get(6)?,
                    billing_order: row.get(7)?,
                };
                Ok((film, appearance))
            })
            .map_err(|e| anyhow::anyhow!("Failed to query films of {}: {}", person, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Failed to read filmography row: {}", e))?;
        Ok(rows)
    }

    /// Cast of `film` in billing order
    pub fn cast_of(&self, film: FilmId) -> Result<Vec<(Person, Appearance)>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT p.id, p.name, p.image, p.popularity, p.fully_expanded, p.last_updated,
                        a.character, a.billing_order
                 FROM persons p
                 JOIN appearances a ON a.person_id = p.id
                 WHERE a.film_id = ?1
                 ORDER BY a.billing_order, p.id",
            )
            .map_err(|e| anyhow::anyhow!("Failed to prepare cast query: {}", e))?;
        let rows = stmt
            .query_map(params![film.0], |row| {
                let person = person_from_row(row)?;
                let appearance = Appearance {
                    person_id: person.id,
                    film_id: film,
                    character: row.get(6)?,
                    billing_order: row.get(7)?,
                };
                Ok((person, appearance))
            })
            .map_err(|e| anyhow::anyhow!("Failed to query cast of {}: {}", film, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Failed to read cast row: {}", e))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewFilm, NewPerson};
    use tempfile::TempDir;

    fn seed(store: &CastStore, persons: &[i64], films: &[(i64, &str, f64)]) {
        let persons: Vec<NewPerson> = persons
            .iter()
            .map(|&id| NewPerson {
                id: PersonId(id),
                name: format!("Person {}", id),
                image: None,
                popularity: 0.0,
            })
            .collect();
        store.create_persons_bulk(&persons).unwrap();

        let films: Vec<NewFilm> = films
            .iter()
            .map(|&(id, date, rating)| NewFilm {
                id: FilmId(id),
                title: format!("Film {}", id),
                release_date: date.to_string(),
                poster: None,
                rating,
            })
            .collect();
        store.create_films_bulk(&films).unwrap();
    }

    fn appear(person: i64, film: i64, order: i64) -> Appearance {
        Appearance {
            person_id: PersonId(person),
            film_id: FilmId(film),
            character: String::new(),
            billing_order: order,
        }
    }

    fn open() -> (TempDir, CastStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = CastStore::open(temp_dir.path().join("cast.db")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_duplicate_appearance_is_ignored() {
        let (_dir, store) = open();
        seed(&store, &[1], &[(10, "2020-01-01", 5.0)]);

        assert_eq!(store.create_appearances_bulk(&[appear(1, 10, 0)]).unwrap(), 1);
        assert_eq!(
            store
                .create_appearances_bulk(&[appear(1, 10, 3), appear(1, 10, 4)])
                .unwrap(),
            0
        );
        assert_eq!(store.counts().unwrap().appearances, 1);
    }

    #[test]
    fn test_neighbors_keep_most_recent_shared_film() {
        let (_dir, store) = open();
        seed(
            &store,
            &[1, 2],
            &[
                (10, "2001-05-01", 5.0),
                (11, "2019-03-02", 5.0),
                (12, "2010-11-20", 5.0),
            ],
        );
        store
            .create_appearances_bulk(&[
                appear(1, 10, 0),
                appear(1, 11, 0),
                appear(1, 12, 0),
                appear(2, 10, 1),
                appear(2, 11, 1),
                appear(2, 12, 1),
            ])
            .unwrap();

        let edges = store.neighbors_of(PersonId(1)).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, PersonId(2));
        assert_eq!(edges[0].attr.film_id, FilmId(11));
    }

    #[test]
    fn test_neighbors_sort_undated_films_last() {
        let (_dir, store) = open();
        seed(
            &store,
            &[1, 2],
            &[(20, "", 5.0), (21, "coming soon", 5.0), (22, "1987", 5.0)],
        );
        store
            .create_appearances_bulk(&[
                appear(1, 20, 0),
                appear(1, 21, 0),
                appear(1, 22, 0),
                appear(2, 20, 0),
                appear(2, 21, 0),
                appear(2, 22, 0),
            ])
            .unwrap();

        let edges = store.neighbors_of(PersonId(2)).unwrap();
        assert_eq!(edges[0].attr.film_id, FilmId(22));
    }

    #[test]
    fn test_neighbors_respect_billing_threshold() {
        let (_dir, store) = open();
        let store = store.with_max_billing_order(5);
        seed(&store, &[1, 2, 3], &[(10, "2020-01-01", 5.0)]);
        store
            .create_appearances_bulk(&[appear(1, 10, 0), appear(2, 10, 5), appear(3, 10, 6)])
            .unwrap();

        let edges = store.neighbors_of(PersonId(1)).unwrap();
        let costars: Vec<PersonId> = edges.iter().map(|e| e.to).collect();
        assert_eq!(costars, vec![PersonId(2)]);
        assert!(store.neighbors_of(PersonId(3)).unwrap().is_empty());
    }

    #[test]
    fn test_shared_film_prefers_highest_rating() {
        let (_dir, store) = open();
        seed(
            &store,
            &[1, 2],
            &[(10, "2020-01-01", 6.1), (11, "2001-01-01", 8.4), (12, "2022-01-01", 9.9)],
        );
        store
            .create_appearances_bulk(&[
                appear(1, 10, 0),
                appear(1, 11, 0),
                appear(2, 10, 0),
                appear(2, 11, 0),
                appear(2, 12, 0),
            ])
            .unwrap();

        let film = store.shared_film(PersonId(1), PersonId(2)).unwrap().unwrap();
        assert_eq!(film.id, FilmId(11));
        assert!(store.shared_film(PersonId(1), PersonId(3)).unwrap().is_none());
    }

    #[test]
    fn test_shared_film_respects_billing_threshold() {
        let (_dir, store) = open();
        let store = store.with_max_billing_order(5);
        seed(&store, &[1, 2, 3], &[(9, "2015-01-01", 7.0)]);
        store
            .create_appearances_bulk(&[appear(1, 9, 0), appear(2, 9, 12), appear(3, 9, 5)])
            .unwrap();

        assert!(store.neighbors_of(PersonId(2)).unwrap().is_empty());
        assert!(store.shared_film(PersonId(1), PersonId(2)).unwrap().is_none());
        assert!(store.shared_film(PersonId(2), PersonId(1)).unwrap().is_none());

        let film = store.shared_film(PersonId(1), PersonId(3)).unwrap().unwrap();
        assert_eq!(film.id, FilmId(9));
    }

    #[test]
    fn test_linked_films_and_pairs() {
        let (_dir, store) = open();
        seed(&store, &[1, 2], &[(10, "", 0.0), (11, "", 0.0)]);
        store
            .create_appearances_bulk(&[appear(1, 10, 0), appear(2, 11, 0)])
            .unwrap();

        let linked = store
            .linked_film_ids(PersonId(1), &[FilmId(10), FilmId(11)])
            .unwrap();
        assert_eq!(linked, HashSet::from([FilmId(10)]));

        let pairs = store.appearance_pairs_for_films(&[FilmId(11)]).unwrap();
        assert_eq!(pairs, HashSet::from([(PersonId(2), FilmId(11))]));
    }

    #[test]
    fn test_films_and_cast_listings() {
        let (_dir, store) = open();
        seed(&store, &[1, 2], &[(10, "2000", 0.0), (11, "2010", 0.0)]);
        store
            .create_appearances_bulk(&[appear(1, 10, 2), appear(1, 11, 0), appear(2, 11, 1)])
            .unwrap();

        let films: Vec<FilmId> = store
            .films_of(PersonId(1))
            .unwrap()
            .into_iter()
            .map(|(film, _)| film.id)
            .collect();
        assert_eq!(films, vec![FilmId(11), FilmId(10)]);

        let cast: Vec<(PersonId, i64)> = store
            .cast_of(FilmId(11))
            .unwrap()
            .into_iter()
            .map(|(person, appearance)| (person.id, appearance.billing_order))
            .collect();
        assert_eq!(cast, vec![(PersonId(1), 0), (PersonId(2), 1)]);
    }
}
