//! Film rows

use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use std::collections::HashSet;

use super::{query_id_batches, CastStore};
use crate::model::{release_sort_key, Film, FilmId, NewFilm};

pub(super) const FILM_COLUMNS: &str =
    "f.id, f.title, f.release_date, f.poster, f.rating, f.cast_fully_saved";

/// "Most recent first"; undated films last, ties on the larger id
pub(super) const RECENCY_ORDER: &str = "f.release_key IS NULL, f.release_key DESC, f.id DESC";

pub(super) fn film_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Film> {
    Ok(Film {
        id: FilmId(row.get(0)?),
        title: row.get(1)?,
        release_date: row.get(2)?,
        poster: row.get(3)?,
        rating: row.get(4)?,
        cast_fully_saved: row.get::<_, i64>(5)? != 0,
    })
}

impl CastStore {
    /// Look up a film by id
    pub fn get_film(&self, id: FilmId) -> Result<Option<Film>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {} FROM films f WHERE f.id = ?1", FILM_COLUMNS),
            params![id.0],
            film_from_row,
        )
        .optional()
        .map_err(|e| anyhow::anyhow!("Failed to query film {}: {}", id, e))
    }

    /// Which of `ids` already have a row
    pub fn existing_film_ids(&self, ids: &[FilmId]) -> Result<HashSet<FilmId>> {
        let conn = self.connect()?;
        let raw: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let found = query_id_batches(
            &conn,
            "SELECT id FROM films WHERE id IN ({ids})",
            &raw,
            &[],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(found.into_iter().map(FilmId).collect())
    }

    /// Which of `ids` already have their full cast stored
    pub fn cast_saved_film_ids(&self, ids: &[FilmId]) -> Result<HashSet<FilmId>> {
        let conn = self.connect()?;
        let raw: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let found = query_id_batches(
            &conn,
            "SELECT id FROM films WHERE cast_fully_saved = 1 AND id IN ({ids})",
            &raw,
            &[],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(found.into_iter().map(FilmId).collect())
    }

    /// Insert many films in one transaction, ignoring ids already present
    ///
    /// Returns the number of rows actually written.
    pub fn create_films_bulk(&self, films: &[NewFilm]) -> Result<usize> {
        if films.is_empty() {
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
                    "INSERT OR IGNORE INTO films
                        (id, title, release_date, release_key, poster, rating, cast_fully_saved)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                )
                .map_err(|e| anyhow::anyhow!("Failed to prepare film insert: {}", e))?;
            for film in films {
                written += stmt
                    .execute(params![
                        film.id.0,
                        film.title,
                        film.release_date,
                        release_sort_key(&film.release_date),
                        film.poster,
                        film.rating,
                    ])
                    .map_err(|e| anyhow::anyhow!("Failed to insert film {}: {}", film.id, e))?;
            }
        }

        tx.commit()
            .map_err(|e| anyhow::anyhow!("Failed to commit transaction: {}", e))?;
        Ok(written)
    }

    /// Set `cast_fully_saved` for every id in the batch
    pub fn mark_cast_saved(&self, ids: &[FilmId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.connect()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| anyhow::anyhow!("Failed to start transaction: {}", e))?;

        let mut updated = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "UPDATE films SET cast_fully_saved = 1
                     WHERE id = ?1 AND cast_fully_saved = 0",
                )
                .map_err(|e| anyhow::anyhow!("Failed to prepare film update: {}", e))?;
            for id in ids {
                updated += stmt
                    .execute(params![id.0])
                    .map_err(|e| anyhow::anyhow!("Failed to update film {}: {}", id, e))?;
            }
        }

        tx.commit()
            .map_err(|e| anyhow::anyhow!("Failed to commit transaction: {}", e))?;
        Ok(updated)
    }
}
