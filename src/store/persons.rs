//! Person rows

use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use std::collections::HashSet;

use super::{now_rfc3339, query_id_batches, CastStore};
use crate::model::{NewPerson, Person, PersonId};

pub(super) fn person_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: PersonId(row.get(0)?),
        name: row.get(1)?,
        image: row.get(2)?,
        popularity: row.get(3)?,
        fully_expanded: row.get::<_, i64>(4)? != 0,
        last_updated: row.get(5)?,
    })
}

impl CastStore {
    /// Look up a person by id
    pub fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT id, name, image, popularity, fully_expanded, last_updated
             FROM persons WHERE id = ?1",
            params![id.0],
            person_from_row,
        )
        .optional()
        .map_err(|e| anyhow::anyhow!("Failed to query person {}: {}", id, e))
    }

    /// Which of `ids` already have a row
    pub fn existing_person_ids(&self, ids: &[PersonId]) -> Result<HashSet<PersonId>> {
        let conn = self.connect()?;
        let raw: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let found = query_id_batches(
            &conn,
            "SELECT id FROM persons WHERE id IN ({ids})",
            &raw,
            &[],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(found.into_iter().map(PersonId).collect())
    }

    /// Insert one person with `fully_expanded = false`
    ///
    /// Returns false when the row already existed.
    pub fn create_person(&self, person: &NewPerson) -> Result<bool> {
        Ok(self.create_persons_bulk(std::slice::from_ref(person))? == 1)
    }

    /// Insert many persons in one transaction, ignoring ids already present
    ///
    /// Returns the number of rows actually written.
    pub fn create_persons_bulk(&self, persons: &[NewPerson]) -> Result<usize> {
        if persons.is_empty() {
            return Ok(0);
        }
        let conn = self.connect()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| anyhow::anyhow!("Failed to start transaction: {}", e))?;

        let now = now_rfc3339();
        let mut written = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO persons
                        (id, name, image, popularity, fully_expanded, last_updated)
                        VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                )
                .map_err(|e| anyhow::anyhow!("Failed to prepare person insert: {}", e))?;
            for person in persons {
                written += stmt
                    .execute(params![
                        person.id.0,
                        person.name,
                        person.image,
                        person.popularity,
                        now
                    ])
                    .map_err(|e| anyhow::anyhow!("Failed to insert person {}: {}", person.id, e))?;
            }
        }

        tx.commit()
            .map_err(|e| anyhow::anyhow!("Failed to commit transaction: {}", e))?;
        Ok(written)
    }

    /// Set `fully_expanded` for every id in the batch
    pub fn mark_persons_expanded(&self, ids: &[PersonId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.connect()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| anyhow::anyhow!("Failed to start transaction: {}", e))?;

        let now = now_rfc3339();
        let mut updated = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "UPDATE persons SET fully_expanded = 1, last_updated = ?2
                     WHERE id = ?1 AND fully_expanded = 0",
                )
                .map_err(|e| anyhow::anyhow!("Failed to prepare person update: {}", e))?;
            for id in ids {
                updated += stmt
                    .execute(params![id.0, now])
                    .map_err(|e| anyhow::anyhow!("Failed to update person {}: {}", id, e))?;
            }
        }

        tx.commit()
            .map_err(|e| anyhow::anyhow!("Failed to commit transaction: {}", e))?;
        Ok(updated)
    }
}
