//! Persistent store for persons, films and appearances
//!
//! SQLite is the source of truth for everything the engine knows. Each
//! operation opens its own rusqlite connection to the database file, so a
//! `CastStore` is cheap to clone and can be shared across threads and
//! processes; concurrent writers converge through SQLite's locking and the
//! uniqueness constraints on `persons.id`, `films.id` and
//! `appearances(person_id, film_id)`.
//!
//! Every bulk insert is `INSERT OR IGNORE`. A duplicate row is never an
//! error, it is simply not counted as written.

mod appearances;
mod films;
mod persons;

use anyhow::Result;
use rusqlite::params_from_iter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest billing order that still counts as a relevant appearance
pub const DEFAULT_MAX_BILLING_ORDER: i64 = 15;

/// SQLite caps bound parameters per statement; id batches are split below it.
const MAX_IDS_PER_QUERY: usize = 500;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A failed store operation, tagged so callers can tell it from other failures
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StoreError(#[from] anyhow::Error);

/// Row totals reported by `castlink status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub persons: usize,
    pub expanded_persons: usize,
    pub films: usize,
    pub cast_saved_films: usize,
    pub appearances: usize,
}

/// Handle to the SQLite database file
#[derive(Debug, Clone)]
pub struct CastStore {
    db_path: PathBuf,
    max_billing_order: i64,
}

impl CastStore {
    /// Open (and create if needed) the store at `db_path`
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let store = Self {
            db_path: db_path.as_ref().to_path_buf(),
            max_billing_order: DEFAULT_MAX_BILLING_ORDER,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Use a different relevance threshold for neighbour queries
    pub fn with_max_billing_order(mut self, max_billing_order: i64) -> Self {
        self.max_billing_order = max_billing_order;
        self
    }

    pub fn max_billing_order(&self) -> i64 {
        self.max_billing_order
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get a connection to the database.
    pub fn connect(&self) -> Result<rusqlite::Connection> {
        let conn = rusqlite::Connection::open(&self.db_path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", self.db_path.display(), e))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| anyhow::anyhow!("Failed to set busy timeout: {}", e))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| anyhow::anyhow!("Failed to enable foreign keys: {}", e))?;
        Ok(conn)
    }

    /// Ensure the three tables and their indexes exist.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;

        // journal_mode answers with a row, so it cannot go through execute()
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))
            .map_err(|e| anyhow::anyhow!("Failed to enable WAL: {}", e))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS persons (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                image TEXT,
                popularity REAL NOT NULL DEFAULT 0.0,
                fully_expanded INTEGER NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_persons_name ON persons(name);
            CREATE INDEX IF NOT EXISTS idx_persons_popularity ON persons(popularity);
            CREATE INDEX IF NOT EXISTS idx_persons_expanded ON persons(fully_expanded);

            CREATE TABLE IF NOT EXISTS films (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                release_date TEXT NOT NULL DEFAULT '',
                release_key TEXT,
                poster TEXT,
                rating REAL NOT NULL DEFAULT 0.0,
                cast_fully_saved INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_films_release_key ON films(release_key);
            CREATE INDEX IF NOT EXISTS idx_films_rating ON films(rating);
            CREATE INDEX IF NOT EXISTS idx_films_cast_saved ON films(cast_fully_saved);

            CREATE TABLE IF NOT EXISTS appearances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                person_id INTEGER NOT NULL REFERENCES persons(id),
                film_id INTEGER NOT NULL REFERENCES films(id),
                character TEXT NOT NULL DEFAULT '',
                billing_order INTEGER NOT NULL DEFAULT 0,
                UNIQUE(person_id, film_id)
            );
            CREATE INDEX IF NOT EXISTS idx_appearances_person ON appearances(person_id);
            CREATE INDEX IF NOT EXISTS idx_appearances_film_order
                ON appearances(film_id, billing_order);",
        )
        .map_err(|e| anyhow::anyhow!("Failed to create schema: {}", e))?;

        Ok(())
    }

    /// Row totals for every table
    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.connect()?;
        let count = |sql: &str| -> Result<usize> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
                .map_err(|e| anyhow::anyhow!("Failed to count rows: {}", e))
        };

        Ok(StoreCounts {
            persons: count("SELECT COUNT(*) FROM persons")?,
            expanded_persons: count("SELECT COUNT(*) FROM persons WHERE fully_expanded = 1")?,
            films: count("SELECT COUNT(*) FROM films")?,
            cast_saved_films: count("SELECT COUNT(*) FROM films WHERE cast_fully_saved = 1")?,
            appearances: count("SELECT COUNT(*) FROM appearances")?,
        })
    }
}

/// Run `query` (which must contain a single `{ids}` placeholder) once per
/// slice of at most `MAX_IDS_PER_QUERY` ids and collect every row.
fn query_id_batches<T, F>(
    conn: &rusqlite::Connection,
    query: &str,
    ids: &[i64],
    leading: &[i64],
    mut map_row: F,
) -> Result<Vec<T>>
where
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let mut rows = Vec::new();
    for batch in ids.chunks(MAX_IDS_PER_QUERY) {
        let offset = leading.len();
        let placeholders = (0..batch.len())
            .map(|i| format!("?{}", offset + i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = query.replace("{ids}", &placeholders);

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| anyhow::anyhow!("Failed to prepare batch query: {}", e))?;
        let values = leading.iter().chain(batch.iter());
        let mapped = stmt
            .query_map(params_from_iter(values), |row| map_row(row))
            .map_err(|e| anyhow::anyhow!("Failed to run batch query: {}", e))?;
        for row in mapped {
            rows.push(row.map_err(|e| anyhow::anyhow!("Failed to read row: {}", e))?);
        }
    }
    Ok(rows)
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
