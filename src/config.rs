//! Process configuration loaded from environment variables.
//!
//! | Variable                          | Default                                 | Description                        |
//! |-----------------------------------|-----------------------------------------|------------------------------------|
//! | `TMDB_API_KEY`                    | (none)                                  | Catalog bearer token               |
//! | `TMDB_BASE_URL`                   | `https://api.themoviedb.org/3`          | Catalog REST base URL              |
//! | `TMDB_IMAGE_BASE_URL`             | `https://image.tmdb.org/t/p/original`   | Prefix for image paths             |
//! | `CASTLINK_DB`                     | `castlink.db`                           | SQLite database file               |
//! | `CASTLINK_MAX_BILLING_ORDER`      | `15`                                    | Relevance threshold (inclusive)    |
//! | `CASTLINK_MAX_FILMS`              | `150`                                   | Most recent films kept per person  |
//! | `CASTLINK_MAX_CONCURRENT_FETCHES` | `8`                                     | Cast fetches in flight             |
//! | `CASTLINK_CHUNK_SIZE`             | `40`                                    | Films per fetch chunk              |
//! | `CASTLINK_CHUNK_PAUSE_MS`         | `250`                                   | Pause between chunks               |
//! | `CASTLINK_RETRY_ATTEMPTS`         | `3`                                     | Attempts per catalog call          |
//! | `CASTLINK_RETRY_BASE_MS`          | `500`                                   | First backoff delay                |
//! | `CASTLINK_HTTP_TIMEOUT_SECS`      | `15`                                    | Catalog request timeout            |
//!
//! A variable that is set but does not parse is an error, never a silent
//! fallback to the default.

use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::TmdbConfig;
use crate::ingest::{self, IngestConfig, RetryPolicy};
use crate::store::DEFAULT_MAX_BILLING_ORDER;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/original";
pub const DEFAULT_DB_PATH: &str = "castlink.db";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Runtime configuration for the castlink process
#[derive(Debug, Clone)]
pub struct Config {
    /// Catalog bearer token; only needed by commands that call the catalog
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_base_url: String,
    pub db_path: PathBuf,
    pub max_billing_order: i64,
    pub http_timeout_secs: u64,
    pub ingest: IngestConfig,
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key → value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = IngestConfig::default();
        let retry_defaults = RetryPolicy::default();

        let retry = RetryPolicy {
            max_attempts: parse_var(
                &lookup,
                "CASTLINK_RETRY_ATTEMPTS",
                retry_defaults.max_attempts,
            )?,
            base_delay: Duration::from_millis(parse_var(
                &lookup,
                "CASTLINK_RETRY_BASE_MS",
                retry_defaults.base_delay.as_millis() as u64,
            )?),
            multiplier: retry_defaults.multiplier,
        };

        let ingest = IngestConfig {
            max_films: parse_var(&lookup, "CASTLINK_MAX_FILMS", defaults.max_films)?,
            max_concurrent_fetches: parse_var(
                &lookup,
                "CASTLINK_MAX_CONCURRENT_FETCHES",
                defaults.max_concurrent_fetches,
            )?,
            chunk_size: parse_var(&lookup, "CASTLINK_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_pause: Duration::from_millis(parse_var(
                &lookup,
                "CASTLINK_CHUNK_PAUSE_MS",
                ingest::DEFAULT_CHUNK_PAUSE.as_millis() as u64,
            )?),
            retry,
        };

        if ingest.max_concurrent_fetches == 0 {
            anyhow::bail!("CASTLINK_MAX_CONCURRENT_FETCHES must be at least 1");
        }
        if ingest.chunk_size == 0 {
            anyhow::bail!("CASTLINK_CHUNK_SIZE must be at least 1");
        }

        Ok(Self {
            api_key: lookup("TMDB_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: lookup("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            image_base_url: lookup("TMDB_IMAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
            db_path: lookup("CASTLINK_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            max_billing_order: parse_var(
                &lookup,
                "CASTLINK_MAX_BILLING_ORDER",
                DEFAULT_MAX_BILLING_ORDER,
            )?,
            http_timeout_secs: parse_var(
                &lookup,
                "CASTLINK_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            ingest,
        })
    }

    /// Catalog client settings; fails without an API key
    pub fn tmdb(&self) -> Result<TmdbConfig> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("TMDB_API_KEY is not set"))?;
        Ok(TmdbConfig {
            api_key,
            base_url: self.base_url.clone(),
            image_base_url: self.image_base_url.clone(),
            timeout_secs: self.http_timeout_secs,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: '{}' ({})", key, raw, e)),
    }
}
