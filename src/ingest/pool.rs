//! Bounded worker pool for catalog fetches
//!
//! A dedicated rayon pool caps how many fetches are in flight at once.
//! Keys are processed in fixed-size chunks; within a chunk every task owns
//! its result, and the per-chunk map is only assembled once all tasks in
//! the chunk have finished. A fixed pause between chunks keeps the request
//! rate under the catalog's limits.

use anyhow::Result;
use rayon::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Fan-out/fan-in executor for independent fetches
pub struct FetchPool {
    pool: rayon::ThreadPool,
    chunk_size: usize,
    chunk_pause: Duration,
}

impl FetchPool {
    pub fn new(max_concurrent: usize, chunk_size: usize, chunk_pause: Duration) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrent.max(1))
            .thread_name(|i| format!("castlink-fetch-{}", i))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build fetch pool: {}", e))?;

        Ok(Self {
            pool,
            chunk_size: chunk_size.max(1),
            chunk_pause,
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `fetch` for every key and hand each finished chunk to `sink`
    ///
    /// Chunks are delivered in key order. An error from `sink` stops
    /// processing before the next chunk is fetched.
    pub fn for_each_chunk<K, T, F, G>(&self, keys: &[K], fetch: F, mut sink: G) -> Result<()>
    where
        K: Copy + Eq + Hash + Send + Sync,
        T: Send,
        F: Fn(K) -> T + Sync,
        G: FnMut(HashMap<K, T>) -> Result<()>,
    {
        for (index, chunk) in keys.chunks(self.chunk_size).enumerate() {
            if index > 0 && !self.chunk_pause.is_zero() {
                std::thread::sleep(self.chunk_pause);
            }

            let results: HashMap<K, T> = self
                .pool
                .install(|| chunk.par_iter().map(|&key| (key, fetch(key))).collect());

            tracing::debug!(chunk = index, size = chunk.len(), "fetched chunk");
            sink(results)?;
        }
        Ok(())
    }
}
