//! Rating table store with a load-once cache
//!
//! Tables are read from `<tables_dir>/<name>.csv` on first use and shared as
//! `Arc<RatingTable>` afterwards. The store is `Sync`, so concurrent pipeline
//! runs can price against the same loaded tables without copying them.

use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::RatingTable;
use crate::error::Result;

/// Default directory holding rating table files
pub const DEFAULT_TABLES_DIR: &str = "data/tables";

/// Strip an optional `.csv` suffix so `area_base` and `area_base.csv` share a cache slot
fn table_key(name: &str) -> &str {
    name.strip_suffix(".csv").unwrap_or(name)
}

#[derive(Debug)]
pub struct RatingTableStore {
    tables_dir: PathBuf,
    entries: RwLock<HashMap<String, Arc<RatingTable>>>,

    /// Statistics
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl RatingTableStore {
    pub fn new<P: Into<PathBuf>>(tables_dir: P) -> Self {
        Self {
            tables_dir: tables_dir.into(),
            entries: RwLock::new(HashMap::new()),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    pub fn tables_dir(&self) -> &Path {
        &self.tables_dir
    }

    /// File a table name resolves to
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.tables_dir.join(format!("{}.csv", table_key(name)))
    }

    /// Load a table by name, reusing the cached copy when present
    pub fn load(&self, name: &str) -> Result<Arc<RatingTable>> {
        let key = table_key(name);

        if let Some(table) = self.cached(key) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(table);
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let path = self.table_path(key);
        let table = Arc::new(RatingTable::from_path(key, &path)?);
        info!("Loaded rating table '{}' ({} rows) from {}", key, table.len(), path.display());

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have loaded it meanwhile; keep the first copy
        let table = entries.entry(key.to_string()).or_insert(table).clone();
        Ok(table)
    }

    /// Register an in-memory table, replacing any cached table of the same name
    pub fn insert(&self, table: RatingTable) {
        let key = table_key(&table.name).to_string();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, Arc::new(table));
    }

    fn cached(&self, key: &str) -> Option<Arc<RatingTable>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cached(table_key(name)).is_some()
    }

    /// Names of all cached tables, sorted
    pub fn cached_names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop all cached tables and reset statistics
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let hits = self.cache_hits();
        let total = hits + self.cache_misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

impl Default for RatingTableStore {
    fn default() -> Self {
        Self::new(DEFAULT_TABLES_DIR)
    }
}
