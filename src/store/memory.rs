//! In-process feature store

use crate::data::upsert_by_timestamp;
use crate::error::{ForecastError, Result};
use super::FeatureStore;
use parking_lot::Mutex;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Tables held in memory; counts reads so callers can assert on access
#[derive(Debug, Default)]
pub struct InMemoryFeatureStore {
    tables: Mutex<HashMap<(String, u32), DataFrame>>,
    reads: AtomicUsize,
}

impl InMemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `read` calls so far, failed ones included
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FeatureStore for InMemoryFeatureStore {
    fn read(&self, name: &str, version: u32) -> Result<DataFrame> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .get(&(name.to_string(), version))
            .cloned()
            .ok_or_else(|| ForecastError::TableNotFound { name: name.to_string(), version })
    }

    fn write(&self, name: &str, version: u32, rows: &DataFrame) -> Result<usize> {
        let mut tables = self.tables.lock();
        let key = (name.to_string(), version);
        let merged = upsert_by_timestamp(tables.get(&key), rows)?;
        let height = merged.height();
        tables.insert(key, merged);
        Ok(height)
    }

    fn exists(&self, name: &str, version: u32) -> bool {
        self.tables.lock().contains_key(&(name.to_string(), version))
    }
}
