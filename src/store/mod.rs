//! Feature store
//!
//! Named, versioned tables keyed by `timestamp`. Writes upsert: a row whose
//! timestamp already exists replaces the stored row.

mod local;
mod memory;

pub use local::LocalFeatureStore;
pub use memory::InMemoryFeatureStore;

use crate::error::Result;
use polars::prelude::DataFrame;

/// Storage backend for raw and feature tables
pub trait FeatureStore: Send + Sync {
    /// Read a whole table. Unknown tables fail with `TableNotFound`.
    fn read(&self, name: &str, version: u32) -> Result<DataFrame>;

    /// Upsert rows by timestamp; returns the table's row count afterwards
    fn write(&self, name: &str, version: u32, rows: &DataFrame) -> Result<usize>;

    /// Whether the table exists
    fn exists(&self, name: &str, version: u32) -> bool;
}
