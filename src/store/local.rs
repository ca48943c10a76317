//! CSV-backed feature store

use crate::data::upsert_by_timestamp;
use crate::error::{ForecastError, Result};
use super::FeatureStore;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One CSV file per table: `<base_dir>/<name>_v<version>.csv`
#[derive(Debug, Clone)]
pub struct LocalFeatureStore {
    base_dir: PathBuf,
}

impl LocalFeatureStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn table_path(&self, name: &str, version: u32) -> PathBuf {
        self.base_dir.join(format!("{}_v{}.csv", name, version))
    }
}

impl FeatureStore for LocalFeatureStore {
    fn read(&self, name: &str, version: u32) -> Result<DataFrame> {
        let path = self.table_path(name, version);
        if !path.exists() {
            return Err(ForecastError::TableNotFound { name: name.to_string(), version });
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .try_into_reader_with_file_path(Some(path.clone()))?
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), "Read table");
        Ok(df)
    }

    fn write(&self, name: &str, version: u32, rows: &DataFrame) -> Result<usize> {
        let existing = if self.exists(name, version) {
            Some(self.read(name, version)?)
        } else {
            None
        };
        let mut merged = upsert_by_timestamp(existing.as_ref(), rows)?;

        fs::create_dir_all(&self.base_dir)?;
        let path = self.table_path(name, version);
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut merged)?;

        debug!(path = %path.display(), incoming = rows.height(), total = merged.height(), "Wrote table");
        Ok(merged.height())
    }

    fn exists(&self, name: &str, version: u32) -> bool {
        self.table_path(name, version).is_file()
    }
}
