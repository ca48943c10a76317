//! Feature/target table construction

use crate::data::{build_frame, sort_by_timestamp, Reading, AQI_COLUMN, POLLUTANT_COLUMNS};
use crate::error::Result;
use super::window::{OffsetResolver, WindowSemantics};
use super::{FEATURE_COLUMNS, HORIZONS, ROLLING_WINDOW, TARGET_COLUMNS};
use chrono::{Datelike, NaiveDateTime, Timelike};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One training/inference row derived from a window of readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: NaiveDateTime,
    pub aqi: f64,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    /// Hour of day, 0-23
    pub hour: u32,
    /// Day of month, 1-31
    pub day: u32,
    /// Month, 1-12
    pub month: u32,
    /// Day of week, Monday = 0 … Sunday = 6
    pub weekday: u32,
    pub aqi_change_rate: f64,
    pub aqi_roll_3h: f64,
    pub target_aqi_1h: f64,
    pub target_aqi_24h: f64,
    pub target_aqi_72h: f64,
}

impl FeatureRow {
    /// Feature values in [`FEATURE_COLUMNS`] order
    pub fn feature_values(&self) -> [Option<f64>; 11] {
        [
            self.pm25,
            self.pm10,
            self.no2,
            self.so2,
            self.co,
            Some(f64::from(self.hour)),
            Some(f64::from(self.day)),
            Some(f64::from(self.month)),
            Some(f64::from(self.weekday)),
            Some(self.aqi_change_rate),
            Some(self.aqi_roll_3h),
        ]
    }

    /// Labels in [`TARGET_COLUMNS`] order
    pub fn targets(&self) -> [f64; 3] {
        [self.target_aqi_1h, self.target_aqi_24h, self.target_aqi_72h]
    }
}

/// Feature builder configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// How rolling windows and horizon shifts are measured
    #[serde(default)]
    pub window: WindowSemantics,
}

/// Builds [`FeatureRow`]s from raw readings
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn with_window(mut self, window: WindowSemantics) -> Self {
        self.config.window = window;
        self
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Build feature rows. Input order does not matter; rows lacking rolling
    /// history or any horizon target are dropped.
    pub fn build(&self, readings: &[Reading]) -> Vec<FeatureRow> {
        let mut sorted = readings.to_vec();
        sort_by_timestamp(&mut sorted);

        let timestamps: Vec<NaiveDateTime> = sorted.iter().map(|r| r.timestamp).collect();
        let aqi: Vec<f64> = sorted.iter().map(|r| r.aqi).collect();
        let series = OffsetResolver::new(&timestamps, &aqi, self.config.window);

        let rows: Vec<FeatureRow> = (0..series.len())
            .filter_map(|i| self.row_at(&sorted[i], &series, i))
            .collect();

        debug!(
            readings = readings.len(),
            rows = rows.len(),
            dropped = readings.len() - rows.len(),
            "Built feature rows"
        );
        rows
    }

    /// Build feature rows as a feature-group table
    pub fn build_frame(&self, readings: &[Reading]) -> Result<DataFrame> {
        feature_rows_to_frame(&self.build(readings))
    }

    fn row_at(&self, reading: &Reading, series: &OffsetResolver<'_>, i: usize) -> Option<FeatureRow> {
        let aqi_change_rate = series.diff(i, 1)?;
        let aqi_roll_3h = series.trailing_mean(i, ROLLING_WINDOW)?;
        let [target_aqi_1h, target_aqi_24h, target_aqi_72h] = [
            series.lead(i, HORIZONS[0])?,
            series.lead(i, HORIZONS[1])?,
            series.lead(i, HORIZONS[2])?,
        ];

        let ts = reading.timestamp;
        Some(FeatureRow {
            timestamp: ts,
            aqi: reading.aqi,
            pm25: reading.pm25,
            pm10: reading.pm10,
            no2: reading.no2,
            so2: reading.so2,
            co: reading.co,
            hour: ts.hour(),
            day: ts.day(),
            month: ts.month(),
            weekday: ts.weekday().num_days_from_monday(),
            aqi_change_rate,
            aqi_roll_3h,
            target_aqi_1h,
            target_aqi_24h,
            target_aqi_72h,
        })
    }
}

/// Feature rows → table with `timestamp`, `aqi`, every feature column and
/// every target column
pub fn feature_rows_to_frame(rows: &[FeatureRow]) -> Result<DataFrame> {
    let keys: Vec<NaiveDateTime> = rows.iter().map(|r| r.timestamp).collect();

    let mut columns: Vec<(String, Vec<Option<f64>>)> =
        vec![(AQI_COLUMN.to_string(), rows.iter().map(|r| Some(r.aqi)).collect())];
    debug_assert_eq!(&FEATURE_COLUMNS[..POLLUTANT_COLUMNS.len()], &POLLUTANT_COLUMNS[..]);

    for (j, name) in FEATURE_COLUMNS.iter().enumerate() {
        columns.push((
            name.to_string(),
            rows.iter().map(|r| r.feature_values()[j]).collect(),
        ));
    }
    for (j, name) in TARGET_COLUMNS.iter().enumerate() {
        columns.push((
            name.to_string(),
            rows.iter().map(|r| Some(r.targets()[j])).collect(),
        ));
    }

    build_frame(&keys, &columns)
}
