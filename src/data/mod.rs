//! Data model and table conversions
//!
//! - [`Reading`]: one raw, timestamped pollutant sample
//! - table helpers: typed rows ⇄ polars `DataFrame`, timestamp-keyed upsert

mod reading;
pub mod table;

pub use reading::{sort_by_timestamp, Reading, AQI_COLUMN, POLLUTANT_COLUMNS};
pub use table::{
    build_frame, f64_column, format_timestamp, frame_to_readings, parse_timestamp,
    readings_to_frame, timestamps, upsert_by_timestamp, value_columns, TIMESTAMP_COLUMN,
};
