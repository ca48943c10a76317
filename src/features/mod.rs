//! Feature engineering
//!
//! Turns raw readings into the feature/target table shared by training and
//! inference:
//! - calendar decomposition (hour, day, month, weekday)
//! - first difference and trailing 3-sample mean of AQI
//! - forward-shifted AQI labels at 1, 24 and 72 steps

mod builder;
mod window;

pub use builder::{feature_rows_to_frame, FeatureBuilder, FeatureConfig, FeatureRow};
pub use window::WindowSemantics;

/// Model input columns, in the order the model sees them
pub const FEATURE_COLUMNS: [&str; 11] = [
    "pm25",
    "pm10",
    "no2",
    "so2",
    "co",
    "hour",
    "day",
    "month",
    "weekday",
    "aqi_change_rate",
    "aqi_roll_3h",
];

/// Label columns, in model output order
pub const TARGET_COLUMNS: [&str; 3] = ["target_aqi_1h", "target_aqi_24h", "target_aqi_72h"];

/// Forecast horizons in steps, aligned with [`TARGET_COLUMNS`]
pub const HORIZONS: [usize; 3] = [1, 24, 72];

/// Samples in the trailing AQI mean
pub const ROLLING_WINDOW: usize = 3;

/// Canonical feature columns as owned strings
pub fn feature_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
}

/// Canonical target columns as owned strings
pub fn target_columns() -> Vec<String> {
    TARGET_COLUMNS.iter().map(|s| s.to_string()).collect()
}
