//! Raw sensor readings

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Pollutant columns carried from raw readings into the feature table, in order
pub const POLLUTANT_COLUMNS: [&str; 5] = ["pm25", "pm10", "no2", "so2", "co"];

/// Name of the AQI column in raw and feature tables
pub const AQI_COLUMN: &str = "aqi";

/// One timestamped row of raw sensor data.
///
/// `timestamp` is naive UTC. `aqi` is always present (it may be a proxy
/// derived from pm25 by the backfill source); pollutants may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub aqi: f64,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
}

impl Reading {
    /// Reading with only an AQI value
    pub fn new(timestamp: NaiveDateTime, aqi: f64) -> Self {
        Self {
            timestamp,
            aqi,
            pm25: None,
            pm10: None,
            no2: None,
            so2: None,
            co: None,
        }
    }

    /// Set all pollutant values at once, in [`POLLUTANT_COLUMNS`] order
    pub fn with_pollutants(mut self, values: [Option<f64>; 5]) -> Self {
        let [pm25, pm10, no2, so2, co] = values;
        self.pm25 = pm25;
        self.pm10 = pm10;
        self.no2 = no2;
        self.so2 = so2;
        self.co = co;
        self
    }

    /// Pollutant values in [`POLLUTANT_COLUMNS`] order
    pub fn pollutants(&self) -> [Option<f64>; 5] {
        [self.pm25, self.pm10, self.no2, self.so2, self.co]
    }
}

/// Sort readings by timestamp, ascending
pub fn sort_by_timestamp(readings: &mut [Reading]) {
    readings.sort_unstable_by_key(|r| r.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    #[test]
    fn test_pollutants_order() {
        let r = Reading::new(at(0), 80.0)
            .with_pollutants([Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)]);
        assert_eq!(r.pm25, Some(1.0));
        assert_eq!(r.no2, None);
        assert_eq!(r.pollutants(), [Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)]);
    }

    #[test]
    fn test_sort_by_timestamp() {
        let mut readings = vec![
            Reading::new(at(3), 3.0),
            Reading::new(at(1), 1.0),
            Reading::new(at(2), 2.0),
        ];
        sort_by_timestamp(&mut readings);
        let aqi: Vec<f64> = readings.iter().map(|r| r.aqi).collect();
        assert_eq!(aqi, vec![1.0, 2.0, 3.0]);
    }
}
