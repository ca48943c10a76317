//! Conversions between typed rows and polars tables
//!
//! Every table in the pipeline has a `timestamp` key column (ISO-8601 text,
//! naive UTC) and numeric value columns. Values are read back as `f64`
//! whatever dtype the CSV reader inferred.

use crate::error::{ForecastError, Result};
use super::reading::{Reading, AQI_COLUMN, POLLUTANT_COLUMNS};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::warn;

/// Key column shared by every table
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Older raw files name the key column `datetime`; Open-Meteo calls it `time`
const TIMESTAMP_ALIASES: [&str; 3] = [TIMESTAMP_COLUMN, "datetime", "time"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ACCEPTED_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Format a timestamp the way tables store it
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored or upstream timestamp
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for fmt in ACCEPTED_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(ts.naive_utc());
    }
    Err(ForecastError::Data(format!("Unparseable timestamp: '{}'", s)))
}

fn timestamp_column_name(df: &DataFrame) -> Result<&'static str> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    TIMESTAMP_ALIASES
        .iter()
        .copied()
        .find(|alias| names.iter().any(|n| n == alias))
        .ok_or_else(|| ForecastError::Data(format!("Missing '{}' column", TIMESTAMP_COLUMN)))
}

/// Read the key column as timestamps
pub fn timestamps(df: &DataFrame) -> Result<Vec<NaiveDateTime>> {
    let name = timestamp_column_name(df)?;
    let column = df.column(name)?.cast(&DataType::String)?;
    column
        .str()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| match v {
            Some(s) => parse_timestamp(s),
            None => Err(ForecastError::Data(format!("Null timestamp at row {}", i))),
        })
        .collect()
}

/// Read a numeric column, keeping nulls
pub fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| ForecastError::Data(format!("Column not found: {}", name)))?;
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Names of every non-key column, in table order
pub fn value_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .filter(|name| !TIMESTAMP_ALIASES.contains(&name.as_str()))
        .collect()
}

/// Build a table from a key column and named value columns
pub fn build_frame(
    keys: &[NaiveDateTime],
    columns: &[(String, Vec<Option<f64>>)],
) -> Result<DataFrame> {
    let mut out: Vec<Column> = Vec::with_capacity(columns.len() + 1);
    let key_text: Vec<String> = keys.iter().map(format_timestamp).collect();
    out.push(Series::new(TIMESTAMP_COLUMN.into(), key_text).into());

    for (name, values) in columns {
        if values.len() != keys.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} rows in column {}", keys.len(), name),
                actual: format!("{} rows", values.len()),
            });
        }
        out.push(Series::new(name.as_str().into(), values.as_slice()).into());
    }

    Ok(DataFrame::new(out)?)
}

/// Merge `incoming` into `existing`, keyed by timestamp.
///
/// Incoming rows replace existing rows with the same timestamp; the result is
/// sorted by timestamp and has `incoming`'s column order. Both tables must
/// carry the same set of value columns.
pub fn upsert_by_timestamp(existing: Option<&DataFrame>, incoming: &DataFrame) -> Result<DataFrame> {
    let columns = value_columns(incoming);
    let mut rows: BTreeMap<NaiveDateTime, Vec<Option<f64>>> = BTreeMap::new();

    if let Some(existing) = existing {
        let mut existing_cols = value_columns(existing);
        let mut incoming_cols = columns.clone();
        existing_cols.sort();
        incoming_cols.sort();
        if existing_cols != incoming_cols {
            return Err(ForecastError::Validation(format!(
                "Schema mismatch on upsert: stored [{}], incoming [{}]",
                existing_cols.join(", "),
                incoming_cols.join(", ")
            )));
        }
        collect_rows(existing, &columns, &mut rows)?;
    }
    collect_rows(incoming, &columns, &mut rows)?;

    let keys: Vec<NaiveDateTime> = rows.keys().copied().collect();
    let merged: Vec<(String, Vec<Option<f64>>)> = columns
        .iter()
        .enumerate()
        .map(|(j, name)| (name.clone(), rows.values().map(|row| row[j]).collect()))
        .collect();

    build_frame(&keys, &merged)
}

fn collect_rows(
    df: &DataFrame,
    columns: &[String],
    rows: &mut BTreeMap<NaiveDateTime, Vec<Option<f64>>>,
) -> Result<()> {
    let keys = timestamps(df)?;
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| f64_column(df, c))
        .collect::<Result<_>>()?;

    for (i, key) in keys.into_iter().enumerate() {
        rows.insert(key, data.iter().map(|col| col[i]).collect());
    }
    Ok(())
}

/// Raw readings → table with columns `timestamp, aqi, pm25, pm10, no2, so2, co`
pub fn readings_to_frame(readings: &[Reading]) -> Result<DataFrame> {
    let keys: Vec<NaiveDateTime> = readings.iter().map(|r| r.timestamp).collect();
    let mut columns = vec![(
        AQI_COLUMN.to_string(),
        readings.iter().map(|r| Some(r.aqi)).collect::<Vec<_>>(),
    )];
    for (j, name) in POLLUTANT_COLUMNS.iter().enumerate() {
        columns.push((
            name.to_string(),
            readings.iter().map(|r| r.pollutants()[j]).collect(),
        ));
    }
    build_frame(&keys, &columns)
}

/// Table → raw readings. Rows without an AQI value are skipped.
pub fn frame_to_readings(df: &DataFrame) -> Result<Vec<Reading>> {
    let keys = timestamps(df)?;
    let aqi = f64_column(df, AQI_COLUMN)?;
    let present = value_columns(df);
    let pollutants: Vec<Vec<Option<f64>>> = POLLUTANT_COLUMNS
        .iter()
        .map(|name| {
            if present.iter().any(|c| c == name) {
                f64_column(df, name)
            } else {
                Ok(vec![None; keys.len()])
            }
        })
        .collect::<Result<_>>()?;

    let mut readings = Vec::with_capacity(keys.len());
    let mut skipped = 0usize;
    for (i, ts) in keys.into_iter().enumerate() {
        match aqi[i] {
            Some(value) => readings.push(Reading::new(ts, value).with_pollutants([
                pollutants[0][i],
                pollutants[1][i],
                pollutants[2][i],
                pollutants[3][i],
                pollutants[4][i],
            ])),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "Raw rows without AQI skipped");
    }
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = at(13);
        assert_eq!(parse_timestamp("2024-05-10T13:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-10T13:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-10 13:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-10 13:00:00.000000").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-10T13:00:00Z").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_readings_frame_round_trip_keeps_nulls() {
        let readings = vec![
            Reading::new(at(0), 90.0).with_pollutants([Some(60.0), None, Some(12.0), None, Some(300.0)]),
            Reading::new(at(1), 95.0),
        ];
        let df = readings_to_frame(&readings).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            value_columns(&df),
            vec!["aqi", "pm25", "pm10", "no2", "so2", "co"]
        );

        let back = frame_to_readings(&df).unwrap();
        assert_eq!(back, readings);
    }

    #[test]
    fn test_frame_to_readings_skips_missing_aqi() {
        let df = build_frame(
            &[at(0), at(1)],
            &[("aqi".to_string(), vec![None, Some(40.0)])],
        )
        .unwrap();
        let readings = frame_to_readings(&df).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].aqi, 40.0);
        assert_eq!(readings[0].pm25, None);
    }

    #[test]
    fn test_upsert_replaces_and_sorts() {
        let existing = build_frame(
            &[at(2), at(0)],
            &[("aqi".to_string(), vec![Some(2.0), Some(0.0)])],
        )
        .unwrap();
        let incoming = build_frame(
            &[at(1), at(2)],
            &[("aqi".to_string(), vec![Some(1.0), Some(20.0)])],
        )
        .unwrap();

        let merged = upsert_by_timestamp(Some(&existing), &incoming).unwrap();
        assert_eq!(timestamps(&merged).unwrap(), vec![at(0), at(1), at(2)]);
        assert_eq!(
            f64_column(&merged, "aqi").unwrap(),
            vec![Some(0.0), Some(1.0), Some(20.0)]
        );
    }

    #[test]
    fn test_upsert_rejects_schema_change() {
        let existing = build_frame(&[at(0)], &[("aqi".to_string(), vec![Some(1.0)])]).unwrap();
        let incoming = build_frame(&[at(1)], &[("pm25".to_string(), vec![Some(1.0)])]).unwrap();
        let err = upsert_by_timestamp(Some(&existing), &incoming).unwrap_err();
        assert!(matches!(err, ForecastError::Validation(_)));
    }
}
