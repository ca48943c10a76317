//! Offset lookups over a time-sorted AQI series
//!
//! Rolling means, differences and forward shifts are all "value `k` steps away
//! from row `i`". How a step is measured is the only thing that changes
//! between row-index and wall-clock semantics.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How window offsets are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindowSemantics {
    /// One step = one row. Gaps in the series stretch the horizons.
    #[default]
    RowIndex,
    /// One step = `step_minutes` of elapsed time. A value is defined only when
    /// a reading exists exactly at the offset timestamp.
    WallClock { step_minutes: u32 },
}

impl WindowSemantics {
    /// Hourly wall-clock steps
    pub fn hourly() -> Self {
        WindowSemantics::WallClock { step_minutes: 60 }
    }
}

/// Resolves `value(i + offset)` under a given [`WindowSemantics`]
pub(crate) struct OffsetResolver<'a> {
    timestamps: &'a [NaiveDateTime],
    values: &'a [f64],
    by_time: Option<(HashMap<NaiveDateTime, usize>, Duration)>,
}

impl<'a> OffsetResolver<'a> {
    /// `timestamps` must be sorted ascending and aligned with `values`
    pub(crate) fn new(
        timestamps: &'a [NaiveDateTime],
        values: &'a [f64],
        semantics: WindowSemantics,
    ) -> Self {
        let by_time = match semantics {
            WindowSemantics::RowIndex => None,
            WindowSemantics::WallClock { step_minutes } => {
                // Later rows win on duplicate timestamps
                let index: HashMap<NaiveDateTime, usize> = timestamps
                    .iter()
                    .enumerate()
                    .map(|(i, ts)| (*ts, i))
                    .collect();
                Some((index, Duration::minutes(i64::from(step_minutes))))
            }
        };
        Self { timestamps, values, by_time }
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    /// Value `offset` steps away from row `i`, if it exists
    pub(crate) fn at(&self, i: usize, offset: i64) -> Option<f64> {
        match &self.by_time {
            None => {
                let j = i as i64 + offset;
                if j < 0 || j >= self.values.len() as i64 {
                    None
                } else {
                    Some(self.values[j as usize])
                }
            }
            Some((index, step)) => {
                let target = self.timestamps[i] + *step * offset as i32;
                index.get(&target).map(|&j| self.values[j])
            }
        }
    }

    /// `value(i) - value(i - lag)`
    pub(crate) fn diff(&self, i: usize, lag: i64) -> Option<f64> {
        Some(self.at(i, 0)? - self.at(i, -lag)?)
    }

    /// Mean of the `window` values ending at row `i`; undefined unless all exist
    pub(crate) fn trailing_mean(&self, i: usize, window: usize) -> Option<f64> {
        let mut sum = 0.0;
        for k in 0..window as i64 {
            sum += self.at(i, -k)?;
        }
        Some(sum / window as f64)
    }

    /// Value `horizon` steps ahead of row `i`
    pub(crate) fn lead(&self, i: usize, horizon: usize) -> Option<f64> {
        self.at(i, horizon as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hours(hs: &[u32]) -> Vec<NaiveDateTime> {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        hs.iter().map(|&h| day.and_hms_opt(h, 0, 0).unwrap()).collect()
    }

    #[test]
    fn test_row_index_offsets() {
        let ts = hours(&[0, 1, 2, 3]);
        let values = [10.0, 20.0, 30.0, 40.0];
        let r = OffsetResolver::new(&ts, &values, WindowSemantics::RowIndex);

        assert_eq!(r.diff(0, 1), None);
        assert_eq!(r.diff(1, 1), Some(10.0));
        assert_eq!(r.trailing_mean(1, 3), None);
        assert_eq!(r.trailing_mean(2, 3), Some(20.0));
        assert_eq!(r.lead(2, 1), Some(40.0));
        assert_eq!(r.lead(3, 1), None);
    }

    #[test]
    fn test_wall_clock_respects_gaps() {
        // Hour 2 is missing
        let ts = hours(&[0, 1, 3, 4]);
        let values = [10.0, 20.0, 40.0, 50.0];
        let r = OffsetResolver::new(&ts, &values, WindowSemantics::hourly());

        // Row 2 (hour 3) has no reading one hour earlier
        assert_eq!(r.diff(2, 1), None);
        assert_eq!(r.diff(3, 1), Some(10.0));
        // Hour 1 + 1h does not exist, so no 1h target
        assert_eq!(r.lead(1, 1), None);
        assert_eq!(r.lead(0, 1), Some(20.0));

        // Row-index semantics bridge the same gap
        let by_row = OffsetResolver::new(&ts, &values, WindowSemantics::RowIndex);
        assert_eq!(by_row.lead(1, 1), Some(40.0));
    }
}
