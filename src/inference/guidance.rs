//! Health guidance for forecast AQI values

use serde::{Deserialize, Serialize};
use std::fmt;

/// AQI band, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Band for a single AQI value; lower bounds are inclusive
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi >= 300.0 {
            AqiCategory::Hazardous
        } else if aqi >= 200.0 {
            AqiCategory::VeryUnhealthy
        } else if aqi >= 150.0 {
            AqiCategory::Unhealthy
        } else if aqi >= 100.0 {
            AqiCategory::Moderate
        } else {
            AqiCategory::Good
        }
    }

    /// Band of the worst value in a forecast
    pub fn for_forecast(values: &[f64]) -> Self {
        Self::from_aqi(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Air quality is satisfactory. A good time for outdoor activities.",
            AqiCategory::Moderate => {
                "Air quality is acceptable; sensitive individuals should watch for coughing or shortness of breath."
            }
            AqiCategory::Unhealthy => {
                "Sensitive groups (children, elderly) should avoid outdoor exertion. Everyone else should limit time outside."
            }
            AqiCategory::VeryUnhealthy => "Significant health risk. Stay indoors and keep windows closed.",
            AqiCategory::Hazardous => {
                "Serious risk for everyone. Avoid all outdoor activity and wear an N95 mask if travel is necessary."
            }
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(AqiCategory::from_aqi(99.9), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(100.0), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_aqi(150.0), AqiCategory::Unhealthy);
        assert_eq!(AqiCategory::from_aqi(200.0), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_aqi(300.0), AqiCategory::Hazardous);
    }

    #[test]
    fn test_forecast_uses_worst_horizon() {
        assert_eq!(AqiCategory::for_forecast(&[80.0, 210.0, 120.0]), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::for_forecast(&[10.0, 20.0, 30.0]).to_string(), "Good");
    }
}
