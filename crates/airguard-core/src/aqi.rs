//! PM2.5 to AQI conversion
//!
//! Piecewise-linear US EPA breakpoints. Results are truncated toward zero,
//! and a concentration sitting exactly on a breakpoint belongs to the lower
//! band.

use serde::{Serialize, Serializer};
use std::fmt;

/// Qualitative band for an AQI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AqiLevel {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
}

impl AqiLevel {
    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiLevel::Unhealthy => "Unhealthy",
            AqiLevel::VeryUnhealthy => "Very Unhealthy",
        }
    }
}

impl fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AqiLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// AQI for a PM2.5 concentration (µg/m³)
///
/// Total over all inputs: negative concentrations map mechanically through
/// the first band and NaN yields 0.
pub fn aqi_of(pm25: f64) -> i64 {
    let aqi = if pm25 <= 12.0 {
        (50.0 / 12.0) * pm25
    } else if pm25 <= 35.4 {
        50.0 + (50.0 / 23.4) * (pm25 - 12.0)
    } else if pm25 <= 55.4 {
        100.0 + (50.0 / 20.0) * (pm25 - 35.4)
    } else if pm25 <= 150.4 {
        150.0 + (100.0 / 95.0) * (pm25 - 55.4)
    } else {
        200.0 + (100.0 / 49.6) * (pm25 - 150.4)
    };
    aqi.trunc() as i64
}

/// Band for an AQI value
pub fn level_of(aqi: i64) -> AqiLevel {
    match aqi {
        i64::MIN..=50 => AqiLevel::Good,
        51..=100 => AqiLevel::Moderate,
        101..=150 => AqiLevel::UnhealthyForSensitiveGroups,
        151..=200 => AqiLevel::Unhealthy,
        _ => AqiLevel::VeryUnhealthy,
    }
}
