//! Core data types for air-quality observations

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format for timestamps produced by the service (ISO-8601, no offset)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Canonical identifier of a supported city
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityKey {
    Cdmx,
    La,
}

impl CityKey {
    pub const ALL: [CityKey; 2] = [CityKey::Cdmx, CityKey::La];

    pub fn as_str(&self) -> &'static str {
        match self {
            CityKey::Cdmx => "cdmx",
            CityKey::La => "la",
        }
    }

    /// Upper-case name used in prediction payloads
    pub fn display_name(&self) -> &'static str {
        match self {
            CityKey::Cdmx => "CDMX",
            CityKey::La => "LA",
        }
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row as read from a dataset source, fields kept as text
///
/// Numeric parsing is deferred so a malformed row only affects the
/// operation that reads it. `None` means the column does not exist in the
/// source; a blank cell is `Some("")` and fails to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRecord {
    pub timestamp: String,

    pub pm25: Option<String>,

    #[serde(rename = "temperature_2m")]
    pub temperature: Option<String>,

    #[serde(rename = "relativehumidity_2m")]
    pub relative_humidity: Option<String>,

    #[serde(rename = "pressure_msl")]
    pub pressure: Option<String>,

    #[serde(rename = "windspeed_10m")]
    pub wind_speed: Option<String>,

    #[serde(rename = "winddirection_10m")]
    pub wind_direction: Option<String>,
}

/// Reason a raw row could not be turned into a [`Record`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("unparseable timestamp {0:?}")]
    Timestamp(String),

    #[error("field {field} is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },
}

/// One validated timestamped observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Timestamp text as it appeared in the source
    pub timestamp: String,

    #[serde(skip)]
    pub observed_at: NaiveDateTime,

    pub pm25: f64,

    #[serde(rename = "temperature_2m")]
    pub temperature: f64,

    #[serde(rename = "relativehumidity_2m")]
    pub relative_humidity: f64,

    #[serde(rename = "pressure_msl")]
    pub pressure: f64,

    #[serde(rename = "windspeed_10m")]
    pub wind_speed: f64,

    #[serde(rename = "winddirection_10m")]
    pub wind_direction: f64,
}

impl Record {
    /// Validate a raw row. Columns absent from the source read as 0.
    pub fn parse(raw: &RawRecord) -> Result<Self, FieldError> {
        let observed_at = parse_timestamp(&raw.timestamp)
            .ok_or_else(|| FieldError::Timestamp(raw.timestamp.clone()))?;

        Ok(Self {
            timestamp: raw.timestamp.clone(),
            observed_at,
            pm25: numeric("pm25", raw.pm25.as_deref())?,
            temperature: numeric("temperature_2m", raw.temperature.as_deref())?,
            relative_humidity: numeric("relativehumidity_2m", raw.relative_humidity.as_deref())?,
            pressure: numeric("pressure_msl", raw.pressure.as_deref())?,
            wind_speed: numeric("windspeed_10m", raw.wind_speed.as_deref())?,
            wind_direction: numeric("winddirection_10m", raw.wind_direction.as_deref())?,
        })
    }
}

fn numeric(field: &'static str, value: Option<&str>) -> Result<f64, FieldError> {
    match value {
        None => Ok(0.0),
        Some(text) => text.trim().parse::<f64>().map_err(|_| FieldError::NotNumeric {
            field,
            value: text.to_string(),
        }),
    }
}

/// Parse the timestamp shapes found in the city datasets
///
/// Accepts RFC 3339 (offset dropped, wall-clock kept), `T`- or space-separated
/// date-times with optional seconds and fraction, and bare dates.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Round half away from zero to `places` decimal places
pub fn round_dp(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
