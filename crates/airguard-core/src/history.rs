//! Trailing history window with per-record AQI

use serde::Serialize;

use crate::{aqi_of, CityKey, CoreError, CoreResult, DatasetStore, Record};

/// Number of records served by the history endpoint (hourly data, one day)
pub const DEFAULT_HISTORY_WINDOW: usize = 24;

/// A validated record annotated with its AQI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub timestamp: String,
    pub pm25: f64,
    pub aqi: i64,
    pub temperature_2m: f64,
    pub relativehumidity_2m: f64,
    pub windspeed_10m: f64,
    pub winddirection_10m: f64,
    pub pressure_msl: f64,
}

impl From<Record> for HistoryPoint {
    fn from(record: Record) -> Self {
        Self {
            aqi: aqi_of(record.pm25),
            timestamp: record.timestamp,
            pm25: record.pm25,
            temperature_2m: record.temperature,
            relativehumidity_2m: record.relative_humidity,
            windspeed_10m: record.wind_speed,
            winddirection_10m: record.wind_direction,
            pressure_msl: record.pressure,
        }
    }
}

/// Last `window` records for a city, oldest first
///
/// Rows that fail to parse are dropped; the rest are still returned. A city
/// with no dataset, or an empty one, is [`CoreError::NoDataAvailable`].
pub fn history(store: &DatasetStore, city: CityKey, window: usize) -> CoreResult<Vec<HistoryPoint>> {
    match store.records(city) {
        Some(records) if !records.is_empty() => {}
        _ => return Err(CoreError::NoDataAvailable(city)),
    }

    let points = store
        .window(city, window)
        .iter()
        .filter_map(|raw| match Record::parse(raw) {
            Ok(record) => Some(HistoryPoint::from(record)),
            Err(e) => {
                tracing::debug!(city = %city, error = %e, "skipping malformed record");
                None
            }
        })
        .collect();

    Ok(points)
}
