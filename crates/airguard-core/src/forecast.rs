//! One-step-ahead PM2.5 forecast: latest observation plus bounded jitter

use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    aqi_of, level_of, round_dp, AqiLevel, CityKey, CoreError, CoreResult, DatasetStore, Record,
    TIMESTAMP_FORMAT,
};

/// Source of the relative perturbation applied to the latest PM2.5 value
pub trait JitterSource: Send + Sync {
    fn draw(&self) -> f64;
}

/// Uniform draw from `[-bound, bound]`, fresh per call
#[derive(Debug, Clone, Copy)]
pub struct UniformJitter {
    bound: f64,
}

impl UniformJitter {
    pub const DEFAULT_BOUND: f64 = 0.10;

    pub fn new(bound: f64) -> Self {
        Self { bound: bound.abs() }
    }
}

impl Default for UniformJitter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BOUND)
    }
}

impl JitterSource for UniformJitter {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen_range(-self.bound..=self.bound)
    }
}

/// Always returns the same perturbation
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn draw(&self) -> f64 {
        self.0
    }
}

/// How the predicted reading is stamped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Latest observation time plus 24 hours
    #[default]
    DayAhead,
    /// Instant the forecast was generated
    GeneratedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Worsening,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: String,
    pub pm25: f64,
    pub aqi: i64,
    pub level: AqiLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub pm25_delta: f64,
    pub aqi_delta: i64,
    pub trend: Trend,
}

/// Weather covariates of the observation the forecast starts from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub city: String,
    pub current: Reading,
    pub predicted: Reading,
    pub change: Change,
    pub weather: WeatherSnapshot,
    pub base_timestamp: String,
}

/// Produces [`Prediction`]s from a city's latest record
#[derive(Clone)]
pub struct Forecaster {
    jitter: Arc<dyn JitterSource>,
    policy: TimestampPolicy,
}

impl Forecaster {
    pub fn new(jitter: Arc<dyn JitterSource>, policy: TimestampPolicy) -> Self {
        Self { jitter, policy }
    }

    pub fn policy(&self) -> TimestampPolicy {
        self.policy
    }

    pub fn forecast(&self, store: &DatasetStore, city: CityKey) -> CoreResult<Prediction> {
        self.forecast_at(store, city, Utc::now().naive_utc())
    }

    /// Forecast with an explicit "now", used by [`TimestampPolicy::GeneratedAt`]
    pub fn forecast_at(
        &self,
        store: &DatasetStore,
        city: CityKey,
        now: NaiveDateTime,
    ) -> CoreResult<Prediction> {
        let latest = store.latest(city)?;
        let record =
            Record::parse(latest).map_err(|e| CoreError::Processing(format!("{city}: {e}")))?;

        let current_pm25 = record.pm25;
        let predicted_pm25 = current_pm25 * (1.0 + self.jitter.draw());
        let current_aqi = aqi_of(current_pm25);
        let predicted_aqi = aqi_of(predicted_pm25);

        let predicted_at = match self.policy {
            TimestampPolicy::DayAhead => record
                .observed_at
                .checked_add_signed(Duration::hours(24))
                .ok_or_else(|| {
                    CoreError::Processing(format!(
                        "{city}: timestamp {} out of range",
                        record.timestamp
                    ))
                })?,
            TimestampPolicy::GeneratedAt => now,
        };

        let trend = if predicted_pm25 < current_pm25 {
            Trend::Improving
        } else {
            Trend::Worsening
        };

        tracing::debug!(
            city = %city,
            current_pm25,
            predicted_pm25,
            "forecast computed"
        );

        Ok(Prediction {
            city: city.display_name().to_string(),
            current: Reading {
                timestamp: record.timestamp.clone(),
                pm25: round_dp(current_pm25, 2),
                aqi: current_aqi,
                level: level_of(current_aqi),
            },
            predicted: Reading {
                timestamp: predicted_at.format(TIMESTAMP_FORMAT).to_string(),
                pm25: round_dp(predicted_pm25, 2),
                aqi: predicted_aqi,
                level: level_of(predicted_aqi),
            },
            change: Change {
                pm25_delta: round_dp(predicted_pm25 - current_pm25, 2),
                aqi_delta: predicted_aqi - current_aqi,
                trend,
            },
            weather: WeatherSnapshot {
                temperature: round_dp(record.temperature, 1),
                humidity: round_dp(record.relative_humidity, 1),
                pressure: round_dp(record.pressure, 1),
                wind_speed: round_dp(record.wind_speed, 1),
                wind_direction: round_dp(record.wind_direction, 1),
            },
            base_timestamp: record.timestamp,
        })
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(Arc::new(UniformJitter::default()), TimestampPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawRecord;
    use chrono::NaiveDate;

    fn store_with_pm25(pm25: &str) -> DatasetStore {
        let older = RawRecord {
            timestamp: "2024-05-01T08:00:00".into(),
            pm25: Some("99".into()),
            ..Default::default()
        };
        let latest = RawRecord {
            timestamp: "2024-05-01T09:00:00".into(),
            pm25: Some(pm25.into()),
            temperature: Some("22.46".into()),
            relative_humidity: Some("61".into()),
            pressure: Some("1012.04".into()),
            wind_speed: Some("3.35".into()),
            wind_direction: Some("270".into()),
        };
        DatasetStore::builder()
            .dataset(CityKey::Cdmx, vec![older, latest])
            .build()
    }

    fn fixed(v: f64, policy: TimestampPolicy) -> Forecaster {
        Forecaster::new(Arc::new(FixedJitter(v)), policy)
    }

    #[test]
    fn test_worsening_forecast_day_ahead() {
        let store = store_with_pm25("30.0");
        let p = fixed(0.1, TimestampPolicy::DayAhead)
            .forecast(&store, CityKey::Cdmx)
            .unwrap();

        assert_eq!(p.city, "CDMX");
        assert_eq!(p.current.pm25, 30.0);
        assert_eq!(p.current.aqi, 88);
        assert_eq!(p.current.level, AqiLevel::Moderate);
        assert_eq!(p.current.timestamp, "2024-05-01T09:00:00");
        assert_eq!(p.predicted.pm25, 33.0);
        assert_eq!(p.predicted.aqi, 94);
        assert_eq!(p.predicted.timestamp, "2024-05-02T09:00:00");
        assert_eq!(p.change.pm25_delta, 3.0);
        assert_eq!(p.change.aqi_delta, 6);
        assert_eq!(p.change.trend, Trend::Worsening);
        assert_eq!(p.weather.temperature, 22.5);
        assert_eq!(p.weather.pressure, 1012.0);
        assert_eq!(p.base_timestamp, "2024-05-01T09:00:00");
    }

    #[test]
    fn test_improving_forecast() {
        let store = store_with_pm25("30.0");
        let p = fixed(-0.1, TimestampPolicy::DayAhead)
            .forecast(&store, CityKey::Cdmx)
            .unwrap();
        assert_eq!(p.predicted.pm25, 27.0);
        assert_eq!(p.predicted.aqi, 82);
        assert_eq!(p.change.aqi_delta, -6);
        assert_eq!(p.change.pm25_delta, -3.0);
        assert_eq!(p.change.trend, Trend::Improving);
    }

    #[test]
    fn test_zero_jitter_reports_worsening() {
        let store = store_with_pm25("30.0");
        let p = fixed(0.0, TimestampPolicy::DayAhead)
            .forecast(&store, CityKey::Cdmx)
            .unwrap();
        assert_eq!(p.change.pm25_delta, 0.0);
        assert_eq!(p.change.trend, Trend::Worsening);
    }

    #[test]
    fn test_generated_at_policy_uses_now() {
        let store = store_with_pm25("30.0");
        let now = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let p = fixed(0.0, TimestampPolicy::GeneratedAt)
            .forecast_at(&store, CityKey::Cdmx, now)
            .unwrap();
        assert_eq!(p.predicted.timestamp, "2025-01-02T03:04:05");
        assert_eq!(p.current.timestamp, "2024-05-01T09:00:00");
    }

    #[test]
    fn test_uniform_jitter_stays_in_bounds() {
        let store = store_with_pm25("30.0");
        let forecaster = Forecaster::default();
        for _ in 0..500 {
            let p = forecaster.forecast(&store, CityKey::Cdmx).unwrap();
            assert!((27.0..=33.0).contains(&p.predicted.pm25), "{}", p.predicted.pm25);
        }
    }

    #[test]
    fn test_missing_dataset() {
        let store = DatasetStore::default();
        let err = Forecaster::default()
            .forecast(&store, CityKey::La)
            .unwrap_err();
        assert!(matches!(err, CoreError::NoDataAvailable(CityKey::La)));
    }

    #[test]
    fn test_day_ahead_overflow_is_processing_error() {
        let store = DatasetStore::builder()
            .dataset(
                CityKey::La,
                vec![RawRecord {
                    timestamp: "+262142-12-31 12:00".into(),
                    pm25: Some("30.0".into()),
                    ..Default::default()
                }],
            )
            .build();
        let err = fixed(0.0, TimestampPolicy::DayAhead)
            .forecast(&store, CityKey::La)
            .unwrap_err();
        assert!(matches!(err, CoreError::Processing(_)));

        // The same record is fine when the forecast is stamped with "now"
        assert!(fixed(0.0, TimestampPolicy::GeneratedAt)
            .forecast(&store, CityKey::La)
            .is_ok());
    }

    #[test]
    fn test_malformed_latest_is_processing_error() {
        let store = store_with_pm25("broken");
        let err = Forecaster::default()
            .forecast(&store, CityKey::Cdmx)
            .unwrap_err();
        assert!(matches!(err, CoreError::Processing(_)));
    }
}
