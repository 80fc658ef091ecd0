//! Synthetic hourly readings used when no dataset file is available

use crate::{DatasetSource, IngestResult};
use airguard_core::{round_dp, CityKey, RawRecord, TIMESTAMP_FORMAT};
use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;

/// Generates `hours` hourly records ending just before "now"
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSource {
    hours: usize,
}

impl SyntheticSource {
    pub const DEFAULT_HOURS: usize = 24;

    pub fn new(hours: usize) -> Self {
        Self { hours }
    }

    /// Records starting `hours` hours before `now`
    pub fn generate(&self, now: NaiveDateTime) -> Vec<RawRecord> {
        let mut rng = rand::thread_rng();
        let base = now - Duration::hours(self.hours as i64);

        (0..self.hours)
            .map(|i| {
                let at = base + Duration::hours(i as i64);
                let mut sample = |lo: f64, hi: f64, places: i32| {
                    Some(round_dp(rng.gen_range(lo..hi), places).to_string())
                };
                RawRecord {
                    timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
                    pm25: sample(15.0, 45.0, 2),
                    temperature: sample(18.0, 28.0, 1),
                    relative_humidity: sample(40.0, 80.0, 1),
                    wind_speed: sample(2.0, 8.0, 1),
                    wind_direction: sample(0.0, 360.0, 1),
                    pressure: sample(1010.0, 1020.0, 1),
                }
            })
            .collect()
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOURS)
    }
}

impl DatasetSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load(&self, city: CityKey) -> IngestResult<Vec<RawRecord>> {
        let records = self.generate(Utc::now().naive_utc());
        tracing::info!(city = %city, records = records.len(), "created synthetic data");
        Ok(records)
    }
}
