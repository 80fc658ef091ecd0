//! Startup population of the dataset store

use crate::{DatasetSource, IngestError};
use airguard_core::{CityKey, DatasetStore};

/// Load every supported city, preferring `primary` and falling back on failure
///
/// Never fails: a city whose primary source errors is filled from `fallback`,
/// and if that errors too the city is left without a dataset.
pub fn load_store(primary: &dyn DatasetSource, fallback: &dyn DatasetSource) -> DatasetStore {
    let mut builder = DatasetStore::builder();

    for city in CityKey::ALL {
        let records = match primary.load(city) {
            Ok(records) => Ok(records),
            Err(e) => {
                match &e {
                    IngestError::NotFound(_) => {
                        tracing::warn!(city = %city, source = primary.name(), "dataset file not found, using {}", fallback.name())
                    }
                    _ => {
                        tracing::warn!(city = %city, source = primary.name(), error = %e, "dataset unreadable, using {}", fallback.name())
                    }
                }
                fallback.load(city)
            }
        };

        match records {
            Ok(records) => builder = builder.dataset(city, records),
            Err(e) => tracing::error!(city = %city, error = %e, "no dataset available"),
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CsvSource, IngestResult, SyntheticSource};
    use airguard_core::RawRecord;
    use std::collections::BTreeMap;

    struct Failing;

    impl DatasetSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn load(&self, city: CityKey) -> IngestResult<Vec<RawRecord>> {
            Err(IngestError::NotFound(city))
        }
    }

    #[test]
    fn test_falls_back_per_city() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("la.csv"),
            "timestamp,pm25\n2024-01-01T00:00:00,7.5\n2024-01-01T01:00:00,8.0\n",
        )
        .unwrap();
        let csv = CsvSource::new(
            vec![dir.path().to_path_buf()],
            BTreeMap::from([
                (CityKey::Cdmx, "cdmx.csv".to_string()),
                (CityKey::La, "la.csv".to_string()),
            ]),
        );

        let store = load_store(&csv, &SyntheticSource::new(12));
        assert_eq!(store.counts()[&CityKey::La], 2);
        assert_eq!(store.counts()[&CityKey::Cdmx], 12);
    }

    #[test]
    fn test_both_sources_failing_leaves_city_absent() {
        let store = load_store(&Failing, &Failing);
        assert!(store.cities().is_empty());
        assert!(store.latest(CityKey::Cdmx).is_err());
    }
}
