//! Immutable per-city dataset store

use crate::{CityKey, CoreError, CoreResult, RawRecord};
use std::collections::BTreeMap;

/// Per-city record sequences, oldest first
///
/// Built once through [`DatasetStore::builder`] and read-only afterwards, so
/// it can be shared across request handlers behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    datasets: BTreeMap<CityKey, Vec<RawRecord>>,
}

/// Collects datasets before the store is frozen
#[derive(Debug, Default)]
pub struct DatasetStoreBuilder {
    datasets: BTreeMap<CityKey, Vec<RawRecord>>,
}

impl DatasetStoreBuilder {
    /// Set the dataset for a city, replacing any earlier one
    pub fn dataset(mut self, city: CityKey, records: Vec<RawRecord>) -> Self {
        self.datasets.insert(city, records);
        self
    }

    pub fn build(self) -> DatasetStore {
        DatasetStore {
            datasets: self.datasets,
        }
    }
}

impl DatasetStore {
    pub fn builder() -> DatasetStoreBuilder {
        DatasetStoreBuilder::default()
    }

    /// Full sequence for a city, `None` when no dataset was loaded
    pub fn records(&self, city: CityKey) -> Option<&[RawRecord]> {
        self.datasets.get(&city).map(Vec::as_slice)
    }

    /// Most recent record
    pub fn latest(&self, city: CityKey) -> CoreResult<&RawRecord> {
        self.records(city)
            .and_then(<[RawRecord]>::last)
            .ok_or(CoreError::NoDataAvailable(city))
    }

    /// Up to `n` most recent records, oldest first
    pub fn window(&self, city: CityKey, n: usize) -> &[RawRecord] {
        let records = self.records(city).unwrap_or_default();
        let start = records.len().saturating_sub(n);
        &records[start..]
    }

    /// Cities with a loaded dataset, empty or not
    pub fn cities(&self) -> Vec<CityKey> {
        self.datasets.keys().copied().collect()
    }

    /// Cities holding at least one record
    pub fn cities_with_data(&self) -> Vec<CityKey> {
        self.datasets
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(city, _)| *city)
            .collect()
    }

    pub fn counts(&self) -> BTreeMap<CityKey, usize> {
        self.datasets
            .iter()
            .map(|(city, records)| (*city, records.len()))
            .collect()
    }
}
