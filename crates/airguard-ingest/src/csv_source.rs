//! CSV dataset files

use crate::{DatasetSource, IngestError, IngestResult};
use airguard_core::{CityKey, RawRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Reads `<dir>/<file>` for the first candidate directory where it exists
#[derive(Debug, Clone)]
pub struct CsvSource {
    dirs: Vec<PathBuf>,
    files: BTreeMap<CityKey, String>,
}

impl CsvSource {
    pub fn new(dirs: Vec<PathBuf>, files: BTreeMap<CityKey, String>) -> Self {
        Self { dirs, files }
    }

    /// First existing candidate path for a city
    pub fn locate(&self, city: CityKey) -> Option<PathBuf> {
        let file = self.files.get(&city)?;
        self.dirs
            .iter()
            .map(|dir| dir.join(file))
            .find(|path| path.is_file())
    }
}

impl DatasetSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self, city: CityKey) -> IngestResult<Vec<RawRecord>> {
        let path = self.locate(city).ok_or(IngestError::NotFound(city))?;
        let records = read_csv(&path)?;
        tracing::info!(
            city = %city,
            path = %path.display(),
            records = records.len(),
            "dataset loaded"
        );
        Ok(records)
    }
}

/// Read every row of a dataset file, keeping field text as-is
///
/// A column missing from the header leaves that field `None`. A blank cell,
/// or a short row that stops before the column, yields `Some("")`. Rows the
/// CSV reader cannot decode are skipped; a file lacking the `timestamp` or
/// `pm25` header is rejected.
pub fn read_csv(path: &Path) -> IngestResult<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);
    let required = |column: &'static str| {
        position(column).ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column,
        })
    };
    let timestamp = required("timestamp")?;
    let pm25 = required("pm25")?;
    let temperature = position("temperature_2m");
    let relative_humidity = position("relativehumidity_2m");
    let pressure = position("pressure_msl");
    let wind_speed = position("windspeed_10m");
    let wind_direction = position("winddirection_10m");

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::debug!(path = %path.display(), row = line + 1, error = %e, "unreadable row");
                continue;
            }
        };
        let cell = |idx: usize| row.get(idx).unwrap_or_default().to_string();
        let optional = |idx: Option<usize>| idx.map(cell);
        records.push(RawRecord {
            timestamp: cell(timestamp),
            pm25: Some(cell(pm25)),
            temperature: optional(temperature),
            relative_humidity: optional(relative_humidity),
            pressure: optional(pressure),
            wind_speed: optional(wind_speed),
            wind_direction: optional(wind_direction),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use airguard_core::{history, CoreError, DatasetStore, Forecaster};
    use std::fs;

    const SAMPLE: &str = "\
timestamp,pm25,temperature_2m,relativehumidity_2m,pressure_msl,windspeed_10m,winddirection_10m,station
2024-01-01 00:00:00,21.4,18.2,60.1,1015.3,2.4,90,centro
2024-01-01 01:00:00,n/a,18.0,61.0,1015.1,2.2,95,centro
2024-01-01 02:00:00,19.8,17.6,63.5,1014.9,2.0,100,centro
";

    fn files(name: &str) -> BTreeMap<CityKey, String> {
        BTreeMap::from([(CityKey::Cdmx, name.to_string())])
    }

    #[test]
    fn test_reads_rows_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdmx.csv");
        fs::write(&path, SAMPLE).unwrap();

        let records = read_csv(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].timestamp, "2024-01-01 00:00:00");
        assert_eq!(records[0].pm25.as_deref(), Some("21.4"));
        assert_eq!(records[1].pm25.as_deref(), Some("n/a"));
        assert_eq!(records[2].wind_direction.as_deref(), Some("100"));
    }

    #[test]
    fn test_missing_weather_columns_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("la.csv");
        fs::write(&path, "timestamp,pm25\n2024-01-01T00:00:00,7.5\n").unwrap();

        let records = read_csv(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].temperature, None);
    }

    #[test]
    fn test_blank_cells_and_short_rows_are_excluded_downstream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdmx.csv");
        fs::write(
            &path,
            "timestamp,pm25,temperature_2m\n\
             2024-01-01 00:00:00,,18\n\
             2024-01-01 01:00:00,20.0,18\n\
             2024-01-01 02:00:00,21.0,\n\
             2024-01-01 03:00:00\n",
        )
        .unwrap();

        let records = read_csv(&path).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].pm25.as_deref(), Some(""));
        assert_eq!(records[3].pm25.as_deref(), Some(""));
        assert_eq!(records[3].temperature.as_deref(), Some(""));
        assert_eq!(records[1].pressure, None);

        let store = DatasetStore::builder().dataset(CityKey::Cdmx, records).build();
        let points = history(&store, CityKey::Cdmx, 24).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].pm25, 20.0);
        assert_eq!(points[0].aqi, 67);
        assert_eq!(points[0].pressure_msl, 0.0);

        let err = Forecaster::default().forecast(&store, CityKey::Cdmx).unwrap_err();
        assert!(matches!(err, CoreError::Processing(_)));
    }

    #[test]
    fn test_rejects_file_without_pm25() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "timestamp,pm10\n2024-01-01T00:00:00,7.5\n").unwrap();

        let err = read_csv(&path).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { column: "pm25", .. }));
    }

    #[test]
    fn test_locate_uses_first_existing_dir() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("cdmx.csv"), SAMPLE).unwrap();

        let source = CsvSource::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            files("cdmx.csv"),
        );
        assert_eq!(source.locate(CityKey::Cdmx), Some(second.path().join("cdmx.csv")));
        assert_eq!(source.locate(CityKey::La), None);
        assert_eq!(source.load(CityKey::Cdmx).unwrap().len(), 3);
        assert!(matches!(
            source.load(CityKey::La),
            Err(IngestError::NotFound(CityKey::La))
        ));
    }
}
