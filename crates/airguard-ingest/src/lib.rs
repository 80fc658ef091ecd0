//! Dataset sources for the AirGuard store
//!
//! Each city is read from the first CSV file found among the configured
//! directories. When no file exists, or it cannot be read, a synthetic
//! generator fills in so the service always starts with data.

pub mod csv_source;
pub mod loader;
pub mod synthetic;

pub use csv_source::*;
pub use loader::*;
pub use synthetic::*;

use airguard_core::{CityKey, RawRecord};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path}: missing required column {column:?}")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("No dataset file found for {0}")]
    NotFound(CityKey),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Anything that can supply a city's records at startup
pub trait DatasetSource: Send + Sync {
    /// Source name/identifier, used in logs
    fn name(&self) -> &str;

    /// Read the full record sequence for a city, oldest first
    fn load(&self, city: CityKey) -> IngestResult<Vec<RawRecord>>;
}
