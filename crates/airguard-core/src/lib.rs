//! Core data types and the prediction/aggregation pipeline for AirGuard
//!
//! This crate provides the city resolver, PM2.5 to AQI conversion, the
//! immutable per-city dataset store, the jitter forecast and the trailing
//! history window.

pub mod aqi;
pub mod city;
pub mod forecast;
pub mod history;
pub mod store;
pub mod types;

pub use aqi::*;
pub use city::*;
pub use forecast::*;
pub use history::*;
pub use store::*;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("City not supported: {0}")]
    UnsupportedCity(String),

    #[error("No data available for {0}")]
    NoDataAvailable(CityKey),

    #[error("Error processing data: {0}")]
    Processing(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
