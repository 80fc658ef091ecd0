//! Logging setup for the AirGuard service
//!
//! `RUST_LOG` selects what is logged (default `info,airguard=debug`) and
//! `AIRGUARD_LOG_FORMAT` selects how: `json` (default) or `pretty` for local
//! runs.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

pub const DEFAULT_FILTER: &str = "info,airguard=debug";

/// Output encoding for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "text" => Some(LogFormat::Pretty),
            _ => None,
        }
    }

    /// Format from AIRGUARD_LOG_FORMAT; unset or unknown values fall back to JSON
    pub fn from_env() -> Self {
        std::env::var("AIRGUARD_LOG_FORMAT")
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

/// Filter from RUST_LOG, or [`DEFAULT_FILTER`] when unset or invalid
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(service_name: &str) -> Result<(), TryInitError> {
    let format = LogFormat::from_env();
    let registry = tracing_subscriber::registry().with(env_filter());
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init()?,
    }

    tracing::info!(service = %service_name, ?format, "logging initialized");
    Ok(())
}
