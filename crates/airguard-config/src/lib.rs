use airguard_core::{CityKey, TimestampPolicy, DEFAULT_HISTORY_WINDOW};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_BIND: &str = "0.0.0.0:5000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directories searched, in order, for the dataset files
    pub dirs: Option<Vec<String>>,
    pub cdmx_file: Option<String>,
    pub la_file: Option<String>,
    /// Length of the synthetic series used when a file is missing
    pub synthetic_hours: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub timestamp_policy: Option<TimestampPolicy>,
    pub history_window: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub data: Option<DataConfig>,
    pub forecast: Option<ForecastConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl AppConfig {
    /// Load configuration from AIRGUARD_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("AIRGUARD_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            Self::parse(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Parse and validate a TOML document
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let cfg = toml::from_str::<AppConfig>(s)?;
        cfg.history_window()?;
        Ok(cfg)
    }

    /// HTTP bind address (default 0.0.0.0:5000); PORT replaces the port
    pub fn http_bind(&self) -> String {
        let bind = self
            .server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        match std::env::var("PORT") {
            Ok(port) => with_port(&bind, &port),
            Err(_) => bind,
        }
    }

    pub fn data_dirs(&self) -> Vec<PathBuf> {
        self.data
            .as_ref()
            .and_then(|d| d.dirs.clone())
            .unwrap_or_else(|| vec!["data".into(), "../data".into(), "./backend/data".into()])
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }

    /// Dataset file name per city
    pub fn data_files(&self) -> BTreeMap<CityKey, String> {
        let data = self.data.clone().unwrap_or_default();
        BTreeMap::from([
            (
                CityKey::Cdmx,
                data.cdmx_file
                    .unwrap_or_else(|| "dataset_final_cdmx_limpio.csv".to_string()),
            ),
            (
                CityKey::La,
                data.la_file
                    .unwrap_or_else(|| "dataset_final_LA_limpio.csv".to_string()),
            ),
        ])
    }

    pub fn synthetic_hours(&self) -> usize {
        self.data
            .as_ref()
            .and_then(|d| d.synthetic_hours)
            .unwrap_or(24)
    }

    pub fn timestamp_policy(&self) -> TimestampPolicy {
        self.forecast
            .as_ref()
            .and_then(|f| f.timestamp_policy)
            .unwrap_or_default()
    }

    pub fn history_window(&self) -> Result<usize, ConfigError> {
        match self.forecast.as_ref().and_then(|f| f.history_window) {
            None => Ok(DEFAULT_HISTORY_WINDOW),
            Some(0) => Err(ConfigError::InvalidValue {
                key: "forecast.history_window",
                value: "0".to_string(),
            }),
            Some(n) => Ok(n),
        }
    }
}

fn with_port(bind: &str, port: &str) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{bind}:{port}"),
    }
}
