use std::net::SocketAddr;
use std::sync::Arc;

use airguard_config::AppConfig;
use airguard_core::{Forecaster, UniformJitter};
use airguard_ingest::{load_store, CsvSource, SyntheticSource};
use anyhow::{Context, Result};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Observability
    airguard_obs::init("airguard")?;

    // Config
    let cfg = AppConfig::load().context("Failed to load configuration")?;
    let policy = cfg.timestamp_policy();
    let history_window = cfg.history_window()?;

    // Datasets are loaded once, before serving
    let csv = CsvSource::new(cfg.data_dirs(), cfg.data_files());
    let synthetic = SyntheticSource::new(cfg.synthetic_hours());
    let store = load_store(&csv, &synthetic);
    for (city, count) in store.counts() {
        tracing::info!(%city, records = count, "dataset ready");
    }

    let forecaster = Forecaster::new(Arc::new(UniformJitter::default()), policy);
    let (app, _state) = airguard_api::build_app(store, forecaster, history_window)?;

    let addr: SocketAddr = cfg
        .http_bind()
        .parse()
        .context("Invalid HTTP bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;

    tracing::info!(%addr, ?policy, "HTTP server listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
