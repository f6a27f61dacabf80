use anyhow::{Context, Result};
use download_api::{router, AppState};
use rbperf_core::Settings;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var_os("RBPERF_CONFIG").map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref()).context("Failed to load settings")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("download_api={0},tower_http={0}", settings.log.level)));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let state = AppState::from_settings(&settings.server).context("Failed to build HTTP client")?;
    let app = router(state, &settings.server);

    let listener = TcpListener::bind(&settings.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.bind_addr))?;
    tracing::info!(
        addr = %settings.server.bind_addr,
        upstream = %settings.server.upstream_base_url,
        "Download service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Download service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
