//! DeskPulse - workstation behaviour tracker
//!
//! Main entry point: loads configuration, wires the context, runs until
//! Ctrl+C and then shuts every component down.

use deskpulse_infra::config;
use deskpulse_infra::observability::init_tracing;
use deskpulse_lib::AppContext;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment first so DESKPULSE_* overrides reach the loader
    let dotenv = dotenvy::dotenv();

    let config = config::load()?;
    let _log_guard = init_tracing(&config.logging);

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(error = %err, "no .env file loaded"),
    }

    info!(version = env!("CARGO_PKG_VERSION"), "DeskPulse starting...");
    let ctx = AppContext::new(config).await?;

    if let Some(url) = ctx.ingestion_url().await {
        info!(%url, "waiting for browser extension connections");
    }
    let health = ctx.health_check().await;
    for component in health.components.iter().filter(|c| !c.is_healthy) {
        warn!(component = %component.name, message = ?component.message, "component unhealthy");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    let shutdown = ctx.shutdown().await;
    match ctx.today_report().await {
        Ok(report) => info!(
            date = %report.date,
            total_minutes = report.total_minutes,
            sessions = report.session_count,
            efficiency = report.efficiency.total_score,
            peak_hours = ?report.peak_hours,
            "today so far"
        ),
        Err(err) => warn!(error = %err, "failed to build today's report"),
    }
    shutdown?;
    Ok(())
}
