//! FounderFuel HTTP API.
//!
//! Exposes scraping, critique and repurposing over JSON, backed by the same
//! pipelines and database as the CLI.

mod app;
mod error;
mod routes;

use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use founderfuel_core::Services;
use founderfuel_shared::load_config;

/// Set to `json` for machine-readable logs.
const LOG_FORMAT_ENV: &str = "FOUNDERFUEL_LOG_FORMAT";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let mut config = load_config()?;
    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port
            .parse()
            .wrap_err_with(|| format!("PORT must be a port number, got {port:?}"))?;
    }

    let services = Services::from_config(&config).await?;
    let router = app::build_router(services, &config.server.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(%addr, "founderfuel server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("founderfuel=info,tower_http=info"));

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
