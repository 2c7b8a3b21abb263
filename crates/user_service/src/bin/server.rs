//! User Service Binary
//!
//! Boots the user store: loads configuration, installs tracing, opens the
//! database pool, verifies storage and then waits for a shutdown signal.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin user-service
//!
//! # Run with a config file and overrides
//! CONFIG_FILE=config/prod.toml USER_SERVICE_DATABASE__HOST=db.internal cargo run --bin user-service
//! ```

use anyhow::Context;
use tracing::info;

use user_service::{bootstrap, telemetry, Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = bootstrap("user", false).context("loading configuration")?;
    telemetry::init_tracing(&config).context("installing tracing subscriber")?;

    info!(
        name = %config.server.name,
        env = %config.server.env,
        database = %config.database.host,
        "Starting user service"
    );

    let services = Services::connect(config)
        .await
        .context("connecting to storage")?;
    services
        .verify_storage()
        .await
        .context("verifying storage")?;

    info!("User service ready");
    shutdown_signal().await?;

    services.pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .context("installing SIGTERM handler")?;

        tokio::select! {
            result = ctrl_c => {
                result.context("installing Ctrl+C handler")?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.context("installing Ctrl+C handler")?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}
