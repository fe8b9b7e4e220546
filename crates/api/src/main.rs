use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;

use slicehouse_api::app::{self, AppServices};
use slicehouse_api::config::AppConfig;
use slicehouse_auth::CredentialStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    slicehouse_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "configuration loaded");

    let services = Arc::new(
        AppServices::from_config(&config)
            .await
            .context("failed to initialise services")?,
    );

    let sweeper = spawn_token_sweep(services.credentials.clone(), config.token_sweep_period);
    let reporter = slicehouse_observability::spawn_reporter(services.metrics.clone(), config.metrics_period);

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    reporter.abort();
    tracing::info!("shutdown complete");
    Ok(())
}

/// Periodically drop expired entries from the active-token registry.
fn spawn_token_sweep(store: Arc<dyn CredentialStore>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match store.purge_expired_tokens(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired tokens purged"),
                Err(e) => tracing::warn!(error = %e, "token sweep failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
