use anyhow::Context;
use tracing::info;
use vigia_app::{init_tracing, AppState};
use vigia_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Vigia v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    let state = AppState::bootstrap(config).await?;

    info!(sites = state.registry.count(), "Ready; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    state.shutdown().await;
    Ok(())
}
