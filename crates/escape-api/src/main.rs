//! Binary entrypoint for the Escape API server.
use anyhow::Context;
use escape_api::{run, ApiConfig, AppState, Catalog};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ApiConfig::from_env();
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => {
            tracing::warn!("ESCAPE_CATALOG not set; starting with an empty catalog");
            Catalog::default()
        }
    };
    tracing::info!(
        rooms = catalog.rooms.len(),
        teams = catalog.teams.len(),
        "catalog loaded"
    );

    let state = AppState::in_memory(catalog, config).context("registering metrics")?;
    run(state).await.context("server error")?;
    Ok(())
}
