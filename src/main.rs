//! Server: loads `.env`, opens the database, brings the schema to the current
//! version and serves the apps collection over HTTP.

use hosted_apps::{app_router, schema, AppState, HostedAppsProvider, ProviderConfig, SqliteStorage};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hosted_apps=info")),
        )
        .init();

    let config = ProviderConfig::from_env()?;
    let storage = SqliteStorage::connect(&config.database_url).await?;
    schema::open(&storage).await?;

    let provider = HostedAppsProvider::from_config(Arc::new(storage), &config);
    let collection = provider.collection_address().to_string();
    let app = app_router(AppState::new(provider), &config.base_path);

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!("listening on {} for {}", listener.local_addr()?, collection);
    axum::serve(listener, app).await?;
    Ok(())
}
