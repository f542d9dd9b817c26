// HTTP API server binary for catalog-sync

use anyhow::Result;
use catalog_sync::api::{ApiServer, AppState};
use catalog_sync::config::SyncConfig;
use catalog_sync::database_ops::db::Db;
use catalog_sync::logging;

#[actix_web::main]
async fn main() -> Result<()> {
    logging::init_tracing(logging::DEFAULT_FILTER)?;
    tracing::info!("Initializing catalog-sync API server");

    let config = SyncConfig::from_env();
    let server = ApiServer::from_env()?;

    let db = Db::from_config(&config).await?;
    tracing::info!("Database connected successfully");

    server.run(AppState { db, config }).await
}
