// API server implementation using actix-web

use crate::api::{middleware, routes};
use crate::config::SyncConfig;
use crate::database_ops::db::Db;
use crate::util::env as env_util;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

/// Shared per-app state: the store pool and the sync configuration.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: SyncConfig,
}

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        env_util::init_env();

        let host = env_util::env_or("API_HOST", "0.0.0.0");
        let port = env_util::env_or("API_PORT", "8080")
            .trim()
            .parse()
            .context("Invalid API_PORT")?;
        let allowed_origins = env_util::env_or("ALLOWED_ORIGINS", "http://localhost:3000");

        Ok(Self {
            host,
            port,
            allowed_origins,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, state: AppState) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            "Starting catalog-sync API server"
        );

        let state = web::Data::new(state);
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
