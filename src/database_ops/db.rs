use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, instrument};

use crate::config::SyncConfig;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Products (
    SKU          TEXT PRIMARY KEY NOT NULL,
    Name         TEXT NOT NULL,
    EAN          TEXT NOT NULL,
    ProducerName TEXT NOT NULL,
    Category     TEXT NOT NULL,
    DefaultImage TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS Inventory (
    SKU          TEXT PRIMARY KEY NOT NULL,
    Qty          INTEGER NOT NULL,
    Unit         TEXT NOT NULL,
    ShippingCost REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS Prices (
    SKU       TEXT PRIMARY KEY NOT NULL,
    NettPrice REAL NOT NULL
);
";

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await?;
        info!("connected to db");
        Ok(Self { pool })
    }

    /// Connect using the store settings in `config`, bootstrapping the schema
    /// when `config.bootstrap_schema` is set.
    pub async fn from_config(config: &SyncConfig) -> Result<Self> {
        let db = Self::connect(&config.database_url, config.max_connections).await?;
        if config.bootstrap_schema {
            db.ensure_schema().await?;
        } else {
            info!("AUTO_SCHEMA disabled; expecting catalog tables to exist");
        }
        Ok(db)
    }

    /// Create the catalog tables if they do not exist. Existing tables are
    /// left untouched.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("catalog schema ensured");
        Ok(())
    }

    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
