//! Runtime configuration for a sync run and the lookup path.
//!
//! [`SyncConfig::from_env`] reads the process environment once; the resulting
//! value is passed explicitly to the orchestrator, each pass and the HTTP
//! layer. Nothing reads the environment after startup.

use std::path::{Path, PathBuf};

use crate::feeds::FeedKind;
use crate::util::env as env_util;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://catalog.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Directory holding the three feed files.
    pub feed_dir: PathBuf,
    pub products_file: String,
    pub inventory_file: String,
    pub prices_file: String,
    /// When set, feeds are downloaded from `{feed_base_url}/{file}` before each pass.
    pub feed_base_url: Option<String>,
    /// Wrap the product pass in a single transaction like the other two passes.
    pub products_transactional: bool,
    /// Create the three catalog tables on connect if they are missing.
    pub bootstrap_schema: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            feed_dir: PathBuf::from("."),
            products_file: FeedKind::Products.default_file_name().to_string(),
            inventory_file: FeedKind::Inventory.default_file_name().to_string(),
            prices_file: FeedKind::Prices.default_file_name().to_string(),
            feed_base_url: None,
            products_transactional: false,
            bootstrap_schema: false,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        env_util::init_env();
        let defaults = Self::default();
        Self {
            database_url: env_util::env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: env_util::env_parse("DB_MAX_CONNS", DEFAULT_MAX_CONNECTIONS),
            feed_dir: env_util::env_opt("FEED_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.feed_dir),
            products_file: env_util::env_or("PRODUCTS_FILE", &defaults.products_file),
            inventory_file: env_util::env_or("INVENTORY_FILE", &defaults.inventory_file),
            prices_file: env_util::env_or("PRICES_FILE", &defaults.prices_file),
            feed_base_url: env_util::env_opt("FEED_BASE_URL"),
            products_transactional: env_util::env_flag("PRODUCTS_TRANSACTIONAL", false),
            bootstrap_schema: env_util::env_flag("AUTO_SCHEMA", false),
        }
    }

    /// Config rooted at `feed_dir` with every other field at its default.
    pub fn with_feed_dir(feed_dir: impl AsRef<Path>) -> Self {
        Self {
            feed_dir: feed_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn file_name(&self, feed: FeedKind) -> &str {
        match feed {
            FeedKind::Products => &self.products_file,
            FeedKind::Inventory => &self.inventory_file,
            FeedKind::Prices => &self.prices_file,
        }
    }

    pub fn feed_path(&self, feed: FeedKind) -> PathBuf {
        self.feed_dir.join(self.file_name(feed))
    }

    pub fn feed_url(&self, feed: FeedKind) -> Option<String> {
        self.feed_base_url.as_deref().map(|base| {
            format!("{}/{}", base.trim_end_matches('/'), self.file_name(feed))
        })
    }
}
