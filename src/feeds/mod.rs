// Catalog feeds: delimited text sources for products, inventory and prices.

pub mod filter;
pub mod parser;
pub mod records;
pub mod source;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use records::{InventoryRecord, PriceRecord, ProductRecord};

/// The three feeds, in the order a sync run processes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Products,
    Inventory,
    Prices,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [FeedKind::Products, FeedKind::Inventory, FeedKind::Prices];

    pub fn label(self) -> &'static str {
        match self {
            FeedKind::Products => "products",
            FeedKind::Inventory => "inventory",
            FeedKind::Prices => "prices",
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            FeedKind::Products => "Products.csv",
            FeedKind::Inventory => "Inventory.csv",
            FeedKind::Prices => "Prices.csv",
        }
    }

    /// Whether a row that fails to decode is skipped rather than failing the pass.
    pub fn skips_malformed_rows(self) -> bool {
        !matches!(self, FeedKind::Inventory)
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to open {feed} feed at {}: {source}", .path.display())]
    Open {
        feed: FeedKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {feed} feed header: {source}")]
    Header {
        feed: FeedKind,
        #[source]
        source: csv::Error,
    },
    #[error("malformed {feed} row at line {line}: {source}")]
    Row {
        feed: FeedKind,
        line: u64,
        #[source]
        source: csv::Error,
    },
}
