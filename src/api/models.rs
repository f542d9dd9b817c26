// API response models

use serde::{Deserialize, Serialize};

pub const SYNC_OK: &str = "Data updated successfully";
pub const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}
