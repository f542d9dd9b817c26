use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use super::db::Db;

/// Merged product / inventory / price view for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[sqlx(rename = "Name")]
    pub name: String,
    #[sqlx(rename = "EAN")]
    pub ean: String,
    #[sqlx(rename = "ProducerName")]
    pub producer_name: String,
    #[sqlx(rename = "Category")]
    pub category: String,
    #[sqlx(rename = "DefaultImage")]
    pub default_image: String,
    #[sqlx(rename = "Qty")]
    pub qty: i64,
    #[sqlx(rename = "Unit")]
    pub unit: String,
    /// `None` when the SKU has no price row.
    #[sqlx(rename = "NettPrice")]
    pub nett_price: Option<f64>,
    #[sqlx(rename = "ShippingCost")]
    pub shipping_cost: f64,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("SKU must not be blank")]
    BlankSku,
}

const DETAILS_SQL: &str = "\
SELECT p.Name AS Name, p.EAN AS EAN, p.ProducerName AS ProducerName, p.Category AS Category, \
       p.DefaultImage AS DefaultImage, i.Qty AS Qty, i.Unit AS Unit, \
       pr.NettPrice AS NettPrice, i.ShippingCost AS ShippingCost \
FROM Products p \
JOIN Inventory i ON p.SKU = i.SKU \
LEFT JOIN Prices pr ON p.SKU = pr.SKU \
WHERE p.SKU = ?";

pub async fn fetch_product_details(
    db: &Db,
    sku: &str,
) -> Result<Option<ProductDetails>, sqlx::Error> {
    sqlx::query_as::<_, ProductDetails>(DETAILS_SQL)
        .bind(sku)
        .fetch_optional(&db.pool)
        .await
}

/// Look up one SKU. A product needs both a product and an inventory row to be
/// found; the price is optional. Store failures are logged and reported as
/// not found.
pub async fn get_product_details(
    db: &Db,
    sku: &str,
) -> Result<Option<ProductDetails>, LookupError> {
    if sku.trim().is_empty() {
        return Err(LookupError::BlankSku);
    }
    match fetch_product_details(db, sku).await {
        Ok(Some(details)) => Ok(Some(details)),
        Ok(None) => {
            info!(sku, "no data for SKU");
            Ok(None)
        }
        Err(e) => {
            error!(sku, error = %e, "error while fetching product details");
            Ok(None)
        }
    }
}
