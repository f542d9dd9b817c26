//! Catalog store contract: the three SKU-keyed tables and the statements the
//! reconciler issues against them.
//!
//! Every operation takes a `&mut SqliteConnection`, so the same code runs on a
//! pooled connection (implicit per-statement commit) or inside a transaction.

use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use sqlx::SqliteConnection;

/// Persisted subset of a product record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub sku: String,
    pub name: String,
    pub ean: String,
    pub producer_name: String,
    pub category: String,
    pub default_image: String,
}

/// Persisted subset of an inventory record (express shipping only).
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub sku: String,
    pub qty: i64,
    pub unit: String,
    pub shipping_cost: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub sku: String,
    pub nett_price: BigDecimal,
}

/// A row keyed by SKU in one catalog table.
#[async_trait]
pub trait CatalogRow: Send + Sync {
    const TABLE: &'static str;

    fn sku(&self) -> &str;

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;

    /// Overwrite every persisted column of the row with this SKU. The SKU itself is never changed.
    async fn update(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;

    async fn exists(conn: &mut SqliteConnection, sku: &str) -> Result<bool, sqlx::Error> {
        let found = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT 1 FROM {} WHERE SKU = ? LIMIT 1",
            Self::TABLE
        ))
        .bind(sku)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(found.is_some())
    }
}

/// SQLite has no exact decimal type; amounts are stored as REAL, rounded to
/// the nearest f64 of their decimal text.
fn amount(value: &BigDecimal) -> f64 {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| value.to_f64())
        .unwrap_or_default()
}

#[async_trait]
impl CatalogRow for ProductRow {
    const TABLE: &'static str = "Products";

    fn sku(&self) -> &str {
        &self.sku
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO Products (SKU, Name, EAN, ProducerName, Category, DefaultImage) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(self.sku.as_str())
        .bind(self.name.as_str())
        .bind(self.ean.as_str())
        .bind(self.producer_name.as_str())
        .bind(self.category.as_str())
        .bind(self.default_image.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn update(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE Products SET Name = ?, EAN = ?, ProducerName = ?, Category = ?, \
             DefaultImage = ? WHERE SKU = ?",
        )
        .bind(self.name.as_str())
        .bind(self.ean.as_str())
        .bind(self.producer_name.as_str())
        .bind(self.category.as_str())
        .bind(self.default_image.as_str())
        .bind(self.sku.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRow for InventoryRow {
    const TABLE: &'static str = "Inventory";

    fn sku(&self) -> &str {
        &self.sku
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO Inventory (SKU, Qty, Unit, ShippingCost) VALUES (?, ?, ?, ?)")
            .bind(self.sku.as_str())
            .bind(self.qty)
            .bind(self.unit.as_str())
            .bind(amount(&self.shipping_cost))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn update(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE Inventory SET Qty = ?, Unit = ?, ShippingCost = ? WHERE SKU = ?")
            .bind(self.qty)
            .bind(self.unit.as_str())
            .bind(amount(&self.shipping_cost))
            .bind(self.sku.as_str())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRow for PriceRow {
    const TABLE: &'static str = "Prices";

    fn sku(&self) -> &str {
        &self.sku
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO Prices (SKU, NettPrice) VALUES (?, ?)")
            .bind(self.sku.as_str())
            .bind(amount(&self.nett_price))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn update(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE Prices SET NettPrice = ? WHERE SKU = ?")
            .bind(amount(&self.nett_price))
            .bind(self.sku.as_str())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
