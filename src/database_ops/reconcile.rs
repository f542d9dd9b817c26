//! Reconciler: parse → filter → upsert, one pass per feed.
//!
//! Every record is reconciled on its own: an existence check by SKU followed
//! by an insert or an update. The inventory and price passes run inside one
//! transaction each and roll back completely on the first store error. The
//! product pass runs on a plain connection unless
//! `SyncConfig::products_transactional` is set, so rows written before a
//! failure stay committed.

use sqlx::SqliteConnection;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::catalog::CatalogRow;
use super::db::Db;
use crate::config::SyncConfig;
use crate::feeds::{filter, parser, FeedError, FeedKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Counters for one completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub feed: FeedKind,
    /// Rows pulled from the feed, including malformed and filtered ones.
    pub read: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub updated: usize,
}

impl PassReport {
    fn new(feed: FeedKind) -> Self {
        Self {
            feed,
            read: 0,
            skipped: 0,
            inserted: 0,
            updated: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("{feed} pass failed at SKU {sku:?}: {source}")]
    Row {
        feed: FeedKind,
        sku: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("{feed} pass store failure: {source}")]
    Store {
        feed: FeedKind,
        #[source]
        source: sqlx::Error,
    },
}

impl PassError {
    fn store(feed: FeedKind) -> impl FnOnce(sqlx::Error) -> PassError {
        move |source| PassError::Store { feed, source }
    }
}

/// Insert the row if its SKU is absent, otherwise update it in place.
pub async fn upsert<R: CatalogRow>(
    conn: &mut SqliteConnection,
    row: &R,
) -> Result<UpsertOutcome, sqlx::Error> {
    if R::exists(&mut *conn, row.sku()).await? {
        row.update(&mut *conn).await?;
        Ok(UpsertOutcome::Updated)
    } else {
        row.insert(&mut *conn).await?;
        Ok(UpsertOutcome::Inserted)
    }
}

/// Drive one feed's records through `validate` and upsert the survivors.
async fn reconcile_rows<I, T, R, F>(
    conn: &mut SqliteConnection,
    feed: FeedKind,
    records: I,
    validate: F,
) -> Result<PassReport, PassError>
where
    I: Iterator<Item = Result<T, FeedError>>,
    F: Fn(T) -> Option<R>,
    R: CatalogRow,
{
    let mut report = PassReport::new(feed);
    for item in records {
        report.read += 1;
        let record = match item {
            Ok(record) => record,
            Err(err) if feed.skips_malformed_rows() => {
                debug!(feed = %feed, error = %err, "skipping malformed row");
                report.skipped += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let Some(row) = validate(record) else {
            report.skipped += 1;
            continue;
        };

        match upsert(&mut *conn, &row).await {
            Ok(UpsertOutcome::Inserted) => report.inserted += 1,
            Ok(UpsertOutcome::Updated) => report.updated += 1,
            Err(source) => {
                return Err(PassError::Row {
                    feed,
                    sku: row.sku().to_string(),
                    source,
                })
            }
        }
    }
    Ok(report)
}

/// Run `reconcile_rows` inside one transaction: commit on success, roll back
/// on any error.
async fn reconcile_in_transaction<I, T, R, F>(
    db: &Db,
    feed: FeedKind,
    records: I,
    validate: F,
) -> Result<PassReport, PassError>
where
    I: Iterator<Item = Result<T, FeedError>>,
    F: Fn(T) -> Option<R>,
    R: CatalogRow,
{
    let mut tx = db.pool.begin().await.map_err(PassError::store(feed))?;
    match reconcile_rows(&mut *tx, feed, records, validate).await {
        Ok(report) => {
            tx.commit().await.map_err(PassError::store(feed))?;
            Ok(report)
        }
        Err(err) => {
            error!(feed = %feed, error = %err, "error while saving to the database");
            match tx.rollback().await {
                Ok(()) => warn!(feed = %feed, "transaction rolled back"),
                Err(rb) => error!(feed = %feed, error = %rb, "rollback failed"),
            }
            Err(err)
        }
    }
}

async fn reconcile_on_connection<I, T, R, F>(
    db: &Db,
    feed: FeedKind,
    records: I,
    validate: F,
) -> Result<PassReport, PassError>
where
    I: Iterator<Item = Result<T, FeedError>>,
    F: Fn(T) -> Option<R>,
    R: CatalogRow,
{
    let mut conn = db.pool.acquire().await.map_err(PassError::store(feed))?;
    reconcile_rows(&mut *conn, feed, records, validate).await
}

fn log_report(report: &PassReport) {
    info!(
        feed = %report.feed,
        read = report.read,
        skipped = report.skipped,
        inserted = report.inserted,
        updated = report.updated,
        "pass complete"
    );
}

pub async fn run_products_pass(db: &Db, config: &SyncConfig) -> Result<PassReport, PassError> {
    let feed = FeedKind::Products;
    let src = parser::open_feed(feed, &config.feed_path(feed))?;
    let records = parser::product_records(src)?;

    let report = if config.products_transactional {
        reconcile_in_transaction(db, feed, records, filter::product).await?
    } else {
        reconcile_on_connection(db, feed, records, filter::product).await?
    };
    log_report(&report);
    Ok(report)
}

pub async fn run_inventory_pass(db: &Db, config: &SyncConfig) -> Result<PassReport, PassError> {
    let feed = FeedKind::Inventory;
    let src = parser::open_feed(feed, &config.feed_path(feed))?;
    let records = parser::inventory_records(src)?;

    let report = reconcile_in_transaction(db, feed, records, filter::inventory).await?;
    log_report(&report);
    Ok(report)
}

pub async fn run_prices_pass(db: &Db, config: &SyncConfig) -> Result<PassReport, PassError> {
    let feed = FeedKind::Prices;
    let src = parser::open_feed(feed, &config.feed_path(feed))?;
    let records = parser::price_records(src);

    let report = reconcile_in_transaction(db, feed, records, filter::price).await?;
    log_report(&report);
    Ok(report)
}

pub async fn run_pass(db: &Db, config: &SyncConfig, feed: FeedKind) -> Result<PassReport, PassError> {
    match feed {
        FeedKind::Products => run_products_pass(db, config).await,
        FeedKind::Inventory => run_inventory_pass(db, config).await,
        FeedKind::Prices => run_prices_pass(db, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::db::test_support::*;
    use std::path::Path;

    const PRODUCT_HEADER: &str =
        "SKU;name;EAN;producer_name;category;is_wire;available;is_vendor;default_image\n";
    const INVENTORY_HEADER: &str = "sku,unit,qty,shipping,shipping_cost\n";

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    async fn name_of(db: &Db, sku: &str) -> Option<String> {
        sqlx::query_scalar::<_, String>("SELECT Name FROM Products WHERE SKU = ?")
            .bind(sku)
            .fetch_optional(&db.pool)
            .await
            .unwrap()
    }

    async fn fail_inserts_for(db: &Db, table: &str, sku: &str) {
        sqlx::raw_sql(&format!(
            "CREATE TRIGGER fail_{table} BEFORE INSERT ON {table} \
             WHEN NEW.SKU = '{sku}' BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
        ))
        .execute(&db.pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn products_upsert_updates_existing_sku() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());

        write(
            dir.path(),
            "Products.csv",
            &format!("{PRODUCT_HEADER}X1;Old name;1;Acme;Tools;0;1;0;img\n"),
        );
        let first = run_products_pass(&db, &cfg).await.unwrap();
        assert_eq!(first.inserted, 1);

        write(
            dir.path(),
            "Products.csv",
            &format!("{PRODUCT_HEADER}X1;New name;1;Acme;Tools;0;1;0;img\n"),
        );
        let second = run_products_pass(&db, &cfg).await.unwrap();
        assert_eq!((second.inserted, second.updated), (0, 1));

        assert_eq!(count(&db, "Products").await, 1);
        assert_eq!(name_of(&db, "X1").await.as_deref(), Some("New name"));
    }

    #[tokio::test]
    async fn wire_products_are_never_persisted() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        write(
            dir.path(),
            "Products.csv",
            &format!(
                "{PRODUCT_HEADER}W1;Wire;1;Acme;Cables;1;1;0;img\nX1;Lamp;2;Lumo;Light;0;1;0;img\n"
            ),
        );

        let report = run_products_pass(&db, &cfg).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(name_of(&db, "W1").await, None);
        assert_eq!(name_of(&db, "X1").await.as_deref(), Some("Lamp"));
    }

    #[tokio::test]
    async fn product_failure_keeps_earlier_rows_without_transaction() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        fail_inserts_for(&db, "Products", "BOOM").await;
        write(
            dir.path(),
            "Products.csv",
            &format!(
                "{PRODUCT_HEADER}X1;A;1;P;C;0;1;0;img\nBOOM;B;2;P;C;0;1;0;img\nX3;C;3;P;C;0;1;0;img\n"
            ),
        );

        let err = run_products_pass(&db, &cfg).await.unwrap_err();
        assert!(matches!(err, PassError::Row { ref sku, .. } if sku == "BOOM"));
        assert_eq!(name_of(&db, "X1").await.as_deref(), Some("A"));
        assert_eq!(count(&db, "Products").await, 1);
    }

    #[tokio::test]
    async fn transactional_product_pass_rolls_back_on_failure() {
        let (dir, db) = temp_db().await;
        let mut cfg = SyncConfig::with_feed_dir(dir.path());
        cfg.products_transactional = true;
        fail_inserts_for(&db, "Products", "BOOM").await;
        write(
            dir.path(),
            "Products.csv",
            &format!("{PRODUCT_HEADER}X1;A;1;P;C;0;1;0;img\nBOOM;B;2;P;C;0;1;0;img\n"),
        );

        assert!(run_products_pass(&db, &cfg).await.is_err());
        assert_eq!(count(&db, "Products").await, 0);
    }

    #[tokio::test]
    async fn inventory_pass_is_idempotent() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        write(
            dir.path(),
            "Inventory.csv",
            &format!("{INVENTORY_HEADER}X1,szt.,4,24h,9.99\nX2,kg,7,24H,0\n"),
        );

        let first = run_inventory_pass(&db, &cfg).await.unwrap();
        let second = run_inventory_pass(&db, &cfg).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!((second.inserted, second.updated), (0, 2));
        assert_eq!(count(&db, "Inventory").await, 2);

        let (qty, cost): (i64, f64) =
            sqlx::query_as("SELECT Qty, ShippingCost FROM Inventory WHERE SKU = 'X1'")
                .fetch_one(&db.pool)
                .await
                .unwrap();
        assert_eq!(qty, 4);
        assert!((cost - 9.99).abs() < 1e-9);
    }

    #[tokio::test]
    async fn standard_shipping_is_never_persisted() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        write(
            dir.path(),
            "Inventory.csv",
            &format!("{INVENTORY_HEADER}X1,szt.,4,Standard,9.99\n"),
        );

        let report = run_inventory_pass(&db, &cfg).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(count(&db, "Inventory").await, 0);
    }

    #[tokio::test]
    async fn inventory_failure_rolls_back_whole_pass() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        fail_inserts_for(&db, "Inventory", "BOOM").await;
        write(
            dir.path(),
            "Inventory.csv",
            &format!(
                "{INVENTORY_HEADER}X1,szt.,1,24h,1\nX2,szt.,2,24h,2\nBOOM,szt.,3,24h,3\nX4,szt.,4,24h,4\n"
            ),
        );

        let err = run_inventory_pass(&db, &cfg).await.unwrap_err();
        assert!(matches!(
            err,
            PassError::Row {
                feed: FeedKind::Inventory,
                ..
            }
        ));
        assert_eq!(count(&db, "Inventory").await, 0);
    }

    #[tokio::test]
    async fn malformed_inventory_row_aborts_pass() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        write(
            dir.path(),
            "Inventory.csv",
            &format!("{INVENTORY_HEADER}X1,szt.,1,24h,1\nX2,szt.,many,24h,2\n"),
        );

        let err = run_inventory_pass(&db, &cfg).await.unwrap_err();
        assert!(matches!(err, PassError::Feed(FeedError::Row { .. })));
        assert_eq!(count(&db, "Inventory").await, 0);
    }

    #[tokio::test]
    async fn padded_and_over_long_inventory_rows_are_persisted() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        write(
            dir.path(),
            "Inventory.csv",
            &format!("{INVENTORY_HEADER}X1,szt.,4,24h,9.99\nX2,szt., 7,24h, 1.50\nX3,szt.,2,24h,3,\n"),
        );

        let report = run_inventory_pass(&db, &cfg).await.unwrap();
        assert_eq!(report.inserted, 3);

        let qty: i64 = sqlx::query_scalar("SELECT Qty FROM Inventory WHERE SKU = 'X2'")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(qty, 7);
    }

    #[tokio::test]
    async fn prices_failure_rolls_back_whole_pass() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        fail_inserts_for(&db, "Prices", "BOOM").await;
        write(
            dir.path(),
            "Prices.csv",
            "P1,X1,1.00\nP2,X2,2.00\nP3,BOOM,3.00\nP4,X4,4.00\n",
        );

        let err = run_prices_pass(&db, &cfg).await.unwrap_err();
        assert!(matches!(
            err,
            PassError::Row {
                feed: FeedKind::Prices,
                ref sku,
                ..
            } if sku == "BOOM"
        ));
        assert_eq!(count(&db, "Prices").await, 0);
    }

    #[tokio::test]
    async fn prices_are_normalized_and_upserted() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());
        write(
            dir.path(),
            "Prices.csv",
            "P1,X1,\"1,234.56\"\nP2,X2,oops\nP3,,1.00\nP4,X1,\"1,234.56\"\n",
        );

        let report = run_prices_pass(&db, &cfg).await.unwrap();
        assert_eq!(report.read, 4);
        assert_eq!(report.skipped, 2);
        assert_eq!((report.inserted, report.updated), (1, 1));

        let price: f64 = sqlx::query_scalar("SELECT NettPrice FROM Prices WHERE SKU = 'X1'")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert!((price - 1234.56).abs() < 1e-9);

        run_prices_pass(&db, &cfg).await.unwrap();
        assert_eq!(count(&db, "Prices").await, 1);
    }

    #[tokio::test]
    async fn missing_feed_file_fails_only_that_pass() {
        let (dir, db) = temp_db().await;
        let cfg = SyncConfig::with_feed_dir(dir.path());

        let err = run_prices_pass(&db, &cfg).await.unwrap_err();
        assert!(matches!(err, PassError::Feed(FeedError::Open { .. })));
    }
}
