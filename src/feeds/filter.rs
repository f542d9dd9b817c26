//! Inclusion rules and required-field checks that turn raw feed records into
//! rows eligible for reconciliation. A `None` means "skip this record".

use std::str::FromStr;

use bigdecimal::BigDecimal;

use super::{InventoryRecord, PriceRecord, ProductRecord};
use crate::database_ops::catalog::{InventoryRow, PriceRow, ProductRow};

/// Only inventory with this shipping class is persisted (case-insensitive).
pub const EXPRESS_SHIPPING: &str = "24h";

/// Products that are neither wire goods nor vendor items and are available.
pub fn is_listed(record: &ProductRecord) -> bool {
    !record.is_wire && record.available && !record.is_vendor
}

pub fn product(record: ProductRecord) -> Option<ProductRow> {
    if !is_listed(&record) {
        return None;
    }
    Some(ProductRow {
        sku: record.sku?,
        name: record.name?,
        ean: record.ean?,
        producer_name: record.producer_name?,
        category: record.category?,
        default_image: record.default_image?,
    })
}

pub fn inventory(record: InventoryRecord) -> Option<InventoryRow> {
    let InventoryRecord {
        sku,
        unit,
        qty,
        shipping,
        shipping_cost,
    } = record;
    let (sku, unit, qty, shipping, shipping_cost) = (sku?, unit?, qty?, shipping?, shipping_cost?);

    if !shipping.eq_ignore_ascii_case(EXPRESS_SHIPPING) {
        return None;
    }
    Some(InventoryRow {
        sku,
        qty,
        unit,
        shipping_cost,
    })
}

pub fn price(record: PriceRecord) -> Option<PriceRow> {
    let sku = record.sku.filter(|s| !s.trim().is_empty())?;
    let nett_price = normalize_price(record.nett_price.as_deref()?)?;
    Some(PriceRow { sku, nett_price })
}

/// Strip thousands separators and surrounding whitespace, then parse.
/// Text that is still not a decimal number after cleaning yields `None`.
pub fn normalize_price(text: &str) -> Option<BigDecimal> {
    let cleaned = text.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    BigDecimal::from_str(cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed_product(sku: &str) -> ProductRecord {
        ProductRecord {
            sku: Some(sku.to_string()),
            name: Some("Widget".to_string()),
            ean: Some("5901234123457".to_string()),
            producer_name: Some("Acme".to_string()),
            category: Some("Tools".to_string()),
            is_wire: false,
            available: true,
            is_vendor: false,
            default_image: Some("http://img/w.jpg".to_string()),
        }
    }

    fn express_inventory(sku: &str) -> InventoryRecord {
        InventoryRecord {
            sku: Some(sku.to_string()),
            unit: Some("szt.".to_string()),
            qty: Some(3),
            shipping: Some("24h".to_string()),
            shipping_cost: BigDecimal::from_str("12.50").ok(),
        }
    }

    #[test]
    fn wire_products_are_never_eligible() {
        let mut rec = listed_product("X1");
        rec.is_wire = true;
        assert!(product(rec).is_none());
    }

    #[test]
    fn vendor_or_unavailable_products_are_dropped() {
        let mut vendor = listed_product("X1");
        vendor.is_vendor = true;
        assert!(product(vendor).is_none());

        let mut unavailable = listed_product("X2");
        unavailable.available = false;
        assert!(product(unavailable).is_none());
    }

    #[test]
    fn product_requires_all_persisted_fields() {
        let mut rec = listed_product("X1");
        rec.default_image = None;
        assert!(product(rec).is_none());

        let row = product(listed_product("X2")).unwrap();
        assert_eq!(row.sku, "X2");
        assert_eq!(row.name, "Widget");
    }

    #[test]
    fn inventory_shipping_gate_is_case_insensitive() {
        let mut rec = express_inventory("X1");
        rec.shipping = Some("24H".to_string());
        assert!(inventory(rec).is_some());

        let mut standard = express_inventory("X1");
        standard.shipping = Some("Standard".to_string());
        assert!(inventory(standard).is_none());
    }

    #[test]
    fn inventory_requires_cost_and_qty() {
        let mut no_cost = express_inventory("X1");
        no_cost.shipping_cost = None;
        assert!(inventory(no_cost).is_none());

        let mut no_qty = express_inventory("X1");
        no_qty.qty = None;
        assert!(inventory(no_qty).is_none());
    }

    #[test]
    fn price_normalization_strips_grouping_separators() {
        assert_eq!(
            normalize_price(" 1,234.56 "),
            BigDecimal::from_str("1234.56").ok()
        );
        assert_eq!(normalize_price("12"), BigDecimal::from_str("12").ok());
        assert_eq!(normalize_price("12 PLN"), None);
        assert_eq!(normalize_price("  "), None);
    }

    #[test]
    fn price_requires_sku_and_text() {
        let ok = price(PriceRecord {
            sku: Some("X1".to_string()),
            nett_price: Some("1,234.56".to_string()),
        })
        .unwrap();
        assert_eq!(ok.nett_price, BigDecimal::from_str("1234.56").unwrap());

        assert!(price(PriceRecord {
            sku: None,
            nett_price: Some("1.00".to_string()),
        })
        .is_none());
        assert!(price(PriceRecord {
            sku: Some("X1".to_string()),
            nett_price: Some(String::new()),
        })
        .is_none());
    }
}
