//! Raw feed records, one struct per feed.
//!
//! Header labels are mapped onto fields with serde renames. Every text field
//! is optional: an empty cell decodes as `None` and the filter decides whether
//! the record is usable.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{de, Deserialize, Deserializer};

/// Row of `Products.csv` (`;`-delimited, header row).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "SKU")]
    pub sku: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "EAN")]
    pub ean: Option<String>,
    pub producer_name: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_wire: bool,
    #[serde(default, deserialize_with = "flag")]
    pub available: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_vendor: bool,
    pub default_image: Option<String>,
}

/// Row of `Inventory.csv` (`,`-delimited, header row).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InventoryRecord {
    pub sku: Option<String>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "int_opt")]
    pub qty: Option<i64>,
    pub shipping: Option<String>,
    #[serde(default, deserialize_with = "decimal_opt")]
    pub shipping_cost: Option<BigDecimal>,
}

/// Row of `Prices.csv`. The feed has no header; fields are picked by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceRecord {
    pub sku: Option<String>,
    pub nett_price: Option<String>,
}

impl PriceRecord {
    pub const SKU_INDEX: usize = 1;
    pub const NETT_PRICE_INDEX: usize = 2;

    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut record = Self::default();
        for (idx, field) in fields.into_iter().enumerate() {
            match idx {
                Self::SKU_INDEX => record.sku = Some(field.to_string()),
                Self::NETT_PRICE_INDEX => record.nett_price = Some(field.to_string()),
                _ => {}
            }
        }
        record
    }
}

/// Lenient boolean: `1/0`, `true/false`, `yes/no`, `y/n`; empty is false.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n" => Ok(false),
        "1" | "true" | "yes" | "y" => Ok(true),
        other => Err(de::Error::custom(format!("invalid flag value {other:?}"))),
    }
}

fn int_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<i64>()
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid integer {text:?}: {e}"))),
    }
}

fn decimal_opt<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => BigDecimal::from_str(text)
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid decimal {text:?}: {e}"))),
    }
}
