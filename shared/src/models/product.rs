//! Product model

use super::size::SizeChart;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
///
/// `category` / `subcategory` are denormalized name references into the
/// category set, resolved by name at read/write time. They are repaired
/// against the live category list before every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Document id (lives in the store path, not in the document)
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub sku: String,
    /// Category reference (by name, not id)
    pub category: String,
    /// Subcategory reference (by name)
    pub subcategory: String,
    /// Older documents may omit this field entirely; missing means all zero
    #[serde(default)]
    pub sizes: SizeChart,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Total quantity across all sizes
    pub fn total_quantity(&self) -> u32 {
        self.sizes.total()
    }

    pub fn in_stock(&self) -> bool {
        self.total_quantity() > 0
    }
}

/// Save-product payload (creates a new product when `id` is `None`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub subcategory: String,
    #[serde(default)]
    pub sizes: SizeChart,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}
