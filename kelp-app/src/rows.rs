//! Presentation row builders
//!
//! Pure transforms from catalog state to the shapes the admin table and
//! public stock browser render. Dangling references display under the
//! bucket they would be reconciled into.

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{Category, Product, Size, DEFAULT_SUBCATEGORY, FALLBACK_CATEGORY};

use crate::catalog::plan_reconciliation;

/// One row of the admin product table
#[derive(Debug, Clone, Serialize)]
pub struct AdminRow {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub subcategory: String,
    /// Quantities aligned with [`Size::ALL`]
    pub quantities: Vec<u32>,
    pub total: u32,
    pub price: Decimal,
}

/// Admin table rows, one per product
pub fn admin_rows(products: &[Product], categories: &[Category]) -> Vec<AdminRow> {
    products
        .iter()
        .map(|product| {
            let plan = plan_reconciliation(&product.category, &product.subcategory, categories);
            AdminRow {
                id: product.id.clone(),
                name: product.name.clone(),
                sku: product.sku.clone(),
                category: plan.category,
                subcategory: plan.subcategory,
                quantities: Size::ALL
                    .iter()
                    .map(|s| product.sizes.quantity(*s))
                    .collect(),
                total: product.total_quantity(),
                price: product.price,
            }
        })
        .collect()
}

/// One subcategory of the public stock browser
#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryStock {
    pub name: String,
    pub products: Vec<Product>,
}

/// One category of the public stock browser
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStock {
    pub name: String,
    pub subcategories: Vec<SubcategoryStock>,
}

/// Category → subcategory → in-stock products
///
/// Out-of-stock products are filtered from the public view. Products
/// whose category no longer exists are grouped under a fallback bucket
/// even before the store has been repaired.
pub fn stock_overview(categories: &[Category], products: &[Product]) -> Vec<CategoryStock> {
    let resolved: Vec<(&Product, String, String)> = products
        .iter()
        .filter(|p| p.in_stock())
        .map(|p| {
            let plan = plan_reconciliation(&p.category, &p.subcategory, categories);
            (p, plan.category, plan.subcategory)
        })
        .collect();

    let mut out = Vec::with_capacity(categories.len());
    for category in categories {
        let mut sub_names = category.subcategories.clone();
        // A redirected product may target "Default" before the patch
        // adding it has landed
        if !sub_names.iter().any(|s| s == DEFAULT_SUBCATEGORY)
            && resolved
                .iter()
                .any(|(_, c, s)| c == &category.name && s == DEFAULT_SUBCATEGORY)
        {
            sub_names.push(DEFAULT_SUBCATEGORY.to_string());
        }
        let subcategories = sub_names
            .iter()
            .map(|sub| SubcategoryStock {
                name: sub.clone(),
                products: resolved
                    .iter()
                    .filter(|(_, c, s)| c == &category.name && s == sub)
                    .map(|(p, _, _)| (*p).clone())
                    .collect(),
            })
            .collect();
        out.push(CategoryStock {
            name: category.name.clone(),
            subcategories,
        });
    }

    let orphans: Vec<Product> = resolved
        .iter()
        .filter(|(_, c, _)| !categories.iter().any(|cat| cat.name == *c))
        .map(|(p, _, _)| (*p).clone())
        .collect();
    if !orphans.is_empty() {
        out.push(CategoryStock {
            name: FALLBACK_CATEGORY.to_string(),
            subcategories: vec![SubcategoryStock {
                name: DEFAULT_SUBCATEGORY.to_string(),
                products: orphans,
            }],
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::SizeChart;

    fn category(id: &str, name: &str, subs: &[&str]) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            subcategories: subs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn product(name: &str, category: &str, subcategory: &str, m_qty: u32) -> Product {
        Product {
            id: name.to_lowercase(),
            name: name.to_string(),
            sku: format!("SKU-{name}"),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            sizes: SizeChart::default().with(Size::M, m_qty),
            price: Decimal::from(10),
            description: None,
            image_url: None,
        }
    }

    #[test]
    fn test_admin_rows_align_quantities_with_sizes() {
        let categories = [category("c1", "Shoes", &["Default"])];
        let products = [product("Runner", "Shoes", "Default", 3)];
        let rows = admin_rows(&products, &categories);
        assert_eq!(rows[0].quantities, [0, 0, 3, 0, 0, 0, 0]);
        assert_eq!(rows[0].total, 3);
    }

    #[test]
    fn test_stock_overview_filters_out_of_stock() {
        let categories = [category("c1", "Shoes", &["Default"])];
        let products = [
            product("Runner", "Shoes", "Default", 1),
            product("Sold Out", "Shoes", "Default", 0),
        ];
        let overview = stock_overview(&categories, &products);
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].subcategories[0].products.len(), 1);
        assert_eq!(overview[0].subcategories[0].products[0].name, "Runner");
    }

    #[test]
    fn test_stock_overview_groups_orphans_under_fallback() {
        let categories = [category("c1", "Shoes", &["Default"])];
        let products = [product("Hat", "Hats", "Caps", 2)];
        let overview = stock_overview(&categories, &products);
        let fallback = overview.last().unwrap();
        assert_eq!(fallback.name, FALLBACK_CATEGORY);
        assert_eq!(fallback.subcategories[0].name, DEFAULT_SUBCATEGORY);
        assert_eq!(fallback.subcategories[0].products[0].name, "Hat");
    }

    #[test]
    fn test_stock_overview_shows_pending_default_bucket() {
        let categories = [category("c1", "Shoes", &["Running"])];
        let products = [product("Walker", "Shoes", "Hiking", 1)];
        let overview = stock_overview(&categories, &products);
        let shoes = &overview[0];
        let default_bucket = shoes
            .subcategories
            .iter()
            .find(|s| s.name == DEFAULT_SUBCATEGORY)
            .expect("redirected product surfaces a Default bucket");
        assert_eq!(default_bucket.products[0].name, "Walker");
    }
}
