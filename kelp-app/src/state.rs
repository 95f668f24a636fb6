//! Shared in-memory catalog state
//!
//! Mirrors the two subscribed collections. Lists are replaced wholesale
//! per snapshot; locks are held only for the swap, never across await
//! points.

use parking_lot::RwLock;
use shared::models::{Category, Product};
use std::sync::atomic::{AtomicBool, Ordering};

/// Live mirror of the categories and products collections
#[derive(Debug, Default)]
pub struct CatalogState {
    categories: RwLock<Vec<Category>>,
    products: RwLock<Vec<Product>>,
    categories_loaded: AtomicBool,
    products_loaded: AtomicBool,
    warnings: RwLock<Vec<String>>,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current category list (cloned snapshot)
    pub fn categories(&self) -> Vec<Category> {
        self.categories.read().clone()
    }

    /// Current product list (cloned snapshot)
    pub fn products(&self) -> Vec<Product> {
        self.products.read().clone()
    }

    pub fn categories_loaded(&self) -> bool {
        self.categories_loaded.load(Ordering::Acquire)
    }

    pub fn products_loaded(&self) -> bool {
        self.products_loaded.load(Ordering::Acquire)
    }

    /// Both collections have completed their first load
    pub fn loaded(&self) -> bool {
        self.categories_loaded() && self.products_loaded()
    }

    /// Warnings accumulated from degraded subscriptions
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.read().clone()
    }

    pub fn category_by_name(&self, name: &str) -> Option<Category> {
        self.categories.read().iter().find(|c| c.name == name).cloned()
    }

    pub fn category_by_id(&self, id: &str) -> Option<Category> {
        self.categories.read().iter().find(|c| c.id == id).cloned()
    }

    pub fn product_by_id(&self, id: &str) -> Option<Product> {
        self.products.read().iter().find(|p| p.id == id).cloned()
    }

    /// Where a product's references resolve for display purposes
    ///
    /// A dangling reference reads as the fallback bucket without writing
    /// anything; the store itself is only repaired inside catalog
    /// operations.
    pub fn effective_refs(&self, product: &Product) -> (String, String) {
        let categories = self.categories.read();
        let plan =
            crate::catalog::plan_reconciliation(&product.category, &product.subcategory, &categories);
        (plan.category, plan.subcategory)
    }

    /// Products whose references resolve to `(category, subcategory)`
    pub fn products_in(&self, category: &str, subcategory: &str) -> Vec<Product> {
        self.products
            .read()
            .iter()
            .filter(|p| {
                let (cat, sub) = self.effective_refs(p);
                cat == category && sub == subcategory
            })
            .cloned()
            .collect()
    }

    pub(crate) fn replace_categories(&self, mut list: Vec<Category>) {
        list.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        *self.categories.write() = list;
        self.categories_loaded.store(true, Ordering::Release);
    }

    pub(crate) fn replace_products(&self, mut list: Vec<Product>) {
        list.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        *self.products.write() = list;
        self.products_loaded.store(true, Ordering::Release);
    }

    pub(crate) fn mark_categories_loaded(&self) {
        self.categories_loaded.store(true, Ordering::Release);
    }

    pub(crate) fn mark_products_loaded(&self) {
        self.products_loaded.store(true, Ordering::Release);
    }

    pub(crate) fn push_warning(&self, message: String) {
        self.warnings.write().push(message);
    }
}
