//! Catalog service - the sole writer of categories and products
//!
//! Keeps category/subcategory/product references mutually consistent
//! against an eventually-consistent store: product saves are validated
//! against the live category set and rehomed into the
//! `("Uncategorized", "Default")` fallback bucket when their references
//! are dangling, and category/subcategory deletions cascade by
//! reassigning affected products - always inside a single write batch so
//! a concurrent reader never observes the repair half-done.
//!
//! Writes are fire-and-forget against the subscribed snapshot: nothing
//! is mutated locally on success or failure, the next snapshot carries
//! the truth.

use std::sync::Arc;
use std::time::Duration;

use kelp_store::{doc_path, StoreBackend, WriteBatch, CATEGORIES, PRODUCTS};
use serde_json::Value;
use shared::models::{
    normalize_subcategories, Category, CategoryDraft, Product, ProductDraft, Size,
    DEFAULT_SUBCATEGORY, FALLBACK_CATEGORY,
};
use shared::{Error, Result};

use crate::state::CatalogState;

/// Category repair scheduled alongside a product write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFix {
    /// The fallback category does not exist remotely yet
    CreateFallback,
    /// A category's subcategory list must gain `"Default"`
    AddDefault { category_id: String },
}

/// Where a product's stated references resolve against a category list,
/// plus the category fixes that must ride in the same write batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub category: String,
    pub subcategory: String,
    pub fixes: Vec<CategoryFix>,
}

impl ReconcilePlan {
    /// True when the stated references were already valid as-is
    pub fn is_noop_for(&self, category: &str, subcategory: &str) -> bool {
        self.fixes.is_empty() && self.category == category && self.subcategory == subcategory
    }
}

/// Resolve `(category, subcategory)` against `categories`
///
/// Pure planning step: an unknown category redirects to the fallback
/// bucket, an unknown subcategory redirects to `"Default"` within its
/// category, and any category document that must be created or patched
/// for the redirect to be valid is listed as a fix.
pub fn plan_reconciliation(
    category: &str,
    subcategory: &str,
    categories: &[Category],
) -> ReconcilePlan {
    match categories.iter().find(|c| c.name == category) {
        Some(cat) if cat.has_subcategory(subcategory) => ReconcilePlan {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            fixes: Vec::new(),
        },
        Some(cat) => {
            // Known category, dangling subcategory
            let fixes = if cat.has_subcategory(DEFAULT_SUBCATEGORY) {
                Vec::new()
            } else {
                vec![CategoryFix::AddDefault {
                    category_id: cat.id.clone(),
                }]
            };
            ReconcilePlan {
                category: category.to_string(),
                subcategory: DEFAULT_SUBCATEGORY.to_string(),
                fixes,
            }
        }
        None => ReconcilePlan {
            // Unknown category: rehome to the fallback bucket
            category: FALLBACK_CATEGORY.to_string(),
            subcategory: DEFAULT_SUBCATEGORY.to_string(),
            fixes: fallback_fixes(categories),
        },
    }
}

/// Catalog write operations
#[derive(Clone)]
pub struct CatalogService {
    backend: Arc<dyn StoreBackend>,
    state: Arc<CatalogState>,
    save_timeout: Duration,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("save_timeout", &self.save_timeout)
            .finish()
    }
}

impl CatalogService {
    pub fn new(
        backend: Arc<dyn StoreBackend>,
        state: Arc<CatalogState>,
        save_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            state,
            save_timeout,
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Validate, reconcile, and persist a product draft
    ///
    /// Category fixes and the product document go out as one batch, so a
    /// product is never visible referencing a bucket that does not
    /// exist. Returns the product as written (references possibly
    /// redirected).
    pub async fn save_product(&self, draft: ProductDraft) -> Result<Product> {
        validate_product_draft(&draft)?;

        let categories = self.state.categories();
        let plan = plan_reconciliation(&draft.category, &draft.subcategory, &categories);
        if !plan.is_noop_for(&draft.category, &draft.subcategory) {
            tracing::info!(
                "Redirecting product {:?} from ({}, {}) to ({}, {})",
                draft.name,
                draft.category,
                draft.subcategory,
                plan.category,
                plan.subcategory
            );
        }

        let id = match &draft.id {
            Some(id) => id.clone(),
            None => self.backend.generate_id(PRODUCTS),
        };
        let product = Product {
            id: id.clone(),
            name: draft.name.trim().to_string(),
            sku: draft.sku.trim().to_string(),
            category: plan.category.clone(),
            subcategory: plan.subcategory.clone(),
            sizes: draft.sizes,
            price: draft.price,
            description: draft.description,
            image_url: draft.image_url,
        };

        let mut batch = WriteBatch::new();
        self.push_fixes(&mut batch, &plan.fixes, &categories)?;
        batch.set(doc_path(PRODUCTS, &id), &product)?;

        match tokio::time::timeout(self.save_timeout, self.write(batch)).await {
            Ok(result) => result.map(|_| product),
            Err(_) => {
                tracing::error!(
                    "Product save timed out after {:?}; the write may still land",
                    self.save_timeout
                );
                Err(Error::Timeout)
            }
        }
    }

    /// Delete a product document
    pub async fn delete_product(&self, id: &str) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.delete(doc_path(PRODUCTS, id));
        self.write(batch).await
    }

    /// Sell one unit of `size`
    ///
    /// A size already at zero is a silent no-op - the quantity never
    /// goes negative, even when invoked with the button disabled.
    pub async fn sell_one(&self, product_id: &str, size: Size) -> Result<u32> {
        let Some(product) = self.state.product_by_id(product_id) else {
            return Err(Error::validation(format!("Unknown product: {product_id}")));
        };
        let quantity = product.sizes.quantity(size);
        if quantity == 0 {
            return Ok(0);
        }
        let path = format!("{}/sizes/{}", doc_path(PRODUCTS, product_id), size);
        self.backend
            .set_path(&path, Value::from(quantity - 1))
            .await
            .map_err(|err| {
                tracing::error!("Stock decrement failed: {err}");
                Error::from(err)
            })?;
        Ok(quantity - 1)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Create a category from a draft
    pub async fn create_category(&self, draft: CategoryDraft) -> Result<Category> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::field_validation("name", "Category name is required"));
        }
        let categories = self.state.categories();
        if categories
            .iter()
            .any(|c| c.name.to_lowercase() == name.to_lowercase())
        {
            return Err(Error::field_validation(
                "name",
                format!("Category {name:?} already exists"),
            ));
        }

        let category = Category {
            id: self.backend.generate_id(CATEGORIES),
            name,
            subcategories: normalize_subcategories(draft.subcategories),
        };
        let mut batch = WriteBatch::new();
        batch.set(doc_path(CATEGORIES, &category.id), &category)?;
        self.write(batch).await?;
        Ok(category)
    }

    /// Add a subcategory to an existing category
    pub async fn add_subcategory(&self, category_id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::field_validation(
                "subcategory",
                "Subcategory name is required",
            ));
        }
        let Some(category) = self.state.category_by_id(category_id) else {
            return Err(Error::validation(format!(
                "Unknown category: {category_id}"
            )));
        };
        if category.has_subcategory(name) {
            return Err(Error::field_validation(
                "subcategory",
                format!("Subcategory {name:?} already exists"),
            ));
        }

        let mut subcategories = category.subcategories.clone();
        subcategories.push(name.to_string());
        self.write_subcategories(category_id, subcategories, WriteBatch::new())
            .await
    }

    /// Delete a category, reassigning its products to the fallback bucket
    ///
    /// Every product in the category moves to
    /// `("Uncategorized", "Default")`, the fallback category is created
    /// or patched if needed, and the category document is removed - all
    /// in one batch. Deleting `"Uncategorized"` is rejected before any
    /// write.
    pub async fn delete_category(&self, category_id: &str) -> Result<()> {
        let categories = self.state.categories();
        let Some(category) = categories.iter().find(|c| c.id == category_id) else {
            return Err(Error::validation(format!(
                "Unknown category: {category_id}"
            )));
        };
        if category.is_fallback() {
            return Err(Error::validation(
                "The Uncategorized category cannot be deleted",
            ));
        }

        let affected: Vec<Product> = self
            .state
            .products()
            .into_iter()
            .filter(|p| p.category == category.name)
            .collect();

        let mut batch = WriteBatch::new();
        if !affected.is_empty() {
            self.push_fixes(&mut batch, &fallback_fixes(&categories), &categories)?;
        }
        for product in affected {
            let moved = Product {
                category: FALLBACK_CATEGORY.to_string(),
                subcategory: DEFAULT_SUBCATEGORY.to_string(),
                ..product
            };
            batch.set(doc_path(PRODUCTS, &moved.id), &moved)?;
        }
        batch.delete(doc_path(CATEGORIES, category_id));

        tracing::info!("Deleting category {:?} ({})", category.name, category_id);
        self.write(batch).await
    }

    /// Delete a subcategory, reassigning its products to `"Default"`
    ///
    /// Products in `(category, name)` move to `(category, "Default")`;
    /// `"Default"` is added to the list in the same batch when missing,
    /// and the list is never left empty. Deleting
    /// `Uncategorized/Default`, the sole remaining `"Default"` of any
    /// other category, or a `"Default"` that still has products, is
    /// rejected before any write.
    pub async fn delete_subcategory(&self, category_id: &str, name: &str) -> Result<()> {
        let Some(category) = self.state.category_by_id(category_id) else {
            return Err(Error::validation(format!(
                "Unknown category: {category_id}"
            )));
        };
        if !category.has_subcategory(name) {
            return Err(Error::validation(format!(
                "Category {:?} has no subcategory {name:?}",
                category.name
            )));
        }
        if category.is_fallback() && name == DEFAULT_SUBCATEGORY {
            return Err(Error::validation(
                "The Default subcategory of Uncategorized cannot be deleted",
            ));
        }
        if name == DEFAULT_SUBCATEGORY && category.subcategories.len() == 1 {
            return Err(Error::validation(
                "This is the only subcategory left; delete the category instead",
            ));
        }

        let affected: Vec<Product> = self
            .state
            .products()
            .into_iter()
            .filter(|p| p.category == category.name && p.subcategory == name)
            .collect();

        // Reassignment targets "Default"; deleting "Default" out from
        // under its own products would be contradictory, so refuse.
        if name == DEFAULT_SUBCATEGORY && !affected.is_empty() {
            return Err(Error::validation(
                "Products still use the Default subcategory; move them first",
            ));
        }

        let mut subcategories: Vec<String> = category
            .subcategories
            .iter()
            .filter(|s| s.as_str() != name)
            .cloned()
            .collect();
        if !affected.is_empty() {
            subcategories.push(DEFAULT_SUBCATEGORY.to_string());
        }

        let mut batch = WriteBatch::new();
        for product in affected {
            let moved = Product {
                subcategory: DEFAULT_SUBCATEGORY.to_string(),
                ..product
            };
            batch.set(doc_path(PRODUCTS, &moved.id), &moved)?;
        }
        self.write_subcategories(category_id, subcategories, batch)
            .await
    }

    // =========================================================================
    // Advisory checks
    // =========================================================================

    /// Whether any current product references the category by name
    pub fn category_in_use(&self, name: &str) -> bool {
        self.state.products().iter().any(|p| p.category == name)
    }

    /// Whether any current product references `(category, subcategory)`
    pub fn subcategory_in_use(&self, category: &str, subcategory: &str) -> bool {
        self.state
            .products()
            .iter()
            .any(|p| p.category == category && p.subcategory == subcategory)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn push_fixes(
        &self,
        batch: &mut WriteBatch,
        fixes: &[CategoryFix],
        categories: &[Category],
    ) -> Result<()> {
        for fix in fixes {
            match fix {
                CategoryFix::CreateFallback => {
                    let id = self.backend.generate_id(CATEGORIES);
                    batch.set(doc_path(CATEGORIES, &id), &Category::fallback())?;
                }
                CategoryFix::AddDefault { category_id } => {
                    let Some(category) = categories.iter().find(|c| c.id == *category_id) else {
                        continue;
                    };
                    let mut subcategories = category.subcategories.clone();
                    subcategories.push(DEFAULT_SUBCATEGORY.to_string());
                    batch.set(
                        format!("{}/subcategories", doc_path(CATEGORIES, category_id)),
                        &normalize_subcategories(subcategories),
                    )?;
                }
            }
        }
        Ok(())
    }

    async fn write_subcategories(
        &self,
        category_id: &str,
        subcategories: Vec<String>,
        mut batch: WriteBatch,
    ) -> Result<()> {
        batch.set(
            format!("{}/subcategories", doc_path(CATEGORIES, category_id)),
            &normalize_subcategories(subcategories),
        )?;
        self.write(batch).await
    }

    async fn write(&self, batch: WriteBatch) -> Result<()> {
        self.backend.write_batch(batch).await.map_err(|err| {
            tracing::error!("Store write failed: {err}");
            Error::from(err)
        })
    }
}

/// Fixes required for the fallback bucket to exist with `"Default"`
fn fallback_fixes(categories: &[Category]) -> Vec<CategoryFix> {
    match categories.iter().find(|c| c.name == FALLBACK_CATEGORY) {
        None => vec![CategoryFix::CreateFallback],
        Some(fallback) if !fallback.has_subcategory(DEFAULT_SUBCATEGORY) => {
            vec![CategoryFix::AddDefault {
                category_id: fallback.id.clone(),
            }]
        }
        Some(_) => Vec::new(),
    }
}

fn validate_product_draft(draft: &ProductDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(Error::field_validation("name", "Product name is required"));
    }
    if draft.sku.trim().is_empty() {
        return Err(Error::field_validation("sku", "SKU is required"));
    }
    if draft.category.trim().is_empty() {
        return Err(Error::field_validation("category", "Category is required"));
    }
    if draft.price.is_sign_negative() {
        return Err(Error::field_validation("price", "Price cannot be negative"));
    }
    Ok(())
}
