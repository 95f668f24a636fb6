//! Catalog reconciliation against the in-memory store

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{admin_app, build_app, draft, draft_with_stock, wait_for};
use kelp_app::{AppConfig, InMemoryHistory, StaticAuth, StockApp};
use kelp_store::{
    MemoryStore, StoreBackend, StoreError, StoreResult, SubscriptionHandle, WriteBatch,
};
use serde_json::Value;
use shared::models::{CategoryDraft, Size, DEFAULT_SUBCATEGORY, FALLBACK_CATEGORY};
use shared::Error;

fn category_draft(name: &str, subcategories: &[&str]) -> CategoryDraft {
    CategoryDraft {
        name: name.to_string(),
        subcategories: subcategories.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_orphan_product_is_rehomed_on_save() {
    let (app, store, _history) = admin_app().await;

    let saved = app
        .save_product(draft("Hat", "HT-1", "Ghost", "Nowhere"))
        .await
        .unwrap();
    assert_eq!(saved.category, FALLBACK_CATEGORY);
    assert_eq!(saved.subcategory, DEFAULT_SUBCATEGORY);

    // The fallback category was created in the same batch
    wait_for(&app, |state| {
        state
            .category_by_name(FALLBACK_CATEGORY)
            .is_some_and(|c| c.has_subcategory(DEFAULT_SUBCATEGORY))
    })
    .await;
    assert_eq!(store.document_count("categories"), 1);
    wait_for(&app, |state| {
        state
            .products()
            .iter()
            .any(|p| p.name == "Hat" && p.category == FALLBACK_CATEGORY)
    })
    .await;
}

#[tokio::test]
async fn test_unknown_subcategory_redirects_to_default() {
    let (app, _store, _history) = admin_app().await;

    app.create_category(category_draft("Shoes", &["Running"]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shoes").is_some()).await;

    let saved = app
        .save_product(draft("Walker", "SH-2", "Shoes", "Hiking"))
        .await
        .unwrap();
    assert_eq!(saved.category, "Shoes");
    assert_eq!(saved.subcategory, DEFAULT_SUBCATEGORY);

    // "Default" was added to the category in the same batch, kept sorted
    wait_for(&app, |state| {
        state
            .category_by_name("Shoes")
            .is_some_and(|c| c.subcategories == ["Default", "Running"])
    })
    .await;
}

#[tokio::test]
async fn test_saving_valid_product_schedules_no_category_writes() {
    let (app, store, _history) = admin_app().await;

    app.create_category(category_draft("Shoes", &[]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shoes").is_some()).await;

    let saved = app
        .save_product(draft("Runner", "SH-1", "Shoes", DEFAULT_SUBCATEGORY))
        .await
        .unwrap();
    assert_eq!(saved.category, "Shoes");

    // Saving again (an edit) still touches no category document
    let mut again = draft("Runner", "SH-1", "Shoes", DEFAULT_SUBCATEGORY);
    again.id = Some(saved.id.clone());
    wait_for(&app, |state| !state.products().is_empty()).await;
    app.save_product(again).await.unwrap();

    assert_eq!(store.document_count("categories"), 1);
    let shoes = app
        .catalog_state()
        .category_by_name("Shoes")
        .expect("category present");
    assert_eq!(shoes.subcategories, [DEFAULT_SUBCATEGORY]);
}

#[tokio::test]
async fn test_delete_category_reassigns_products() {
    let (app, store, _history) = admin_app().await;

    let shoes = app
        .create_category(category_draft("Shoes", &["Running"]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shoes").is_some()).await;
    app.save_product(draft("Runner", "SH-1", "Shoes", "Running"))
        .await
        .unwrap();
    wait_for(&app, |state| !state.products().is_empty()).await;

    assert!(app.category_in_use("Shoes"));
    app.delete_category(&shoes.id).await.unwrap();

    wait_for(&app, |state| state.category_by_name("Shoes").is_none()).await;
    wait_for(&app, |state| {
        state
            .products()
            .iter()
            .all(|p| p.category == FALLBACK_CATEGORY && p.subcategory == DEFAULT_SUBCATEGORY)
    })
    .await;
    // Fallback created, Shoes removed
    assert_eq!(store.document_count("categories"), 1);
}

#[tokio::test]
async fn test_deleting_fallback_category_is_rejected_without_writes() {
    let (app, store, _history) = admin_app().await;

    // Materialize the fallback bucket
    app.save_product(draft("Hat", "HT-1", "Ghost", "Nowhere"))
        .await
        .unwrap();
    wait_for(&app, |state| {
        state.category_by_name(FALLBACK_CATEGORY).is_some()
    })
    .await;
    let fallback = app
        .catalog_state()
        .category_by_name(FALLBACK_CATEGORY)
        .unwrap();

    let err = app.delete_category(&fallback.id).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(store.document_count("categories"), 1);
    assert_eq!(store.document_count("products"), 1);
}

#[tokio::test]
async fn test_delete_subcategory_reassigns_and_keeps_list_nonempty() {
    let (app, _store, _history) = admin_app().await;

    let shoes = app
        .create_category(category_draft("Shoes", &["Default", "Running"]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shoes").is_some()).await;
    app.save_product(draft("Runner", "SH-1", "Shoes", "Running"))
        .await
        .unwrap();
    wait_for(&app, |state| !state.products().is_empty()).await;

    assert!(app.subcategory_in_use("Shoes", "Running"));
    app.delete_subcategory(&shoes.id, "Running").await.unwrap();

    wait_for(&app, |state| {
        state
            .category_by_name("Shoes")
            .is_some_and(|c| c.subcategories == [DEFAULT_SUBCATEGORY])
    })
    .await;
    wait_for(&app, |state| {
        state
            .products()
            .iter()
            .all(|p| p.category == "Shoes" && p.subcategory == DEFAULT_SUBCATEGORY)
    })
    .await;
}

#[tokio::test]
async fn test_deleting_last_subcategory_readds_default() {
    let (app, _store, _history) = admin_app().await;

    let shoes = app
        .create_category(category_draft("Shoes", &["Running"]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shoes").is_some()).await;

    app.delete_subcategory(&shoes.id, "Running").await.unwrap();
    wait_for(&app, |state| {
        state
            .category_by_name("Shoes")
            .is_some_and(|c| c.subcategories == [DEFAULT_SUBCATEGORY])
    })
    .await;
}

#[tokio::test]
async fn test_guarded_subcategory_deletions_are_rejected() {
    let (app, _store, _history) = admin_app().await;

    // Uncategorized/Default can never be deleted
    app.save_product(draft("Hat", "HT-1", "Ghost", "Nowhere"))
        .await
        .unwrap();
    wait_for(&app, |state| {
        state.category_by_name(FALLBACK_CATEGORY).is_some()
    })
    .await;
    let fallback = app
        .catalog_state()
        .category_by_name(FALLBACK_CATEGORY)
        .unwrap();
    assert!(app
        .delete_subcategory(&fallback.id, DEFAULT_SUBCATEGORY)
        .await
        .unwrap_err()
        .is_validation());

    // A sole remaining "Default" must go by deleting the whole category
    let shoes = app
        .create_category(category_draft("Shoes", &[]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shoes").is_some()).await;
    assert!(app
        .delete_subcategory(&shoes.id, DEFAULT_SUBCATEGORY)
        .await
        .unwrap_err()
        .is_validation());

    // "Default" with products still in it is contradictory to delete
    let shirts = app
        .create_category(category_draft("Shirts", &["Default", "Summer"]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shirts").is_some()).await;
    app.save_product(draft("Tee", "TS-1", "Shirts", "Default"))
        .await
        .unwrap();
    wait_for(&app, |state| {
        state.products().iter().any(|p| p.name == "Tee")
    })
    .await;
    assert!(app
        .delete_subcategory(&shirts.id, DEFAULT_SUBCATEGORY)
        .await
        .unwrap_err()
        .is_validation());
}

#[tokio::test]
async fn test_sell_decrements_one_size_and_stops_at_zero() {
    let (app, _store, _history) = admin_app().await;

    app.create_category(category_draft("Shoes", &[]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shoes").is_some()).await;
    let saved = app
        .save_product(draft_with_stock(
            "Runner",
            "SH-1",
            "Shoes",
            DEFAULT_SUBCATEGORY,
            Size::M,
            1,
        ))
        .await
        .unwrap();
    wait_for(&app, |state| !state.products().is_empty()).await;

    assert_eq!(app.sell(&saved.id, Size::M).await.unwrap(), 0);
    wait_for(&app, |state| {
        state
            .product_by_id(&saved.id)
            .is_some_and(|p| p.sizes.quantity(Size::M) == 0)
    })
    .await;

    // Already at zero: silent no-op, nothing else touched
    assert_eq!(app.sell(&saved.id, Size::M).await.unwrap(), 0);
    let product = app.catalog_state().product_by_id(&saved.id).unwrap();
    assert_eq!(product.sizes.quantity(Size::M), 0);
    assert_eq!(product.sizes.total(), 0);
}

#[tokio::test]
async fn test_duplicate_category_name_is_rejected_case_insensitively() {
    let (app, _store, _history) = admin_app().await;

    app.create_category(category_draft("Shoes", &[]))
        .await
        .unwrap();
    wait_for(&app, |state| state.category_by_name("Shoes").is_some()).await;

    let err = app
        .create_category(category_draft("SHOES", &[]))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_admin_mutations_require_identity() {
    let (mut app, _store, _history) = build_app();
    app.start().await;
    wait_for(&app, |state| state.loaded()).await;

    let err = app
        .save_product(draft("Hat", "HT-1", "Ghost", "Nowhere"))
        .await
        .unwrap_err();
    assert_eq!(err, Error::PermissionDenied);
}

#[tokio::test]
async fn test_write_failure_surfaces_without_local_mutation() {
    let (app, store, _history) = admin_app().await;

    store.fail_next_write(StoreError::NetworkUnavailable);
    let err = app
        .save_product(draft("Hat", "HT-1", "Ghost", "Nowhere"))
        .await
        .unwrap_err();
    assert_eq!(err, Error::NetworkUnavailable);

    // Nothing was optimistically applied
    assert!(app.catalog_state().products().is_empty());
    assert_eq!(store.document_count("products"), 0);
}

#[tokio::test]
async fn test_degraded_subscription_still_marks_loaded() {
    let (mut app, store, _history) = build_app();
    store.fail_subscriptions("products", StoreError::PermissionDenied);
    app.start().await;

    wait_for(&app, |state| state.loaded()).await;
    assert!(app.catalog_state().products().is_empty());
    assert!(!app.warnings().is_empty());
}

/// Backend whose writes never complete, for exercising the save budget
#[derive(Debug, Clone)]
struct StalledStore {
    inner: MemoryStore,
}

#[async_trait]
impl StoreBackend for StalledStore {
    async fn read(&self, path: &str) -> StoreResult<Option<Value>> {
        self.inner.read(path).await
    }

    async fn write_batch(&self, _batch: WriteBatch) -> StoreResult<()> {
        std::future::pending::<()>().await;
        unreachable!()
    }

    async fn set_path(&self, path: &str, value: Value) -> StoreResult<()> {
        self.inner.set_path(path, value).await
    }

    fn generate_id(&self, collection: &str) -> String {
        self.inner.generate_id(collection)
    }

    async fn subscribe(&self, collection: &str) -> StoreResult<SubscriptionHandle> {
        self.inner.subscribe(collection).await
    }
}

#[tokio::test]
async fn test_save_times_out_on_stalled_store() {
    let store = StalledStore {
        inner: MemoryStore::new(),
    };
    let auth = StaticAuth::new().with_user(common::ADMIN_EMAIL, common::ADMIN_PASSWORD);
    let mut app = StockApp::new(
        Arc::new(store),
        Arc::new(auth),
        Box::new(InMemoryHistory::new()),
        AppConfig::new().with_save_timeout(Duration::from_millis(50)),
    );
    app.start().await;
    app.login(common::ADMIN_EMAIL, common::ADMIN_PASSWORD)
        .await
        .unwrap();
    wait_for(&app, |state| state.loaded()).await;

    let err = app
        .save_product(draft("Hat", "HT-1", "Ghost", "Nowhere"))
        .await
        .unwrap_err();
    assert_eq!(err, Error::Timeout);
}
