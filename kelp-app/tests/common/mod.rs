#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use kelp_app::{AppConfig, CatalogState, InMemoryHistory, StaticAuth, StockApp};
use kelp_store::MemoryStore;
use rust_decimal::Decimal;
use shared::models::{ProductDraft, Size, SizeChart};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "hunter2";

/// A started app over an in-memory store, with a signed-in admin
pub async fn admin_app() -> (StockApp, MemoryStore, InMemoryHistory) {
    let (mut app, store, history) = build_app();
    app.start().await;
    app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.expect("login");
    wait_for(&app, |state| state.loaded()).await;
    (app, store, history)
}

/// An unstarted app with its collaborators exposed
pub fn build_app() -> (StockApp, MemoryStore, InMemoryHistory) {
    let store = MemoryStore::new();
    let auth = StaticAuth::new().with_user(ADMIN_EMAIL, ADMIN_PASSWORD);
    let history = InMemoryHistory::new();
    let app = StockApp::new(
        Arc::new(store.clone()),
        Arc::new(auth),
        Box::new(history.clone()),
        AppConfig::new(),
    );
    (app, store, history)
}

/// Wait (bounded) until the mirrored state satisfies `pred`
pub async fn wait_for<F>(app: &StockApp, mut pred: F)
where
    F: FnMut(&CatalogState) -> bool,
{
    let mut rx = app.subscribe_events();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if pred(app.catalog_state()) {
                return;
            }
            // Bounded recv so an event raced before subscribing cannot
            // stall the loop
            let _ = tokio::time::timeout(Duration::from_millis(25), rx.recv()).await;
        }
    })
    .await
    .expect("state condition not reached in time");
}

pub fn draft(name: &str, sku: &str, category: &str, subcategory: &str) -> ProductDraft {
    ProductDraft {
        id: None,
        name: name.to_string(),
        sku: sku.to_string(),
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        sizes: SizeChart::default(),
        price: Decimal::from(50),
        description: None,
        image_url: None,
    }
}

pub fn draft_with_stock(
    name: &str,
    sku: &str,
    category: &str,
    subcategory: &str,
    size: Size,
    quantity: u32,
) -> ProductDraft {
    let mut d = draft(name, sku, category, subcategory);
    d.sizes.set(size, quantity);
    d
}
