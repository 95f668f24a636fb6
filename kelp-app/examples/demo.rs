//! Headless demo: drives the full app core against the in-memory store.
//!
//! ```bash
//! cargo run -p kelp-app --example demo
//! ```

use std::sync::Arc;

use anyhow::Result;
use kelp_app::{AppConfig, InMemoryHistory, StaticAuth, StockApp};
use kelp_store::MemoryStore;
use rust_decimal::Decimal;
use shared::models::{CategoryDraft, ProductDraft, Size, SizeChart};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = MemoryStore::new();
    let auth = StaticAuth::new().with_user("admin@example.com", "demo");
    let history = InMemoryHistory::new();
    let mut app = StockApp::new(
        Arc::new(store),
        Arc::new(auth),
        Box::new(history.clone()),
        AppConfig::new(),
    );
    app.start().await;
    app.login("admin@example.com", "demo").await?;

    let shoes = app
        .create_category(CategoryDraft {
            name: "Shoes".to_string(),
            subcategories: vec!["Running".to_string()],
        })
        .await?;
    tracing::info!("Created category {:?} ({})", shoes.name, shoes.id);

    let runner = app
        .save_product(ProductDraft {
            id: None,
            name: "Runner".to_string(),
            sku: "SH-1".to_string(),
            category: "Shoes".to_string(),
            subcategory: "Running".to_string(),
            sizes: SizeChart::new().with(Size::M, 3).with(Size::L, 1),
            price: Decimal::from(50),
            description: Some("Lightweight road shoe".to_string()),
            image_url: None,
        })
        .await?;

    // Let the snapshots round-trip, then sell one
    while !app.loaded() || app.catalog_state().products().is_empty() {
        tokio::task::yield_now().await;
    }
    let left = app.sell(&runner.id, Size::M).await?;
    tracing::info!("Sold one size M, {left} left");

    app.open_subcategory("Shoes", "Running");
    let (filename, bytes) = app.export_selected_csv()?;
    println!("--- {filename} ---");
    print!("{}", String::from_utf8_lossy(&bytes[3..]));

    println!("--- admin table ---");
    for row in app.admin_rows() {
        println!(
            "{} [{}] {}/{} total={} price={}",
            row.name, row.sku, row.category, row.subcategory, row.total, row.price
        );
    }
    Ok(())
}
