//! Live collection sync
//!
//! One task per subscribed collection. Categories load first; the
//! products subscription is not established until the categories
//! collection has completed its first load. Every snapshot replaces the
//! in-memory list wholesale - no incremental merge, last snapshot wins.
//! A subscription error still marks the collection loaded (so the UI
//! never hangs) but records a visible warning.

use std::sync::Arc;

use kelp_store::{Snapshot, SnapshotEvent, StoreBackend, SubscriptionHandle, CATEGORIES, PRODUCTS};
use shared::models::{Category, Product};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::AppEvent;
use crate::state::CatalogState;

/// Handle to the running sync tasks
#[derive(Debug)]
pub struct SyncTasks {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SyncTasks {
    /// Tear down both subscriptions
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncTasks {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start mirroring the categories and products collections into `state`
pub async fn start(
    backend: Arc<dyn StoreBackend>,
    state: Arc<CatalogState>,
    events: broadcast::Sender<AppEvent>,
) -> SyncTasks {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        run_categories(backend, state, events, token).await;
    });
    SyncTasks { cancel, task }
}

async fn run_categories(
    backend: Arc<dyn StoreBackend>,
    state: Arc<CatalogState>,
    events: broadcast::Sender<AppEvent>,
    cancel: CancellationToken,
) {
    let mut handle = match backend.subscribe(CATEGORIES).await {
        Ok(handle) => handle,
        Err(err) => {
            degrade(&state, &events, CATEGORIES, &err.to_string());
            // The gate is open (loaded, though degraded) - let products
            // try on their own
            run_products(backend, state, events, cancel).await;
            return;
        }
    };

    let mut products_task: Option<JoinHandle<()>> = None;
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = handle.next() => event,
        };
        let terminal = match event {
            Some(SnapshotEvent::Snapshot(snapshot)) => {
                state.replace_categories(categories_from(&snapshot));
                let _ = events.send(AppEvent::CategoriesChanged);
                tracing::debug!(
                    "Categories snapshot applied ({} documents)",
                    snapshot.documents.len()
                );
                false
            }
            Some(SnapshotEvent::SubscriptionError(err)) => {
                degrade(&state, &events, CATEGORIES, &err.to_string());
                true
            }
            None => break,
        };

        // First load complete (even degraded): bring up the gated
        // products subscription
        if products_task.is_none() && state.categories_loaded() {
            let backend = backend.clone();
            let state = state.clone();
            let events = events.clone();
            let token = cancel.clone();
            products_task = Some(tokio::spawn(async move {
                run_products(backend, state, events, token).await;
            }));
        }
        if terminal {
            break;
        }
    }

    if products_task.is_none() {
        // Categories never loaded cleanly; unblock the UI anyway
        state.mark_products_loaded();
    }
}

async fn run_products(
    backend: Arc<dyn StoreBackend>,
    state: Arc<CatalogState>,
    events: broadcast::Sender<AppEvent>,
    cancel: CancellationToken,
) {
    let mut handle: SubscriptionHandle = match backend.subscribe(PRODUCTS).await {
        Ok(handle) => handle,
        Err(err) => {
            degrade(&state, &events, PRODUCTS, &err.to_string());
            return;
        }
    };

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = handle.next() => event,
        };
        match event {
            Some(SnapshotEvent::Snapshot(snapshot)) => {
                state.replace_products(products_from(&snapshot));
                let _ = events.send(AppEvent::ProductsChanged);
                tracing::debug!(
                    "Products snapshot applied ({} documents)",
                    snapshot.documents.len()
                );
            }
            Some(SnapshotEvent::SubscriptionError(err)) => {
                degrade(&state, &events, PRODUCTS, &err.to_string());
                break;
            }
            None => break,
        }
    }
}

/// Mark a collection loaded-but-degraded and warn the user
fn degrade(
    state: &CatalogState,
    events: &broadcast::Sender<AppEvent>,
    collection: &str,
    reason: &str,
) {
    tracing::warn!("Subscription to {collection} degraded: {reason}");
    match collection {
        CATEGORIES => state.mark_categories_loaded(),
        _ => state.mark_products_loaded(),
    }
    let message = format!("Live updates for {collection} are unavailable: {reason}");
    state.push_warning(message.clone());
    let _ = events.send(AppEvent::SyncWarning(message));
}

fn categories_from(snapshot: &Snapshot) -> Vec<Category> {
    let mut out = Vec::with_capacity(snapshot.documents.len());
    for (id, doc) in &snapshot.documents {
        match serde_json::from_value::<Category>(doc.clone()) {
            Ok(mut category) => {
                category.id = id.clone();
                out.push(category);
            }
            Err(err) => tracing::warn!("Skipping malformed category {id}: {err}"),
        }
    }
    out
}

fn products_from(snapshot: &Snapshot) -> Vec<Product> {
    let mut out = Vec::with_capacity(snapshot.documents.len());
    for (id, doc) in &snapshot.documents {
        match serde_json::from_value::<Product>(doc.clone()) {
            Ok(mut product) => {
                product.id = id.clone();
                out.push(product);
            }
            Err(err) => tracing::warn!("Skipping malformed product {id}: {err}"),
        }
    }
    out
}
