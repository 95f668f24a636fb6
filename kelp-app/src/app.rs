//! App coordinator
//!
//! [`StockApp`] owns the backend handles, the shared catalog state, the
//! sync tasks, the catalog service, the navigator, and the auth session.
//! All reads and mutations go through it - no ambient globals. UI shells
//! call the mutation methods, subscribe to [`AppEvent`]s, and render
//! from the row builders.

use std::sync::Arc;

use kelp_store::StoreBackend;
use parking_lot::RwLock;
use serde_json::Value;
use shared::models::{Category, CategoryDraft, Product, ProductDraft, Size};
use shared::view::ViewMode;
use shared::{Error, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::auth::{AuthBackend, AuthError, Identity};
use crate::catalog::{plan_reconciliation, CatalogService};
use crate::config::AppConfig;
use crate::events::AppEvent;
use crate::export;
use crate::nav::{BackAction, HistoryCommand, HistoryStack, Navigator, ViewState};
use crate::rows::{self, AdminRow, CategoryStock};
use crate::state::CatalogState;
use crate::sync::{self, SyncTasks};

/// The application core
pub struct StockApp {
    backend: Arc<dyn StoreBackend>,
    auth: Arc<dyn AuthBackend>,
    state: Arc<CatalogState>,
    catalog: CatalogService,
    events: broadcast::Sender<AppEvent>,
    navigator: Navigator,
    history: Box<dyn HistoryStack>,
    /// Product edit in flight in the modal form, if any
    pending_draft: Arc<RwLock<Option<ProductDraft>>>,
    sync: Option<SyncTasks>,
    reconciler: Option<JoinHandle<()>>,
}

impl StockApp {
    pub fn new(
        backend: Arc<dyn StoreBackend>,
        auth: Arc<dyn AuthBackend>,
        history: Box<dyn HistoryStack>,
        config: AppConfig,
    ) -> Self {
        let state = Arc::new(CatalogState::new());
        let (events, _) = broadcast::channel(config.event_capacity);
        let catalog = CatalogService::new(backend.clone(), state.clone(), config.save_timeout);
        Self {
            backend,
            auth,
            state,
            catalog,
            events,
            navigator: Navigator::new(ViewState::stock()),
            history,
            pending_draft: Arc::new(RwLock::new(None)),
            sync: None,
            reconciler: None,
        }
    }

    /// Mount navigation, start live sync, and arm the staged-draft
    /// reconciliation trigger
    pub async fn start(&mut self) {
        let existing = self.history.current();
        let commands = self.navigator.mount(existing.as_ref());
        self.apply_history(commands);

        self.sync = Some(
            sync::start(
                self.backend.clone(),
                self.state.clone(),
                self.events.clone(),
            )
            .await,
        );

        // Explicit trigger: on categories-changed, re-run reconciliation
        // for the staged product edit
        let mut rx = self.events.subscribe();
        let state = self.state.clone();
        let pending = self.pending_draft.clone();
        self.reconciler = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(AppEvent::CategoriesChanged) => {
                        let categories = state.categories();
                        let mut guard = pending.write();
                        if let Some(draft) = guard.as_mut() {
                            let plan = plan_reconciliation(
                                &draft.category,
                                &draft.subcategory,
                                &categories,
                            );
                            if !plan.is_noop_for(&draft.category, &draft.subcategory) {
                                tracing::info!(
                                    "Staged draft rehomed to ({}, {})",
                                    plan.category,
                                    plan.subcategory
                                );
                                draft.category = plan.category;
                                draft.subcategory = plan.subcategory;
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Draft reconciler lagged by {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Tear down sync tasks and listeners
    pub fn shutdown(&mut self) {
        if let Some(sync) = self.sync.take() {
            sync.shutdown();
        }
        if let Some(reconciler) = self.reconciler.take() {
            reconciler.abort();
        }
    }

    // =========================================================================
    // State access
    // =========================================================================

    pub fn catalog_state(&self) -> &Arc<CatalogState> {
        &self.state
    }

    /// Both collections completed their first load
    pub fn loaded(&self) -> bool {
        self.state.loaded()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.state.warnings()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Auth
    // =========================================================================

    pub async fn login(&self, email: &str, password: &str) -> std::result::Result<Identity, AuthError> {
        let identity = self.auth.login(email, password).await?;
        tracing::info!("Signed in as {}", identity.email);
        Ok(identity)
    }

    pub async fn logout(&self) {
        self.auth.logout().await;
        tracing::info!("Signed out");
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.auth.current()
    }

    /// Admin mutations require a signed-in identity; the store enforces
    /// the same rule server-side, this just fails earlier and cheaper
    fn require_admin(&self) -> Result<()> {
        if self.auth.current().is_none() {
            return Err(Error::PermissionDenied);
        }
        Ok(())
    }

    // =========================================================================
    // Catalog mutations
    // =========================================================================

    pub async fn save_product(&self, draft: ProductDraft) -> Result<Product> {
        self.require_admin()?;
        let product = self.catalog.save_product(draft).await?;
        *self.pending_draft.write() = None;
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<()> {
        self.require_admin()?;
        self.catalog.delete_product(id).await
    }

    pub async fn sell(&self, product_id: &str, size: Size) -> Result<u32> {
        self.require_admin()?;
        self.catalog.sell_one(product_id, size).await
    }

    pub async fn create_category(&self, draft: CategoryDraft) -> Result<Category> {
        self.require_admin()?;
        self.catalog.create_category(draft).await
    }

    pub async fn add_subcategory(&self, category_id: &str, name: &str) -> Result<()> {
        self.require_admin()?;
        self.catalog.add_subcategory(category_id, name).await
    }

    pub async fn delete_category(&self, category_id: &str) -> Result<()> {
        self.require_admin()?;
        self.catalog.delete_category(category_id).await
    }

    pub async fn delete_subcategory(&self, category_id: &str, name: &str) -> Result<()> {
        self.require_admin()?;
        self.catalog.delete_subcategory(category_id, name).await
    }

    /// Advisory pre-delete check shown to the operator
    pub fn category_in_use(&self, name: &str) -> bool {
        self.catalog.category_in_use(name)
    }

    /// Advisory pre-delete check shown to the operator
    pub fn subcategory_in_use(&self, category: &str, subcategory: &str) -> bool {
        self.catalog.subcategory_in_use(category, subcategory)
    }

    // =========================================================================
    // Staged product edit
    // =========================================================================

    /// Stage a draft while the modal form is open; a categories change
    /// re-reconciles it in place
    pub fn stage_draft(&self, draft: ProductDraft) {
        *self.pending_draft.write() = Some(draft);
    }

    pub fn staged_draft(&self) -> Option<ProductDraft> {
        self.pending_draft.read().clone()
    }

    pub fn discard_draft(&self) {
        *self.pending_draft.write() = None;
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn view(&self) -> &ViewState {
        self.navigator.state()
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        let mut next = self.navigator.state().clone();
        next.mode = mode;
        self.navigate_to(next);
    }

    pub fn open_category(&mut self, name: &str) {
        let mut next = self.navigator.state().clone();
        next.selection.select_category(name);
        self.navigate_to(next);
    }

    pub fn open_subcategory(&mut self, category: &str, name: &str) {
        let mut next = self.navigator.state().clone();
        next.selection.select_subcategory(category, name);
        self.navigate_to(next);
    }

    /// Clear the drill-down selection
    pub fn go_home(&mut self) {
        let mut next = self.navigator.state().clone();
        next.selection.clear_category();
        self.navigate_to(next);
    }

    /// In-app back button: native history when there is depth, otherwise
    /// collapse the selection one level in memory
    pub fn go_back(&mut self) {
        match self.navigator.request_back() {
            BackAction::Native => self.history.back(),
            BackAction::Collapsed | BackAction::AtRoot => {}
        }
    }

    /// Feed a platform popstate event in; returns whether view state was
    /// adopted
    pub fn handle_popstate(&mut self, payload: Option<Value>) -> bool {
        self.navigator.on_popstate(payload.as_ref())
    }

    fn navigate_to(&mut self, next: ViewState) {
        let commands = self.navigator.navigate(next);
        self.apply_history(commands);
    }

    fn apply_history(&mut self, commands: Vec<HistoryCommand>) {
        for command in commands {
            match command {
                HistoryCommand::Replace(entry) => self.history.replace(entry.to_value()),
                HistoryCommand::Push(entry) => self.history.push(entry.to_value()),
            }
        }
    }

    // =========================================================================
    // View data
    // =========================================================================

    /// Rows for the admin product table
    pub fn admin_rows(&self) -> Vec<AdminRow> {
        rows::admin_rows(&self.state.products(), &self.state.categories())
    }

    /// Category → subcategory → in-stock products for the public browser
    pub fn stock_overview(&self) -> Vec<CategoryStock> {
        rows::stock_overview(&self.state.categories(), &self.state.products())
    }

    /// Products under the current selection
    ///
    /// The public stock view hides out-of-stock products; the admin view
    /// shows everything.
    pub fn selected_products(&self) -> Vec<Product> {
        let view = self.navigator.state();
        let (Some(category), Some(subcategory)) =
            (&view.selection.category, &view.selection.subcategory)
        else {
            return Vec::new();
        };
        let mut products = self.state.products_in(category, subcategory);
        if view.mode == ViewMode::Stock {
            products.retain(|p| p.in_stock());
        }
        products
    }

    /// CSV export of the selected subcategory: `(filename, bytes)`
    pub fn export_selected_csv(&self) -> Result<(String, Vec<u8>)> {
        let view = self.navigator.state();
        let (Some(category), Some(subcategory)) =
            (&view.selection.category, &view.selection.subcategory)
        else {
            return Err(Error::validation("Select a subcategory to export"));
        };
        let products = self.state.products_in(category, subcategory);
        Ok((
            export::export_filename(category, subcategory),
            export::stock_csv(&products),
        ))
    }
}

impl Drop for StockApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for StockApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockApp")
            .field("loaded", &self.loaded())
            .field("view", self.navigator.state())
            .finish()
    }
}
