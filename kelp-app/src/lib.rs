//! Kelp App - application core for the stock manager
//!
//! Live collection sync, catalog reconciliation, navigation history, and
//! the coordinator that ties them together. UI shells embed [`StockApp`]
//! and render from its read snapshots.

pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod events;
pub mod export;
pub mod nav;
pub mod rows;
pub mod state;
pub mod sync;

pub use app::StockApp;
pub use auth::{AuthBackend, AuthError, Identity, StaticAuth};
pub use catalog::CatalogService;
pub use config::AppConfig;
pub use events::AppEvent;
pub use nav::{HistoryEntry, HistoryStack, InMemoryHistory, Navigator, ViewState};
pub use state::CatalogState;
