//! Shared types for the Kelp stock manager
//!
//! Data models, error taxonomy, and view-selection state shared between
//! the store client and the application core.

pub mod error;
pub mod models;
pub mod view;

// Re-exports
pub use error::{Error, Result};
pub use models::{
    Category, CategoryDraft, Product, ProductDraft, Size, SizeChart, DEFAULT_SUBCATEGORY,
    FALLBACK_CATEGORY,
};
pub use view::{ViewMode, ViewSelection};
