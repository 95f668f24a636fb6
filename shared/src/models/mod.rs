//! Data models
//!
//! Shared between the store client and the app core. Documents are keyed
//! by id in the store; the id lives in the path, not in the document, so
//! entity structs carry it as a `#[serde(skip)]` field filled in when a
//! snapshot is rebuilt.

pub mod category;
pub mod product;
pub mod size;

// Re-exports
pub use category::*;
pub use product::*;
pub use size::*;
