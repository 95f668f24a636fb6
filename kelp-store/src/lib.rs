//! Kelp Store - client for the remote stock document store
//!
//! Wraps the store's subscribe/read/write primitives behind a backend
//! trait so the app core can run against the real service or the
//! in-memory backend. No retry policy lives here - callers fail fast and
//! surface errors to the user.

pub mod backend;
pub mod error;
pub mod memory;
pub mod types;

pub use backend::{StoreBackend, SubscriptionHandle};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use types::{doc_path, Snapshot, SnapshotEvent, WriteBatch};

/// Collection holding category documents
pub const CATEGORIES: &str = "categories";

/// Collection holding product documents
pub const PRODUCTS: &str = "products";
