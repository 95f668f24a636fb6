//! Snapshot and write-batch types

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};

/// Full point-in-time copy of one collection, superseding any prior one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Collection this snapshot belongs to
    pub collection: String,
    /// Documents keyed by id
    pub documents: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            documents: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Event delivered on a collection subscription
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// New full snapshot
    Snapshot(Snapshot),
    /// Subscription failed; no further events will arrive for this handle
    SubscriptionError(StoreError),
}

/// Multi-path write applied as one network call
///
/// `None` deletes the document or field at that path. Paths are
/// slash-separated: `products/{id}` addresses a document,
/// `products/{id}/sizes/M` a field inside it. The batch is atomic from
/// the client's perspective - a concurrent reader never observes it
/// half-applied.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    entries: BTreeMap<String, Option<Value>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a write of `value` at `path`
    pub fn set<T: Serialize>(&mut self, path: impl Into<String>, value: &T) -> StoreResult<()> {
        let value = serde_json::to_value(value).map_err(StoreError::serialization)?;
        self.entries.insert(path.into(), Some(value));
        Ok(())
    }

    /// Schedule a raw JSON write at `path`
    pub fn set_value(&mut self, path: impl Into<String>, value: Value) {
        self.entries.insert(path.into(), Some(value));
    }

    /// Schedule a delete at `path`
    pub fn delete(&mut self, path: impl Into<String>) {
        self.entries.insert(path.into(), None);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Option<Value>)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> BTreeMap<String, Option<Value>> {
        self.entries
    }
}

/// Path of a document within a collection
pub fn doc_path(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}
