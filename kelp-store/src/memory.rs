//! In-memory store backend
//!
//! Deterministic stand-in for the remote document store, used by tests
//! and the demo shell. A batch is applied under one lock and subscribers
//! of each affected collection are notified with exactly one fresh
//! snapshot, so readers never observe a batch half-applied.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use async_trait::async_trait;

use crate::backend::{StoreBackend, SubscriptionHandle};
use crate::error::{StoreError, StoreResult};
use crate::types::{Snapshot, SnapshotEvent, WriteBatch};

struct Subscriber {
    collection: String,
    sender: mpsc::UnboundedSender<SnapshotEvent>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    /// collection -> id -> document
    collections: BTreeMap<String, BTreeMap<String, Value>>,
    subscribers: Vec<Subscriber>,
    /// Injected failure for the next write (tests)
    fail_next_write: Option<StoreError>,
    /// Injected per-collection subscription failures (tests)
    subscribe_errors: BTreeMap<String, StoreError>,
}

/// In-memory [`StoreBackend`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `write_batch`/`set_path` call fail with `err`,
    /// leaving the store untouched
    pub fn fail_next_write(&self, err: StoreError) {
        self.inner.lock().fail_next_write = Some(err);
    }

    /// Make future subscriptions to `collection` deliver `err` as their
    /// only event
    pub fn fail_subscriptions(&self, collection: &str, err: StoreError) {
        self.inner
            .lock()
            .subscribe_errors
            .insert(collection.to_string(), err);
    }

    /// Number of documents currently in `collection`
    pub fn document_count(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn snapshot_of(inner: &Inner, collection: &str) -> Snapshot {
        Snapshot {
            collection: collection.to_string(),
            documents: inner
                .collections
                .get(collection)
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn notify(inner: &mut Inner, collections: &[String]) {
        inner
            .subscribers
            .retain(|s| !s.sender.is_closed() && !s.cancel.is_cancelled());
        for collection in collections {
            let snapshot = Self::snapshot_of(inner, collection);
            for subscriber in &inner.subscribers {
                if subscriber.collection == *collection {
                    let _ = subscriber
                        .sender
                        .send(SnapshotEvent::Snapshot(snapshot.clone()));
                }
            }
        }
    }

    fn split_path(path: &str) -> StoreResult<(String, String, Vec<String>)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(StoreError::invalid_path(path));
        }
        Ok((
            segments[0].to_string(),
            segments[1].to_string(),
            segments[2..].iter().map(|s| s.to_string()).collect(),
        ))
    }

    fn apply(inner: &mut Inner, path: &str, value: Option<Value>) -> StoreResult<String> {
        let (collection, id, fields) = Self::split_path(path)?;
        let docs = inner.collections.entry(collection.clone()).or_default();
        match value {
            Some(value) if fields.is_empty() => {
                docs.insert(id, value);
            }
            Some(value) => {
                let doc = docs.entry(id).or_insert_with(|| Value::Object(Map::new()));
                set_field(doc, &fields, value);
            }
            None if fields.is_empty() => {
                docs.remove(&id);
            }
            None => {
                if let Some(doc) = docs.get_mut(&id) {
                    remove_field(doc, &fields);
                }
            }
        }
        Ok(collection)
    }
}

/// Write `value` at the nested field path, creating intermediate objects
fn set_field(node: &mut Value, fields: &[String], value: Value) {
    if !matches!(node, Value::Object(_)) {
        *node = Value::Object(Map::new());
    }
    let Value::Object(object) = node else { return };
    match fields {
        [last] => {
            object.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let child = object
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            set_field(child, rest, value);
        }
        [] => {}
    }
}

/// Remove the nested field path, if present
fn remove_field(node: &mut Value, fields: &[String]) {
    let Value::Object(object) = node else { return };
    match fields {
        [last] => {
            object.remove(last);
        }
        [head, rest @ ..] => {
            if let Some(child) = object.get_mut(head) {
                remove_field(child, rest);
            }
        }
        [] => {}
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryStore")
            .field("collections", &inner.collections.len())
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn read(&self, path: &str) -> StoreResult<Option<Value>> {
        let (collection, id, fields) = Self::split_path(path)?;
        let inner = self.inner.lock();
        let Some(doc) = inner.collections.get(&collection).and_then(|d| d.get(&id)) else {
            return Ok(None);
        };
        if fields.is_empty() {
            return Ok(Some(doc.clone()));
        }
        let pointer = format!("/{}", fields.join("/"));
        Ok(doc.pointer(&pointer).cloned())
    }

    async fn write_batch(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.fail_next_write.take() {
            tracing::warn!("Injected write failure: {err}");
            return Err(err);
        }
        // Validate every path before touching state
        for (path, _) in batch.entries() {
            Self::split_path(path)?;
        }
        let mut touched: Vec<String> = Vec::new();
        for (path, value) in batch.into_entries() {
            let collection = Self::apply(&mut inner, &path, value)?;
            if !touched.contains(&collection) {
                touched.push(collection);
            }
        }
        Self::notify(&mut inner, &touched);
        Ok(())
    }

    async fn set_path(&self, path: &str, value: Value) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set_value(path, value);
        self.write_batch(batch).await
    }

    fn generate_id(&self, _collection: &str) -> String {
        Uuid::new_v4().to_string()
    }

    async fn subscribe(&self, collection: &str) -> StoreResult<SubscriptionHandle> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let mut inner = self.inner.lock();
        if let Some(err) = inner.subscribe_errors.get(collection) {
            let _ = sender.send(SnapshotEvent::SubscriptionError(err.clone()));
            return Ok(SubscriptionHandle::new(receiver, cancel));
        }
        let _ = sender.send(SnapshotEvent::Snapshot(Self::snapshot_of(
            &inner, collection,
        )));
        inner.subscribers.push(Subscriber {
            collection: collection.to_string(),
            sender,
            cancel: cancel.clone(),
        });
        Ok(SubscriptionHandle::new(receiver, cancel))
    }
}
