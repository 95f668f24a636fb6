//! Store backend trait and subscription handle

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::StoreResult;
use crate::types::{SnapshotEvent, WriteBatch};

/// Remote document store interface
///
/// Each method is one network call. The store delivers change
/// notifications at least once and offers no transactional guarantees
/// across collections; a batch is the only multi-path unit.
#[async_trait]
pub trait StoreBackend: Send + Sync + std::fmt::Debug {
    /// Read a single path (document or field inside one)
    async fn read(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Apply a multi-path batch as one call
    async fn write_batch(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Write a single path
    async fn set_path(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Client-generated document id, usable inside a batch before any write
    fn generate_id(&self, collection: &str) -> String;

    /// Subscribe to full-collection snapshots
    ///
    /// The first event carries the current snapshot (possibly empty); each
    /// subsequent store change delivers a fresh one. Cancelling or dropping
    /// the handle tears the subscription down.
    async fn subscribe(&self, collection: &str) -> StoreResult<SubscriptionHandle>;
}

/// Cancellable handle to a collection subscription
#[derive(Debug)]
pub struct SubscriptionHandle {
    receiver: mpsc::UnboundedReceiver<SnapshotEvent>,
    cancel: CancellationToken,
}

impl SubscriptionHandle {
    pub fn new(receiver: mpsc::UnboundedReceiver<SnapshotEvent>, cancel: CancellationToken) -> Self {
        Self { receiver, cancel }
    }

    /// Next event; `None` after cancellation or backend shutdown
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            event = self.receiver.recv() => event,
        }
    }

    /// Tear down the subscription
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
