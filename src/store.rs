//! Record store seam consumed by the sync core.
//!
//! The platform persists plain transactional records (progress snapshots,
//! credit ledger entries) in its own store; the sync core only needs an
//! opaque durable map. [`MemoryRecordStore`] is the in-process reference
//! implementation used by tests and single-device setups.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::conflict::{reconcile, ConflictResolver};

/// Errors surfaced by a record store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record store backend error: {0}")]
    Backend(String),
}

/// Asynchronous key-value store over typed records.
///
/// Implementations serialize concurrent writes per record id; the sync core
/// operates on snapshots and never assumes exclusive access.
#[allow(async_fn_in_trait)]
pub trait RecordStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, StoreError>;

    async fn put(&self, id: &str, record: T) -> Result<(), StoreError>;

    /// Returns every record matching the predicate.
    async fn query(&self, predicate: impl Fn(&T) -> bool + Send) -> Result<Vec<T>, StoreError>;
}

/// In-memory record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore<T> {
    records: RwLock<HashMap<String, T>>,
}

impl<T: Clone + Send + Sync> MemoryRecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<T: Clone + Send + Sync> RecordStore<T> for MemoryRecordStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put(&self, id: &str, record: T) -> Result<(), StoreError> {
        self.records.write().await.insert(id.to_string(), record);
        Ok(())
    }

    async fn query(&self, predicate: impl Fn(&T) -> bool + Send) -> Result<Vec<T>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }
}

/// Reconciles an incoming remote batch against the store's current contents
/// and writes the merged set back.
///
/// Store failures propagate immediately. The merge itself is deterministic,
/// so retrying after a failed write converges to the same final state.
pub async fn merge_remote_batch<T, S, F>(
    store: &S,
    remote: Vec<T>,
    resolver: &dyn ConflictResolver<T>,
    identity: F,
) -> Result<Vec<T>, StoreError>
where
    T: Clone,
    S: RecordStore<T>,
    F: Fn(&T) -> String,
{
    let local = store.query(|_: &T| true).await?;
    let merged = reconcile(local, remote, resolver, &identity);

    for record in &merged {
        store.put(&identity(record), record.clone()).await?;
    }

    Ok(merged)
}
