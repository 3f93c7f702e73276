//! Lifecycle and sync primitives for named CRDT documents.
//!
//! The manager exclusively owns the in-memory documents and their
//! persistence handles. Callers address documents by scope name and
//! sub-structures by (scope name, key); both addresses are stable across
//! process restarts. Updates from peers merge in any order and converge to
//! the same state on every replica.

use std::collections::HashMap;
use std::path::PathBuf;

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ReadDoc, Value, ROOT};
use thiserror::Error;
use tracing::{debug, trace};

use super::doc_name::DocName;
use super::state_vector::{StateVector, StateVectorError};
use super::storage::{DocStorage, StorageError};

/// Key of the progress map inside a progress document.
const PROGRESS_MAP: &str = "progress";
/// Key of the message array inside a chat document.
const MESSAGES_ARRAY: &str = "messages";

/// Errors raised by document manager operations.
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    StateVector(#[from] StateVectorError),

    #[error("corrupt document in storage for '{0}': {1}")]
    CorruptDocument(String, String),

    /// The update was rejected before any state mutation.
    #[error("corrupt update for '{0}': {1}")]
    CorruptUpdate(String, String),

    #[error("automerge operation failed: {0}")]
    Automerge(String),
}

/// Owns every open CRDT document and its durable storage.
///
/// One instance is constructed at application startup and passed to callers;
/// [`destroy_all`](Self::destroy_all) tears it down. Document mutation is
/// synchronous and in-memory; persistence happens on
/// [`flush`](Self::flush) and after update application.
pub struct DocumentManager {
    storage: DocStorage,
    docs: HashMap<DocName, AutoCommit>,
}

impl DocumentManager {
    pub fn new(data_dir: PathBuf) -> Self {
        Self::with_storage(DocStorage::new(data_dir))
    }

    pub fn with_storage(storage: DocStorage) -> Self {
        Self {
            storage,
            docs: HashMap::new(),
        }
    }

    /// Returns the open document for `name`, loading it from storage or
    /// creating it on first access.
    ///
    /// Idempotent per name: repeated calls return the same instance for the
    /// manager's lifetime.
    pub fn document(&mut self, name: &DocName) -> Result<&mut AutoCommit, ManagerError> {
        if !self.docs.contains_key(name) {
            let doc = match self.storage.load(name)? {
                Some(bytes) => AutoCommit::load(&bytes)
                    .map_err(|e| ManagerError::CorruptDocument(name.to_string(), e.to_string()))?,
                None => AutoCommit::new(),
            };
            debug!(doc = %name, "opened document");
            self.docs.insert(name.clone(), doc);
        }

        Ok(self.docs.get_mut(name).expect("document just inserted"))
    }

    /// Returns whether a document is currently open.
    pub fn is_open(&self, name: &DocName) -> bool {
        self.docs.contains_key(name)
    }

    /// Number of currently open documents.
    pub fn open_count(&self) -> usize {
        self.docs.len()
    }

    /// Returns the named shared map inside a document, creating it on first
    /// reference.
    pub fn shared_map(&mut self, name: &DocName, key: &str) -> Result<ObjId, ManagerError> {
        self.shared_object(name, key, ObjType::Map)
    }

    /// Returns the named shared array inside a document, creating it on
    /// first reference.
    pub fn shared_array(&mut self, name: &DocName, key: &str) -> Result<ObjId, ManagerError> {
        self.shared_object(name, key, ObjType::List)
    }

    /// Returns the named shared text inside a document, creating it on first
    /// reference.
    pub fn shared_text(&mut self, name: &DocName, key: &str) -> Result<ObjId, ManagerError> {
        self.shared_object(name, key, ObjType::Text)
    }

    fn shared_object(
        &mut self,
        name: &DocName,
        key: &str,
        obj_type: ObjType,
    ) -> Result<ObjId, ManagerError> {
        let doc = self.document(name)?;

        let existing = match doc
            .get(ROOT, key)
            .map_err(|e| ManagerError::Automerge(e.to_string()))?
        {
            Some((Value::Object(found), obj_id)) if found == obj_type => Some(obj_id),
            _ => None,
        };
        if let Some(obj_id) = existing {
            return Ok(obj_id);
        }

        let obj_id = doc
            .put_object(ROOT, key, obj_type)
            .map_err(|e| ManagerError::Automerge(e.to_string()))?;

        // Persist the creation so the (document, key) address survives a
        // restart even before the first data write.
        self.persist(name)?;

        Ok(obj_id)
    }

    /// Returns this replica's state vector for a document.
    pub fn state_vector(&mut self, name: &DocName) -> Result<StateVector, ManagerError> {
        let doc = self.document(name)?;
        Ok(StateVector::new(doc.get_heads()))
    }

    /// Computes the update containing everything this replica has that the
    /// remote state vector does not.
    ///
    /// An empty remote vector means the peer has nothing: the full document
    /// is returned. An empty result means the peer is already caught up.
    pub fn sync_with_device(
        &mut self,
        name: &DocName,
        device_id: &str,
        remote: &StateVector,
    ) -> Result<Vec<u8>, ManagerError> {
        let doc = self.document(name)?;

        let update = if remote.is_empty() {
            doc.save()
        } else {
            doc.save_after(remote.heads())
        };

        debug!(doc = %name, device = device_id, bytes = update.len(), "computed sync delta");
        Ok(update)
    }

    /// Merges an externally-produced update into the named document.
    ///
    /// Idempotent and commutative: re-applying an update is a no-op, and any
    /// interleaving of updates converges to the same state. A corrupt update
    /// is rejected before any mutation. Returns whether the document
    /// advanced.
    pub fn apply_update(&mut self, name: &DocName, update: &[u8]) -> Result<bool, ManagerError> {
        let doc = self.document(name)?;
        let heads_before = doc.get_heads();

        // Stage the update on a scratch copy so a corrupt payload can't
        // leave the live document partially mutated.
        let mut staged = doc.clone();
        staged
            .load_incremental(update)
            .map_err(|e| ManagerError::CorruptUpdate(name.to_string(), e.to_string()))?;

        let advanced = staged.get_heads() != heads_before;
        *doc = staged;

        if advanced {
            self.persist(name)?;
            debug!(doc = %name, bytes = update.len(), "applied update");
        } else {
            trace!(doc = %name, "update contained no new changes");
        }

        Ok(advanced)
    }

    /// Merges a full document snapshot, e.g. from
    /// [`export_document`](Self::export_document) on another replica.
    pub fn import_document(&mut self, name: &DocName, update: &[u8]) -> Result<bool, ManagerError> {
        self.apply_update(name, update)
    }

    /// Full-state snapshot suitable for cold bootstrap of a new replica.
    pub fn export_document(&mut self, name: &DocName) -> Result<Vec<u8>, ManagerError> {
        let doc = self.document(name)?;
        Ok(doc.save())
    }

    /// Writes a document's current state to durable storage.
    pub fn flush(&mut self, name: &DocName) -> Result<(), ManagerError> {
        self.persist(name)
    }

    /// Flushes every open document.
    pub fn flush_all(&mut self) -> Result<(), ManagerError> {
        let names: Vec<DocName> = self.docs.keys().cloned().collect();
        for name in &names {
            self.persist(name)?;
        }
        Ok(())
    }

    /// Persists a document and drops the in-memory handle.
    ///
    /// Durable bytes stay owned by the storage layer; a later
    /// [`document`](Self::document) call starts a fresh lifecycle from them.
    pub fn destroy_document(&mut self, name: &DocName) -> Result<(), ManagerError> {
        if self.docs.contains_key(name) {
            self.persist(name)?;
            self.docs.remove(name);
            debug!(doc = %name, "destroyed document handle");
        }
        Ok(())
    }

    /// Destroys every open document. Used at teardown.
    pub fn destroy_all(&mut self) -> Result<(), ManagerError> {
        let names: Vec<DocName> = self.docs.keys().cloned().collect();
        for name in &names {
            self.destroy_document(name)?;
        }
        Ok(())
    }

    /// Shared map holding a user's progress by content id.
    ///
    /// Naming convention over [`shared_map`](Self::shared_map), not a
    /// separate mechanism.
    pub fn learning_progress_map(
        &mut self,
        user_id: &str,
    ) -> Result<(DocName, ObjId), ManagerError> {
        let name = DocName::progress(user_id);
        let map = self.shared_map(&name, PROGRESS_MAP)?;
        Ok((name, map))
    }

    /// Shared array holding a conversation's message log.
    pub fn chat_messages(
        &mut self,
        conversation_id: &str,
    ) -> Result<(DocName, ObjId), ManagerError> {
        let name = DocName::chat(conversation_id);
        let array = self.shared_array(&name, MESSAGES_ARRAY)?;
        Ok((name, array))
    }

    fn persist(&mut self, name: &DocName) -> Result<(), ManagerError> {
        if let Some(doc) = self.docs.get_mut(name) {
            let bytes = doc.save();
            self.storage.save(name, &bytes)?;
            trace!(doc = %name, bytes = bytes.len(), "persisted document");
        }
        Ok(())
    }
}
