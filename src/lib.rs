//! Vidyut Sync Core Library
//!
//! Offline-first synchronization for the Vidyut learning platform: CRDT
//! documents for progress and chat state, deterministic conflict resolution
//! for plain records, and the payload types replicas exchange during a sync
//! round.
//!
//! Devices mutate local state freely while disconnected. A later sync round
//! trades state vectors and deltas for CRDT documents, or whole record
//! batches for plain records; either way every replica converges to the same
//! state regardless of merge order.

pub mod conflict;
pub mod crdt;
pub mod models;
pub mod store;
pub mod sync;

pub use conflict::{
    create_resolver, reconcile, ConflictError, ConflictResolver, LastWriteWins,
    LearningProgressResolver, QuizAttemptsResolver, ResolutionStrategy, Timestamped,
};
pub use crdt::{
    append_message, read_all_progress, read_messages, read_progress, write_progress, DocName,
    DocStorage, DocumentManager, ManagerError, ReaderError, StateVector, StateVectorError,
    StorageError,
};
pub use models::{
    ChatMessage, LearningProgress, MessageKind, ProgressStatus, QuizAttempt, SyncLog, SyncStatus,
    SyncTransport,
};
pub use store::{merge_remote_batch, MemoryRecordStore, RecordStore, StoreError};
pub use sync::{generate_device_id, sync_replicas, PeerMessage, SyncError, SyncReport, SyncSession};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
