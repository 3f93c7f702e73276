//! CRDT document handling for offline-first sync.
//!
//! Each scope (a user's progress, a chat conversation) lives in its own
//! document. Documents merge concurrent edits from any number of devices in
//! any order and converge to the same state everywhere; that property is
//! what makes multi-way offline sync safe without a coordinator.
//!
//! # Document Storage
//!
//! Documents are persisted by scope name in the data directory:
//! - `<storage_id>.automerge`: document binary, where the storage id is
//!   derived deterministically from the scope name
//!
//! Scope naming conventions:
//! - `progress:<user_id>`: progress-by-content map, under the key `progress`
//! - `chat:<conversation_id>`: message log, under the key `messages`

mod doc_name;
mod manager;
mod reader;
mod state_vector;
mod storage;
mod writer;

pub use doc_name::DocName;
pub use manager::{DocumentManager, ManagerError};
pub use reader::{read_all_progress, read_messages, read_progress, ReaderError};
pub use state_vector::{StateVector, StateVectorError};
pub use storage::{DocStorage, StorageError};
pub use writer::{append_message, write_progress};
