//! Peer sync payloads and session accounting.
//!
//! A sync round between two replicas trades state vectors for updates:
//!
//! 1. Each side announces its state vector for a document
//! 2. Each side answers with the delta the other is missing
//! 3. Deltas are applied; both replicas converge
//!
//! Messages are CBOR-encoded. The transport that carries them (Bluetooth,
//! WiFi-Direct, a relay server) is out of scope; [`SyncSession`] only turns
//! incoming payloads into outgoing ones against a
//! [`DocumentManager`](crate::crdt::DocumentManager).

mod error;
mod protocol;
mod session;

pub use error::SyncError;
pub use protocol::{generate_device_id, PeerMessage};
pub use session::{sync_replicas, SyncReport, SyncSession};
