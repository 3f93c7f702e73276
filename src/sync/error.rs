//! Sync error types.

use thiserror::Error;

use crate::crdt::ManagerError;

/// Errors that can occur while driving a sync round.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Malformed payload from a peer.
    #[error("sync protocol error: {0}")]
    Protocol(String),

    /// Document manager failure underneath the session.
    #[error(transparent)]
    Manager(#[from] ManagerError),

    /// The peer reported an error of its own.
    #[error("peer reported error: {0}")]
    Peer(String),
}
