//! Session accounting for a sync round with one peer.
//!
//! A transport (out of scope here) shuttles [`PeerMessage`] payloads between
//! two devices. Each device runs a [`SyncSession`]: it builds the opening
//! state-vector request per document, answers whatever arrives, and at the
//! end produces a [`SyncLog`] record of the round.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::crdt::{DocName, DocumentManager, StateVector};
use crate::models::{SyncLog, SyncTransport};

use super::error::SyncError;
use super::protocol::PeerMessage;

/// Result of syncing a single document between two replicas.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Document that was synced.
    pub document: DocName,
    /// Whether the local replica advanced.
    pub local_updated: bool,
    /// Whether the remote replica advanced.
    pub remote_updated: bool,
    /// Delta bytes sent to the peer.
    pub sent_bytes: usize,
    /// Delta bytes received from the peer.
    pub received_bytes: usize,
}

/// Drives one sync round against a peer device.
pub struct SyncSession {
    user_id: String,
    device_id: String,
    peer_device_id: String,
    transport: SyncTransport,
    synced_documents: Vec<String>,
    updates_applied: u32,
    started_at: DateTime<Utc>,
    error: Option<String>,
}

impl SyncSession {
    pub fn new(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        peer_device_id: impl Into<String>,
        transport: SyncTransport,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            peer_device_id: peer_device_id.into(),
            transport,
            synced_documents: Vec::new(),
            updates_applied: 0,
            started_at: Utc::now(),
            error: None,
        }
    }

    /// Builds the opening request for a document: this replica's state
    /// vector, for the peer to answer with the missing delta.
    pub fn request(
        &mut self,
        manager: &mut DocumentManager,
        name: &DocName,
    ) -> Result<PeerMessage, SyncError> {
        let state_vector = manager.state_vector(name)?;
        let data = state_vector
            .encode()
            .map_err(|e| SyncError::Protocol(e.to_string()))?;

        Ok(PeerMessage::StateVector {
            document: name.to_string(),
            sender_id: self.device_id.clone(),
            target_id: self.peer_device_id.clone(),
            data,
        })
    }

    /// Handles one incoming peer payload and returns the response to send
    /// back, if any.
    ///
    /// A state-vector announcement is answered with the delta the peer is
    /// missing (or nothing if it is caught up); updates and exports are
    /// merged into the local document.
    pub fn handle(
        &mut self,
        manager: &mut DocumentManager,
        message: PeerMessage,
    ) -> Result<Option<PeerMessage>, SyncError> {
        match message {
            PeerMessage::StateVector {
                document,
                sender_id,
                data,
                ..
            } => {
                let name = DocName::new(document.clone());
                let remote = StateVector::decode(&data)
                    .map_err(|e| SyncError::Protocol(e.to_string()))?;

                let update = manager.sync_with_device(&name, &sender_id, &remote)?;
                if update.is_empty() {
                    debug!(doc = %name, peer = %sender_id, "peer already caught up");
                    return Ok(None);
                }

                self.track(&document);
                Ok(Some(PeerMessage::Update {
                    document,
                    sender_id: self.device_id.clone(),
                    target_id: sender_id,
                    data: update,
                }))
            }
            PeerMessage::Update { document, data, .. }
            | PeerMessage::Export { document, data, .. } => {
                let name = DocName::new(document.clone());
                if manager.apply_update(&name, &data)? {
                    self.track(&document);
                    self.updates_applied += 1;
                }
                Ok(None)
            }
            PeerMessage::Error { message } => {
                self.error = Some(message.clone());
                Err(SyncError::Peer(message))
            }
        }
    }

    /// Number of updates this session merged into local documents.
    pub fn updates_applied(&self) -> u32 {
        self.updates_applied
    }

    /// Closes the session and produces the sync log record for this round.
    pub fn finish(self) -> SyncLog {
        // Data types are the scope kinds, e.g. "progress:user1" -> "progress".
        let mut data_types: Vec<String> = Vec::new();
        for document in &self.synced_documents {
            let kind = DocName::new(document.as_str()).kind().to_string();
            if !data_types.contains(&kind) {
                data_types.push(kind);
            }
        }

        let mut log = SyncLog::new(self.user_id, self.device_id, self.transport)
            .with_data_types(data_types);
        log.started_at = self.started_at;

        match self.error {
            Some(error) => log.fail(error),
            None => log.complete(self.updates_applied),
        }
        log
    }

    fn track(&mut self, document: &str) {
        if !self.synced_documents.iter().any(|d| d == document) {
            self.synced_documents.push(document.to_string());
        }
    }
}

/// Synchronizes documents between two in-process replicas, e.g. two profiles
/// on a shared device. Network peers drive [`SyncSession::request`] /
/// [`SyncSession::handle`] over their own transport instead.
pub fn sync_replicas(
    local: &mut DocumentManager,
    remote: &mut DocumentManager,
    names: &[DocName],
) -> Result<Vec<SyncReport>, SyncError> {
    let mut reports = Vec::new();

    for name in names {
        let remote_vector = remote.state_vector(name)?;
        let outgoing = local.sync_with_device(name, "remote", &remote_vector)?;
        let remote_updated = if outgoing.is_empty() {
            false
        } else {
            remote.apply_update(name, &outgoing)?
        };

        let local_vector = local.state_vector(name)?;
        let incoming = remote.sync_with_device(name, "local", &local_vector)?;
        let local_updated = if incoming.is_empty() {
            false
        } else {
            local.apply_update(name, &incoming)?
        };

        reports.push(SyncReport {
            document: name.clone(),
            local_updated,
            remote_updated,
            sent_bytes: outgoing.len(),
            received_bytes: incoming.len(),
        });
    }

    Ok(reports)
}
