//! State vectors: what a replica has already seen.
//!
//! A state vector summarizes a document as its current heads. A peer holding
//! the vector can compute the minimal delta to send back: everything not
//! reachable from those heads. The wire form is CBOR, a list of 32-byte
//! hashes.

use automerge::ChangeHash;
use serde_bytes::ByteBuf;
use thiserror::Error;

/// Errors decoding a state vector off the wire.
#[derive(Error, Debug)]
pub enum StateVectorError {
    #[error("invalid state vector encoding: {0}")]
    Encoding(String),

    #[error("invalid head length: expected 32 bytes, got {0}")]
    InvalidHeadLength(usize),
}

/// Compact summary of the updates a replica has incorporated.
///
/// Opaque to callers; replicas exchange the encoded form and hand it to
/// [`DocumentManager::sync_with_device`](super::DocumentManager::sync_with_device)
/// to compute deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateVector {
    heads: Vec<ChangeHash>,
}

impl StateVector {
    pub fn new(heads: Vec<ChangeHash>) -> Self {
        Self { heads }
    }

    /// Vector of a replica that has seen nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    pub fn heads(&self) -> &[ChangeHash] {
        &self.heads
    }

    /// Encodes the vector for the wire.
    pub fn encode(&self) -> Result<Vec<u8>, StateVectorError> {
        let raw: Vec<ByteBuf> = self
            .heads
            .iter()
            .map(|h| ByteBuf::from(h.0.to_vec()))
            .collect();

        let mut buf = Vec::new();
        ciborium::into_writer(&raw, &mut buf)
            .map_err(|e| StateVectorError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Decodes a vector received from a peer.
    pub fn decode(data: &[u8]) -> Result<Self, StateVectorError> {
        let raw: Vec<ByteBuf> =
            ciborium::from_reader(data).map_err(|e| StateVectorError::Encoding(e.to_string()))?;

        let mut heads = Vec::with_capacity(raw.len());
        for bytes in raw {
            if bytes.len() != 32 {
                return Err(StateVectorError::InvalidHeadLength(bytes.len()));
            }
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes);
            heads.push(ChangeHash(arr));
        }

        Ok(Self { heads })
    }
}
