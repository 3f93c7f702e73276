//! Payload types exchanged between replicas during a sync round.
//!
//! Messages are CBOR-encoded with camelCase field names. The core defines
//! only these payload semantics; framing, chunking, and retry belong to the
//! transport.

use serde::{Deserialize, Serialize};

/// Message types for peer-to-peer document sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PeerMessage {
    /// State vector announcement - asks the receiver for everything it has
    /// that the sender has not seen.
    #[serde(rename = "stateVector")]
    StateVector {
        document: String,
        #[serde(rename = "senderId")]
        sender_id: String,
        #[serde(rename = "targetId")]
        target_id: String,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
    /// Update - the delta a replica was missing.
    #[serde(rename = "update")]
    Update {
        document: String,
        #[serde(rename = "senderId")]
        sender_id: String,
        #[serde(rename = "targetId")]
        target_id: String,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
    /// Export - full snapshot for cold bootstrap of a new replica.
    #[serde(rename = "export")]
    Export {
        document: String,
        #[serde(rename = "senderId")]
        sender_id: String,
        #[serde(rename = "targetId")]
        target_id: String,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
    /// Error message from a peer.
    #[serde(rename = "error")]
    Error { message: String },
}

impl PeerMessage {
    /// Encode message as CBOR bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ciborium::ser::Error<std::io::Error>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)?;
        Ok(buf)
    }

    /// Decode message from CBOR bytes.
    pub fn decode(data: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::from_reader(data)
    }

    /// Document this message concerns, if any.
    pub fn document(&self) -> Option<&str> {
        match self {
            PeerMessage::StateVector { document, .. }
            | PeerMessage::Update { document, .. }
            | PeerMessage::Export { document, .. } => Some(document),
            PeerMessage::Error { .. } => None,
        }
    }
}

/// Generate a random device ID for this replica.
pub fn generate_device_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_device_id() {
        let id1 = generate_device_id();
        let id2 = generate_device_id();
        assert_ne!(id1, id2);
        assert!(uuid::Uuid::parse_str(&id1).is_ok());
    }

    #[test]
    fn test_state_vector_message_encode_decode() {
        let msg = PeerMessage::StateVector {
            document: "progress:user1".to_string(),
            sender_id: "device-a".to_string(),
            target_id: "device-b".to_string(),
            data: vec![1, 2, 3],
        };

        let encoded = msg.encode().unwrap();
        let decoded = PeerMessage::decode(&encoded).unwrap();

        match decoded {
            PeerMessage::StateVector {
                document,
                sender_id,
                target_id,
                data,
            } => {
                assert_eq!(document, "progress:user1");
                assert_eq!(sender_id, "device-a");
                assert_eq!(target_id, "device-b");
                assert_eq!(data, vec![1, 2, 3]);
            }
            _ => panic!("Expected StateVector message"),
        }
    }

    #[test]
    fn test_update_message_encode_decode() {
        let msg = PeerMessage::Update {
            document: "chat:conv1".to_string(),
            sender_id: "device-a".to_string(),
            target_id: "device-b".to_string(),
            data: vec![9, 8, 7, 6],
        };

        let encoded = msg.encode().unwrap();
        let decoded = PeerMessage::decode(&encoded).unwrap();

        match decoded {
            PeerMessage::Update { document, data, .. } => {
                assert_eq!(document, "chat:conv1");
                assert_eq!(data, vec![9, 8, 7, 6]);
            }
            _ => panic!("Expected Update message"),
        }
    }

    #[test]
    fn test_error_message_encode_decode() {
        let msg = PeerMessage::Error {
            message: "unknown document".to_string(),
        };

        let encoded = msg.encode().unwrap();
        let decoded = PeerMessage::decode(&encoded).unwrap();

        match decoded {
            PeerMessage::Error { message } => assert_eq!(message, "unknown document"),
            _ => panic!("Expected Error message"),
        }
    }

    #[test]
    fn test_document_accessor() {
        let msg = PeerMessage::Export {
            document: "progress:user1".to_string(),
            sender_id: "a".to_string(),
            target_id: "b".to_string(),
            data: vec![],
        };
        assert_eq!(msg.document(), Some("progress:user1"));

        let err = PeerMessage::Error {
            message: "x".to_string(),
        };
        assert_eq!(err.document(), None);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(PeerMessage::decode(b"not a message").is_err());
    }
}
