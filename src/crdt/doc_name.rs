//! Document scope names.
//!
//! Every CRDT document is addressed by a scope name such as
//! `progress:<user_id>` or `chat:<conversation_id>`. The name also derives a
//! filesystem-safe storage id, so the same scope maps to the same durable
//! bytes across process restarts and across devices.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Name of a CRDT document scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocName(String);

impl DocName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Scope holding a user's progress-by-content map.
    pub fn progress(user_id: &str) -> Self {
        Self(format!("progress:{}", user_id))
    }

    /// Scope holding a conversation's message log.
    pub fn chat(conversation_id: &str) -> Self {
        Self(format!("chat:{}", conversation_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind prefix of the scope name (`progress` for `progress:<user>`).
    pub fn kind(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }

    /// Deterministic filesystem-safe id for this scope:
    /// bs58check(sha256(name)[..16]).
    pub fn storage_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let hash = hasher.finalize();
        bs58::encode(&hash[..16]).with_check().into_string()
    }
}

impl fmt::Display for DocName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
