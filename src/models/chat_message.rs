use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Voice,
    Image,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::Voice => write!(f, "voice"),
            MessageKind::Image => write!(f, "image"),
        }
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(MessageKind::Text),
            "voice" => Ok(MessageKind::Voice),
            "image" => Ok(MessageKind::Image),
            _ => Err(format!(
                "Invalid message kind '{}'. Valid options: text, voice, image",
                s
            )),
        }
    }
}

/// A peer-tutoring chat message.
///
/// Messages live in a per-conversation shared array; delivery and read
/// receipts are stamped locally and merge like any other document state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub from_user_id: String,
    pub to_user_id: String,
    pub body: String,
    pub kind: MessageKind,
    pub encrypted: bool,
    pub sent_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn new(
        from_user_id: impl Into<String>,
        to_user_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_user_id: from_user_id.into(),
            to_user_id: to_user_id.into(),
            body: body.into(),
            kind: MessageKind::Text,
            encrypted: false,
            sent_at: Utc::now(),
            delivered_at: None,
            read_at: None,
        }
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    pub fn mark_delivered(&mut self) {
        if self.delivered_at.is_none() {
            self.delivered_at = Some(Utc::now());
        }
    }

    pub fn mark_read(&mut self) {
        if self.read_at.is_none() {
            self.read_at = Some(Utc::now());
        }
    }
}
