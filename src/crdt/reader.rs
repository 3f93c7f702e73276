//! Readers for deserializing records out of CRDT documents.

use automerge::{AutoCommit, ObjId, ReadDoc};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ChatMessage, LearningProgress, MessageKind, ProgressStatus};

/// Error type for reader operations.
#[derive(Debug)]
pub enum ReaderError {
    /// Automerge operation failed.
    AutomergeError(String),
    /// Failed to parse a value.
    ParseError(String),
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderError::AutomergeError(e) => write!(f, "Automerge error: {}", e),
            ReaderError::ParseError(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ReaderError {}

/// Reads one learning progress record from a progress map.
pub fn read_progress(
    doc: &AutoCommit,
    map: &ObjId,
    content_id: &str,
) -> Result<Option<LearningProgress>, ReaderError> {
    if let Some((_, entry)) = doc
        .get(map, content_id)
        .map_err(|e| ReaderError::AutomergeError(e.to_string()))?
    {
        read_progress_entry(doc, &entry, content_id)
    } else {
        Ok(None)
    }
}

/// Reads every learning progress record from a progress map.
pub fn read_all_progress(
    doc: &AutoCommit,
    map: &ObjId,
) -> Result<Vec<LearningProgress>, ReaderError> {
    let mut records = Vec::new();

    for content_id in doc.keys(map) {
        if let Some((_, entry)) = doc
            .get(map, &content_id)
            .map_err(|e| ReaderError::AutomergeError(e.to_string()))?
        {
            if let Some(progress) = read_progress_entry(doc, &entry, &content_id)? {
                records.push(progress);
            }
        }
    }

    Ok(records)
}

fn read_progress_entry(
    doc: &AutoCommit,
    entry: &ObjId,
    content_id: &str,
) -> Result<Option<LearningProgress>, ReaderError> {
    let id = match get_string(doc, entry, "id")?.and_then(|s| Uuid::parse_str(&s).ok()) {
        Some(id) => id,
        None => return Ok(None), // Skip malformed entries
    };

    let user_id = get_string(doc, entry, "user_id")?.unwrap_or_default();

    let status = get_string(doc, entry, "status")?
        .and_then(|s| s.parse().ok())
        .unwrap_or(ProgressStatus::NotStarted);

    let time_spent = get_i64(doc, entry, "time_spent")?.unwrap_or(0) as u32;
    let attempts_count = get_i64(doc, entry, "attempts_count")?.unwrap_or(0) as u32;
    let correct_answers = get_i64(doc, entry, "correct_answers")?.unwrap_or(0) as u32;
    let total_questions = get_i64(doc, entry, "total_questions")?.unwrap_or(0) as u32;
    let mastery_score = get_i64(doc, entry, "mastery_score")?.unwrap_or(0).clamp(0, 100) as u8;

    // The access timestamp drives conflict resolution, so a malformed value
    // is an error rather than a silent "now".
    let last_accessed_at = match get_string(doc, entry, "last_accessed_at")? {
        Some(s) => parse_timestamp(&s)?,
        None => {
            return Err(ReaderError::ParseError(format!(
                "progress entry '{}' missing last_accessed_at",
                content_id
            )))
        }
    };

    let completed_at = get_string(doc, entry, "completed_at")?
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Some(LearningProgress {
        id,
        user_id,
        content_id: content_id.to_string(),
        status,
        time_spent,
        attempts_count,
        correct_answers,
        total_questions,
        mastery_score,
        last_accessed_at,
        completed_at,
    }))
}

/// Reads every chat message from a message array, in array order.
pub fn read_messages(doc: &AutoCommit, array: &ObjId) -> Result<Vec<ChatMessage>, ReaderError> {
    let mut messages = Vec::new();
    let len = doc.length(array);

    for i in 0..len {
        if let Some((_, entry)) = doc
            .get(array, i)
            .map_err(|e| ReaderError::AutomergeError(e.to_string()))?
        {
            if let Some(message) = read_message_entry(doc, &entry)? {
                messages.push(message);
            }
        }
    }

    Ok(messages)
}

fn read_message_entry(
    doc: &AutoCommit,
    entry: &ObjId,
) -> Result<Option<ChatMessage>, ReaderError> {
    let id = match get_string(doc, entry, "id")?.and_then(|s| Uuid::parse_str(&s).ok()) {
        Some(id) => id,
        None => return Ok(None),
    };

    let from_user_id = get_string(doc, entry, "from_user_id")?.unwrap_or_default();
    let to_user_id = get_string(doc, entry, "to_user_id")?.unwrap_or_default();
    let body = get_string(doc, entry, "body")?.unwrap_or_default();

    let kind = get_string(doc, entry, "kind")?
        .and_then(|s| s.parse().ok())
        .unwrap_or(MessageKind::Text);

    let encrypted = get_bool(doc, entry, "encrypted")?.unwrap_or(false);

    let sent_at = match get_string(doc, entry, "sent_at")? {
        Some(s) => parse_timestamp(&s)?,
        None => {
            return Err(ReaderError::ParseError(format!(
                "message '{}' missing sent_at",
                id
            )))
        }
    };

    let delivered_at = get_string(doc, entry, "delivered_at")?
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    let read_at = get_string(doc, entry, "read_at")?
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Some(ChatMessage {
        id,
        from_user_id,
        to_user_id,
        body,
        kind,
        encrypted,
        sent_at,
        delivered_at,
        read_at,
    }))
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ReaderError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ReaderError::ParseError(format!("Invalid timestamp '{}': {}", s, e)))
}

fn get_string(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<String>, ReaderError> {
    if let Some((value, _)) = doc
        .get(obj_id, key)
        .map_err(|e| ReaderError::AutomergeError(e.to_string()))?
    {
        Ok(value.into_string().ok())
    } else {
        Ok(None)
    }
}

fn get_i64(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<i64>, ReaderError> {
    if let Some((value, _)) = doc
        .get(obj_id, key)
        .map_err(|e| ReaderError::AutomergeError(e.to_string()))?
    {
        Ok(value.to_i64())
    } else {
        Ok(None)
    }
}

fn get_bool(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<bool>, ReaderError> {
    if let Some((value, _)) = doc
        .get(obj_id, key)
        .map_err(|e| ReaderError::AutomergeError(e.to_string()))?
    {
        Ok(value.to_bool())
    } else {
        Ok(None)
    }
}
