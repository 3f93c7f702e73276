//! Writers for serializing records into CRDT documents.
//!
//! These functions handle converting Rust structs into document structure.

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ReadDoc};

use crate::models::{ChatMessage, LearningProgress};

/// Writes a learning progress record into a progress map.
///
/// The record is stored at map[content_id] and overwrites any previous
/// version for that content.
pub fn write_progress(doc: &mut AutoCommit, map: &ObjId, progress: &LearningProgress) {
    let entry = doc
        .put_object(map, &progress.content_id, ObjType::Map)
        .expect("Failed to create progress entry");

    doc.put(&entry, "id", progress.id.to_string().as_str())
        .unwrap();
    doc.put(&entry, "user_id", progress.user_id.as_str())
        .unwrap();
    doc.put(&entry, "content_id", progress.content_id.as_str())
        .unwrap();
    doc.put(&entry, "status", progress.status.to_string().as_str())
        .unwrap();
    doc.put(&entry, "time_spent", progress.time_spent as i64)
        .unwrap();
    doc.put(&entry, "attempts_count", progress.attempts_count as i64)
        .unwrap();
    doc.put(&entry, "correct_answers", progress.correct_answers as i64)
        .unwrap();
    doc.put(&entry, "total_questions", progress.total_questions as i64)
        .unwrap();
    doc.put(&entry, "mastery_score", progress.mastery_score as i64)
        .unwrap();
    doc.put(
        &entry,
        "last_accessed_at",
        progress.last_accessed_at.to_rfc3339().as_str(),
    )
    .unwrap();

    if let Some(completed_at) = progress.completed_at {
        doc.put(&entry, "completed_at", completed_at.to_rfc3339().as_str())
            .unwrap();
    }
}

/// Appends a chat message to a message array.
pub fn append_message(doc: &mut AutoCommit, array: &ObjId, message: &ChatMessage) {
    let index = doc.length(array);
    let entry = doc
        .insert_object(array, index, ObjType::Map)
        .expect("Failed to create message entry");

    doc.put(&entry, "id", message.id.to_string().as_str())
        .unwrap();
    doc.put(&entry, "from_user_id", message.from_user_id.as_str())
        .unwrap();
    doc.put(&entry, "to_user_id", message.to_user_id.as_str())
        .unwrap();
    doc.put(&entry, "body", message.body.as_str()).unwrap();
    doc.put(&entry, "kind", message.kind.to_string().as_str())
        .unwrap();
    doc.put(&entry, "encrypted", message.encrypted).unwrap();
    doc.put(&entry, "sent_at", message.sent_at.to_rfc3339().as_str())
        .unwrap();

    if let Some(delivered_at) = message.delivered_at {
        doc.put(&entry, "delivered_at", delivered_at.to_rfc3339().as_str())
            .unwrap();
    }
    if let Some(read_at) = message.read_at {
        doc.put(&entry, "read_at", read_at.to_rfc3339().as_str())
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageKind, ProgressStatus};
    use automerge::ROOT;

    fn progress_map(doc: &mut AutoCommit) -> ObjId {
        doc.put_object(ROOT, "progress", ObjType::Map).unwrap()
    }

    fn message_array(doc: &mut AutoCommit) -> ObjId {
        doc.put_object(ROOT, "messages", ObjType::List).unwrap()
    }

    #[test]
    fn test_write_progress_basic() {
        let mut doc = AutoCommit::new();
        let map = progress_map(&mut doc);

        let progress = LearningProgress::new("user1", "content1")
            .with_status(ProgressStatus::InProgress)
            .with_mastery_score(55);
        write_progress(&mut doc, &map, &progress);

        assert!(doc.get(&map, "content1").unwrap().is_some());
    }

    #[test]
    fn test_write_progress_overwrites() {
        let mut doc = AutoCommit::new();
        let map = progress_map(&mut doc);

        let first = LearningProgress::new("user1", "content1").with_mastery_score(10);
        write_progress(&mut doc, &map, &first);

        let second = LearningProgress::new("user1", "content1").with_mastery_score(90);
        write_progress(&mut doc, &map, &second);

        let (_, entry) = doc.get(&map, "content1").unwrap().unwrap();
        let (score, _) = doc.get(&entry, "mastery_score").unwrap().unwrap();
        assert_eq!(score.to_i64(), Some(90));
    }

    #[test]
    fn test_write_progress_optional_completed_at() {
        let mut doc = AutoCommit::new();
        let map = progress_map(&mut doc);

        let mut progress = LearningProgress::new("user1", "content1");
        write_progress(&mut doc, &map, &progress);

        let (_, entry) = doc.get(&map, "content1").unwrap().unwrap();
        assert!(doc.get(&entry, "completed_at").unwrap().is_none());

        progress.mark_completed();
        write_progress(&mut doc, &map, &progress);

        let (_, entry) = doc.get(&map, "content1").unwrap().unwrap();
        assert!(doc.get(&entry, "completed_at").unwrap().is_some());
    }

    #[test]
    fn test_append_message_keeps_order() {
        let mut doc = AutoCommit::new();
        let array = message_array(&mut doc);

        append_message(&mut doc, &array, &ChatMessage::new("alice", "bob", "one"));
        append_message(&mut doc, &array, &ChatMessage::new("bob", "alice", "two"));

        assert_eq!(doc.length(&array), 2);

        let (_, first) = doc.get(&array, 0).unwrap().unwrap();
        let (body, _) = doc.get(&first, "body").unwrap().unwrap();
        assert_eq!(body.into_string().unwrap(), "one");
    }

    #[test]
    fn test_append_message_kind_and_flags() {
        let mut doc = AutoCommit::new();
        let array = message_array(&mut doc);

        let message = ChatMessage::new("alice", "bob", "listen")
            .with_kind(MessageKind::Voice)
            .encrypted();
        append_message(&mut doc, &array, &message);

        let (_, entry) = doc.get(&array, 0).unwrap().unwrap();
        let (kind, _) = doc.get(&entry, "kind").unwrap().unwrap();
        assert_eq!(kind.into_string().unwrap(), "voice");
        let (encrypted, _) = doc.get(&entry, "encrypted").unwrap().unwrap();
        assert_eq!(encrypted.to_bool(), Some(true));
    }
}
