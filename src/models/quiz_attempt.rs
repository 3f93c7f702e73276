use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One answer to one question at one moment in time.
///
/// Attempts are immutable once created: replicas only ever union their
/// attempt logs, so the full history survives any sync order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub user_id: String,
    pub question_id: String,
    pub answer: String,
    pub is_correct: bool,
    /// Seconds spent on this attempt.
    pub time_spent: u32,
    pub attempted_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn new(
        user_id: impl Into<String>,
        question_id: impl Into<String>,
        answer: impl Into<String>,
        is_correct: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            question_id: question_id.into(),
            answer: answer.into(),
            is_correct,
            time_spent: 0,
            attempted_at: Utc::now(),
        }
    }

    pub fn with_time_spent(mut self, seconds: u32) -> Self {
        self.time_spent = seconds;
        self
    }

    pub fn with_attempted_at(mut self, at: DateTime<Utc>) -> Self {
        self.attempted_at = at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_attempt_new() {
        let attempt = QuizAttempt::new("user1", "q1", "42", true);

        assert_eq!(attempt.user_id, "user1");
        assert_eq!(attempt.question_id, "q1");
        assert_eq!(attempt.answer, "42");
        assert!(attempt.is_correct);
        assert_eq!(attempt.time_spent, 0);
    }

    #[test]
    fn test_quiz_attempt_ids_unique() {
        let a = QuizAttempt::new("user1", "q1", "yes", true);
        let b = QuizAttempt::new("user1", "q1", "yes", true);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_quiz_attempt_json_roundtrip() {
        let attempt = QuizAttempt::new("user1", "q1", "Paris", true).with_time_spent(12);

        let json = serde_json::to_string(&attempt).unwrap();
        let parsed: QuizAttempt = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, attempt);
    }
}
