use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Where a learner stands on a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
    Mastered,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressStatus::NotStarted => write!(f, "not_started"),
            ProgressStatus::InProgress => write!(f, "in_progress"),
            ProgressStatus::Completed => write!(f, "completed"),
            ProgressStatus::Mastered => write!(f, "mastered"),
        }
    }
}

impl FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "not_started" => Ok(ProgressStatus::NotStarted),
            "in_progress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            "mastered" => Ok(ProgressStatus::Mastered),
            _ => Err(format!(
                "Invalid progress status '{}'. Valid options: not_started, in_progress, completed, mastered",
                s
            )),
        }
    }
}

/// Learning progress for one (user, content) pair.
///
/// Created on first interaction with the content and mutated on every
/// interaction afterwards. Records are never deleted; divergent copies are
/// superseded by conflict resolution during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningProgress {
    pub id: Uuid,
    pub user_id: String,
    pub content_id: String,
    pub status: ProgressStatus,
    /// Total seconds spent on the content.
    pub time_spent: u32,
    pub attempts_count: u32,
    pub correct_answers: u32,
    pub total_questions: u32,
    /// Demonstrated competence, 0-100.
    pub mastery_score: u8,
    pub last_accessed_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LearningProgress {
    pub fn new(user_id: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            content_id: content_id.into(),
            status: ProgressStatus::NotStarted,
            time_spent: 0,
            attempts_count: 0,
            correct_answers: 0,
            total_questions: 0,
            mastery_score: 0,
            last_accessed_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_status(mut self, status: ProgressStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the mastery score, clamped to 0-100.
    pub fn with_mastery_score(mut self, score: u8) -> Self {
        self.mastery_score = score.min(100);
        self
    }

    pub fn with_attempts(mut self, attempts: u32, correct: u32) -> Self {
        self.attempts_count = attempts;
        self.correct_answers = correct;
        self
    }

    pub fn with_time_spent(mut self, seconds: u32) -> Self {
        self.time_spent = seconds;
        self
    }

    pub fn with_last_accessed_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed_at = at;
        self
    }

    /// Records one quiz interaction: bumps the attempt counters, adds the
    /// time spent, and touches the access timestamp.
    pub fn record_attempt(&mut self, is_correct: bool, seconds: u32) {
        self.attempts_count += 1;
        if is_correct {
            self.correct_answers += 1;
        }
        self.time_spent += seconds;
        self.last_accessed_at = Utc::now();
        if self.status == ProgressStatus::NotStarted {
            self.status = ProgressStatus::InProgress;
        }
    }

    /// Marks the content completed, stamping `completed_at` on the first call.
    pub fn mark_completed(&mut self) {
        self.status = ProgressStatus::Completed;
        if self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        self.last_accessed_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_status_display() {
        assert_eq!(format!("{}", ProgressStatus::NotStarted), "not_started");
        assert_eq!(format!("{}", ProgressStatus::InProgress), "in_progress");
        assert_eq!(format!("{}", ProgressStatus::Completed), "completed");
        assert_eq!(format!("{}", ProgressStatus::Mastered), "mastered");
    }

    #[test]
    fn test_progress_status_from_str() {
        assert_eq!(
            ProgressStatus::from_str("not_started").unwrap(),
            ProgressStatus::NotStarted
        );
        assert_eq!(
            ProgressStatus::from_str("MASTERED").unwrap(),
            ProgressStatus::Mastered
        );
        assert!(ProgressStatus::from_str("finished").is_err());
    }

    #[test]
    fn test_progress_new() {
        let progress = LearningProgress::new("user1", "content1");

        assert_eq!(progress.user_id, "user1");
        assert_eq!(progress.content_id, "content1");
        assert_eq!(progress.status, ProgressStatus::NotStarted);
        assert_eq!(progress.attempts_count, 0);
        assert_eq!(progress.mastery_score, 0);
        assert!(progress.completed_at.is_none());
    }

    #[test]
    fn test_mastery_score_clamped() {
        let progress = LearningProgress::new("user1", "content1").with_mastery_score(250);
        assert_eq!(progress.mastery_score, 100);
    }

    #[test]
    fn test_record_attempt() {
        let mut progress = LearningProgress::new("user1", "content1");

        progress.record_attempt(true, 30);
        progress.record_attempt(false, 45);

        assert_eq!(progress.attempts_count, 2);
        assert_eq!(progress.correct_answers, 1);
        assert_eq!(progress.time_spent, 75);
        assert_eq!(progress.status, ProgressStatus::InProgress);
    }

    #[test]
    fn test_mark_completed_stamps_once() {
        let mut progress = LearningProgress::new("user1", "content1");

        progress.mark_completed();
        let first = progress.completed_at;
        assert!(first.is_some());

        progress.mark_completed();
        assert_eq!(progress.completed_at, first);
    }

    #[test]
    fn test_progress_json_roundtrip() {
        let progress = LearningProgress::new("user1", "content1")
            .with_status(ProgressStatus::Mastered)
            .with_mastery_score(92)
            .with_attempts(5, 4);

        let json = serde_json::to_string(&progress).unwrap();
        let parsed: LearningProgress = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, progress.id);
        assert_eq!(parsed.status, progress.status);
        assert_eq!(parsed.mastery_score, progress.mastery_score);
        assert_eq!(parsed.attempts_count, progress.attempts_count);
    }
}
