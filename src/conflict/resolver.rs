use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChatMessage, LearningProgress, QuizAttempt};

/// Errors raised while configuring conflict resolution.
#[derive(Error, Debug)]
pub enum ConflictError {
    #[error("custom resolution strategy requires a resolver instance")]
    MissingCustomResolver,
}

/// Picks or merges between two divergent copies of the same logical record.
///
/// Implementations are synchronous, total, and side-effect free. The first
/// argument is always the local copy, the second the remote one; resolvers
/// that tie-break do so in favor of `local`.
pub trait ConflictResolver<T> {
    fn resolve(&self, local: T, remote: T) -> T;
}

/// Records eligible for last-write-wins resolution.
///
/// A record exposes whichever of the two timestamps it carries; the effective
/// timestamp is `updated_at`, falling back to `last_accessed_at`, falling
/// back to the Unix epoch.
pub trait Timestamped {
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn last_accessed_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Timestamped for LearningProgress {
    fn last_accessed_at(&self) -> Option<DateTime<Utc>> {
        Some(self.last_accessed_at)
    }
}

impl Timestamped for ChatMessage {
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.sent_at)
    }
}

fn effective_timestamp<T: Timestamped>(record: &T) -> DateTime<Utc> {
    record
        .updated_at()
        .or_else(|| record.last_accessed_at())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Last-write-wins: the copy with the later effective timestamp survives.
///
/// Exact ties keep `local`, so the outcome is deterministic as long as the
/// caller is consistent about which copy it passes as local.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriteWins;

impl<T: Timestamped> ConflictResolver<T> for LastWriteWins {
    fn resolve(&self, local: T, remote: T) -> T {
        if effective_timestamp(&remote) > effective_timestamp(&local) {
            remote
        } else {
            local
        }
    }
}

/// Learning-progress resolution: mastery first, then attempts, then recency.
///
/// Mastery is the ground-truth learning signal and must never regress, so it
/// outranks any timestamp. The whole record is selected from one side; fields
/// from the losing side (including a larger `time_spent`) are discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LearningProgressResolver;

impl ConflictResolver<LearningProgress> for LearningProgressResolver {
    fn resolve(&self, local: LearningProgress, remote: LearningProgress) -> LearningProgress {
        if local.mastery_score != remote.mastery_score {
            return if remote.mastery_score > local.mastery_score {
                remote
            } else {
                local
            };
        }

        if local.attempts_count != remote.attempts_count {
            return if remote.attempts_count > local.attempts_count {
                remote
            } else {
                local
            };
        }

        if remote.last_accessed_at > local.last_accessed_at {
            remote
        } else {
            local
        }
    }
}

/// Quiz-attempt resolution: union of both logs, nothing discarded.
///
/// Attempts are immutable, so an id collision means an exact duplicate; the
/// local entry is kept. Output is sorted by attempt time (id as a stable
/// tiebreaker) so the merged log reads chronologically on every replica.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuizAttemptsResolver;

impl ConflictResolver<Vec<QuizAttempt>> for QuizAttemptsResolver {
    fn resolve(&self, local: Vec<QuizAttempt>, remote: Vec<QuizAttempt>) -> Vec<QuizAttempt> {
        let mut merged: HashMap<Uuid, QuizAttempt> = HashMap::new();

        for attempt in local {
            merged.insert(attempt.id, attempt);
        }
        for attempt in remote {
            merged.entry(attempt.id).or_insert(attempt);
        }

        let mut attempts: Vec<QuizAttempt> = merged.into_values().collect();
        attempts.sort_by(|a, b| {
            a.attempted_at
                .cmp(&b.attempted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        attempts
    }
}

/// Named resolution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    LastWriteWins,
    Merge,
    Custom,
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionStrategy::LastWriteWins => write!(f, "last-write-wins"),
            ResolutionStrategy::Merge => write!(f, "merge"),
            ResolutionStrategy::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-write-wins" => Ok(ResolutionStrategy::LastWriteWins),
            "merge" => Ok(ResolutionStrategy::Merge),
            "custom" => Ok(ResolutionStrategy::Custom),
            _ => Err(format!(
                "Invalid resolution strategy '{}'. Valid options: last-write-wins, merge, custom",
                s
            )),
        }
    }
}

/// Selects a resolver for the given strategy.
///
/// `Custom` requires a caller-supplied resolver and fails without one.
/// `Merge` currently falls back to last-write-wins; a field-level merge
/// needs per-type rules that do not exist yet.
pub fn create_resolver<T: Timestamped + 'static>(
    strategy: ResolutionStrategy,
    custom: Option<Box<dyn ConflictResolver<T>>>,
) -> Result<Box<dyn ConflictResolver<T>>, ConflictError> {
    match strategy {
        ResolutionStrategy::Custom => custom.ok_or(ConflictError::MissingCustomResolver),
        ResolutionStrategy::LastWriteWins | ResolutionStrategy::Merge => {
            Ok(Box::new(LastWriteWins))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        body: String,
        updated_at: Option<DateTime<Utc>>,
    }

    impl Timestamped for Note {
        fn updated_at(&self) -> Option<DateTime<Utc>> {
            self.updated_at
        }
    }

    fn note(id: &str, body: &str, updated_at: Option<DateTime<Utc>>) -> Note {
        Note {
            id: id.to_string(),
            body: body.to_string(),
            updated_at,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_lww_newer_remote_wins() {
        let local = note("n1", "old", Some(at(100)));
        let remote = note("n1", "new", Some(at(200)));

        let resolved = LastWriteWins.resolve(local, remote.clone());
        assert_eq!(resolved, remote);
    }

    #[test]
    fn test_lww_newer_local_wins() {
        let local = note("n1", "new", Some(at(300)));
        let remote = note("n1", "old", Some(at(200)));

        let resolved = LastWriteWins.resolve(local.clone(), remote);
        assert_eq!(resolved, local);
    }

    #[test]
    fn test_lww_tie_keeps_local() {
        let local = note("n1", "mine", Some(at(200)));
        let remote = note("n1", "theirs", Some(at(200)));

        // Deterministic across repeated calls: the tie always keeps local.
        for _ in 0..3 {
            let resolved = LastWriteWins.resolve(local.clone(), remote.clone());
            assert_eq!(resolved, local);
        }
    }

    #[test]
    fn test_lww_missing_timestamp_falls_back_to_epoch() {
        let local = note("n1", "untimed", None);
        let remote = note("n1", "timed", Some(at(1)));

        let resolved = LastWriteWins.resolve(local, remote.clone());
        assert_eq!(resolved, remote);
    }

    #[test]
    fn test_lww_falls_back_to_last_accessed() {
        // LearningProgress carries no updated_at; last_accessed_at drives LWW.
        let local = LearningProgress::new("user1", "c1").with_last_accessed_at(at(500));
        let remote = LearningProgress::new("user1", "c1").with_last_accessed_at(at(400));

        let resolved = LastWriteWins.resolve(local.clone(), remote);
        assert_eq!(resolved.id, local.id);
    }

    #[test]
    fn test_progress_higher_mastery_beats_recency() {
        let local = LearningProgress::new("user1", "c1")
            .with_mastery_score(40)
            .with_attempts(2, 1)
            .with_last_accessed_at(at(1000));
        let remote = LearningProgress::new("user1", "c1")
            .with_mastery_score(85)
            .with_attempts(1, 1)
            .with_last_accessed_at(at(100));

        let resolved = LearningProgressResolver.resolve(local, remote.clone());
        assert_eq!(resolved.id, remote.id);
        assert_eq!(resolved.mastery_score, 85);
    }

    #[test]
    fn test_progress_equal_mastery_more_attempts_wins() {
        let local = LearningProgress::new("user1", "c1")
            .with_mastery_score(60)
            .with_attempts(5, 3)
            .with_last_accessed_at(at(100));
        let remote = LearningProgress::new("user1", "c1")
            .with_mastery_score(60)
            .with_attempts(2, 2)
            .with_last_accessed_at(at(1000));

        let resolved = LearningProgressResolver.resolve(local.clone(), remote);
        assert_eq!(resolved.id, local.id);
    }

    #[test]
    fn test_progress_final_tiebreaker_is_recency() {
        let local = LearningProgress::new("user1", "c1")
            .with_mastery_score(60)
            .with_attempts(3, 2)
            .with_last_accessed_at(at(100));
        let remote = LearningProgress::new("user1", "c1")
            .with_mastery_score(60)
            .with_attempts(3, 2)
            .with_last_accessed_at(at(200));

        let resolved = LearningProgressResolver.resolve(local, remote.clone());
        assert_eq!(resolved.id, remote.id);
    }

    #[test]
    fn test_quiz_attempts_union() {
        let shared = QuizAttempt::new("user1", "q1", "a", true).with_attempted_at(at(1));
        let remote_only = QuizAttempt::new("user1", "q2", "b", false).with_attempted_at(at(2));

        let local = vec![shared.clone()];
        let remote = vec![shared.clone(), remote_only.clone()];

        let merged = QuizAttemptsResolver.resolve(local, remote);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, shared.id);
        assert_eq!(merged[1].id, remote_only.id);
    }

    #[test]
    fn test_quiz_attempts_sorted_by_time() {
        let late = QuizAttempt::new("user1", "q1", "a", true).with_attempted_at(at(300));
        let early = QuizAttempt::new("user1", "q2", "b", false).with_attempted_at(at(100));
        let middle = QuizAttempt::new("user1", "q3", "c", true).with_attempted_at(at(200));

        let merged =
            QuizAttemptsResolver.resolve(vec![late.clone(), early.clone()], vec![middle.clone()]);

        let order: Vec<Uuid> = merged.iter().map(|a| a.id).collect();
        assert_eq!(order, vec![early.id, middle.id, late.id]);
    }

    #[test]
    fn test_quiz_attempts_collision_keeps_local() {
        let mut local_copy = QuizAttempt::new("user1", "q1", "a", true).with_attempted_at(at(1));
        let mut remote_copy = local_copy.clone();
        local_copy.answer = "local".to_string();
        remote_copy.answer = "remote".to_string();

        let merged = QuizAttemptsResolver.resolve(vec![local_copy], vec![remote_copy]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].answer, "local");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            ResolutionStrategy::from_str("last-write-wins").unwrap(),
            ResolutionStrategy::LastWriteWins
        );
        assert_eq!(
            ResolutionStrategy::from_str("Merge").unwrap(),
            ResolutionStrategy::Merge
        );
        assert!(ResolutionStrategy::from_str("newest").is_err());
    }

    #[test]
    fn test_factory_custom_without_resolver_fails() {
        let result = create_resolver::<Note>(ResolutionStrategy::Custom, None);
        assert!(matches!(result, Err(ConflictError::MissingCustomResolver)));
    }

    #[test]
    fn test_factory_custom_with_resolver() {
        struct AlwaysRemote;
        impl ConflictResolver<Note> for AlwaysRemote {
            fn resolve(&self, _local: Note, remote: Note) -> Note {
                remote
            }
        }

        let resolver =
            create_resolver(ResolutionStrategy::Custom, Some(Box::new(AlwaysRemote))).unwrap();

        let local = note("n1", "mine", Some(at(500)));
        let remote = note("n1", "theirs", Some(at(1)));
        assert_eq!(resolver.resolve(local, remote.clone()), remote);
    }

    #[test]
    fn test_factory_merge_aliases_last_write_wins() {
        let resolver = create_resolver::<Note>(ResolutionStrategy::Merge, None).unwrap();

        let local = note("n1", "old", Some(at(100)));
        let remote = note("n1", "new", Some(at(200)));
        assert_eq!(resolver.resolve(local, remote.clone()), remote);
    }
}
