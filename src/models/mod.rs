mod chat_message;
mod progress;
mod quiz_attempt;
mod sync_log;

pub use chat_message::{ChatMessage, MessageKind};
pub use progress::{LearningProgress, ProgressStatus};
pub use quiz_attempt::QuizAttempt;
pub use sync_log::{SyncLog, SyncStatus, SyncTransport};
