//! Conflict resolution for offline sync.
//!
//! When two devices mutate the same logical record while disconnected, one
//! copy must survive (or the copies must merge). The resolvers here are pure
//! functions over the two versions; [`reconcile`] lifts a resolver over whole
//! record collections.

mod reconcile;
mod resolver;

pub use reconcile::reconcile;
pub use resolver::{
    create_resolver, ConflictError, ConflictResolver, LastWriteWins, LearningProgressResolver,
    QuizAttemptsResolver, ResolutionStrategy, Timestamped,
};
