use std::collections::HashMap;

use super::resolver::ConflictResolver;

/// Merges a local record collection with an incoming remote batch.
///
/// The result holds exactly one record per distinct id across both inputs:
/// records present on only one side pass through unchanged, and ids present
/// on both are handed to `resolver` (local first, remote second). Pure
/// function of its inputs; persistence is the caller's responsibility, and
/// output order is unspecified.
pub fn reconcile<T, F>(
    local: Vec<T>,
    remote: Vec<T>,
    resolver: &dyn ConflictResolver<T>,
    identity: F,
) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let mut merged: HashMap<String, T> = HashMap::new();

    for record in local {
        merged.insert(identity(&record), record);
    }

    for record in remote {
        let id = identity(&record);
        match merged.remove(&id) {
            Some(existing) => {
                merged.insert(id, resolver.resolve(existing, record));
            }
            None => {
                merged.insert(id, record);
            }
        }
    }

    merged.into_values().collect()
}
