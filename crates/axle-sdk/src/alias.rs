//! Task handle to task id aliases
//!
//! Handles are the caller-facing names of tasks; ids are `sha256(handle)`.
//! The cache is only a shortcut and can always be rebuilt from handles. Only
//! handles of tasks known to exist are stored, so lookups of unknown handles
//! never grow it.

use axle_crypto::task_id_from_handle;
use axle_types::TaskId;
use dashmap::DashMap;

/// Storage for handle aliases
pub trait AliasStore: Send + Sync {
    fn get(&self, handle: &str) -> Option<TaskId>;

    fn insert(&self, handle: &str, task_id: TaskId);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process alias cache
#[derive(Debug, Default)]
pub struct TaskAliasCache {
    entries: DashMap<String, TaskId>,
}

impl TaskAliasCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AliasStore for TaskAliasCache {
    fn get(&self, handle: &str) -> Option<TaskId> {
        self.entries.get(handle).map(|entry| *entry.value())
    }

    fn insert(&self, handle: &str, task_id: TaskId) {
        self.entries.insert(handle.to_string(), task_id);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Task id for a handle, from the cache if present
pub fn resolve(store: &dyn AliasStore, handle: &str) -> TaskId {
    store
        .get(handle)
        .unwrap_or_else(|| task_id_from_handle(handle))
}

/// Record the alias of a task confirmed on the ledger
pub fn remember(store: &dyn AliasStore, handle: &str, task_id: TaskId) {
    if store.get(handle).is_none() {
        store.insert(handle, task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_does_not_grow_cache() {
        let cache = TaskAliasCache::new();

        let id = resolve(&cache, "task-a");
        assert_eq!(id, task_id_from_handle("task-a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remember_then_resolve_hits_cache() {
        let cache = TaskAliasCache::new();
        let id = task_id_from_handle("task-a");

        remember(&cache, "task-a", id);
        remember(&cache, "task-a", id);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("task-a"), Some(id));
        assert_eq!(resolve(&cache, "task-a"), id);
    }
}
