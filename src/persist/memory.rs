//! In-process persist repository
//!
//! Keeps the key tree in a sorted map. Used by single-process deployments and
//! as the store shared by several context managers in tests. Watch listeners
//! are called synchronously, after the write and outside the map lock.

use super::repository::{ChangeListener, ChangeType, DataChangedEvent, PersistRepository};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Sorted in-memory key/value tree.
pub struct MemoryPersistRepository {
    nodes: RwLock<BTreeMap<String, String>>,
    listeners: RwLock<Vec<(String, ChangeListener)>>,
    cascade_delete: bool,
}

impl MemoryPersistRepository {
    /// Create an empty repository whose deletes remove whole subtrees
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            listeners: RwLock::new(Vec::new()),
            cascade_delete: true,
        }
    }

    /// Create an empty repository whose deletes only remove the exact key
    pub fn without_cascade_delete() -> Self {
        Self {
            cascade_delete: false,
            ..Self::new()
        }
    }

    /// All keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        self.nodes.read().keys().cloned().collect()
    }

    fn notify(&self, events: &[DataChangedEvent]) {
        if events.is_empty() {
            return;
        }
        let registered = self.listeners.read().clone();
        for event in events {
            for (prefix, listener) in &registered {
                if is_under(&event.key, prefix) {
                    listener(event);
                }
            }
        }
    }
}

impl Default for MemoryPersistRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// `key` equals `prefix` or lies below it.
fn is_under(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

impl PersistRepository for MemoryPersistRepository {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.nodes.read().get(key).cloned())
    }

    fn get_children_keys(&self, key: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", key.trim_end_matches('/'));
        let nodes = self.nodes.read();
        let mut children: BTreeSet<String> = BTreeSet::new();
        for child_key in nodes.range(prefix.clone()..).map(|(k, _)| k) {
            let Some(rest) = child_key.strip_prefix(&prefix) else {
                break;
            };
            if let Some(child) = rest.split('/').next().filter(|c| !c.is_empty()) {
                children.insert(child.to_string());
            }
        }
        Ok(children.into_iter().collect())
    }

    fn persist(&self, key: &str, value: &str) -> Result<()> {
        let previous = self
            .nodes
            .write()
            .insert(key.to_string(), value.to_string());
        let change_type = match previous {
            Some(_) => ChangeType::Updated,
            None => ChangeType::Added,
        };
        trace!(key, %change_type, "memory repository write");
        self.notify(&[DataChangedEvent::new(key, value, change_type)]);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let removed: Vec<(String, String)> = {
            let mut nodes = self.nodes.write();
            let mut doomed: Vec<String> = Vec::new();
            if nodes.contains_key(key) {
                doomed.push(key.to_string());
            }
            if self.cascade_delete {
                let prefix = format!("{}/", key.trim_end_matches('/'));
                doomed.extend(
                    nodes
                        .range(prefix.clone()..)
                        .map(|(k, _)| k)
                        .take_while(|k| k.starts_with(&prefix))
                        .cloned(),
                );
            }
            // Deepest keys first, so watchers see children go before parents.
            doomed.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            doomed
                .into_iter()
                .filter_map(|k| nodes.remove(&k).map(|v| (k, v)))
                .collect()
        };
        trace!(key, removed = removed.len(), "memory repository delete");
        let events: Vec<DataChangedEvent> = removed
            .into_iter()
            .map(|(k, v)| DataChangedEvent::new(k, v, ChangeType::Deleted))
            .collect();
        self.notify(&events);
        Ok(())
    }

    fn watch(&self, key: &str, listener: ChangeListener) -> Result<()> {
        self.listeners.write().push((key.to_string(), listener));
        Ok(())
    }

    fn supports_cascade_delete(&self) -> bool {
        self.cascade_delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_get_and_children() {
        let repo = MemoryPersistRepository::new();
        repo.persist("/metadata/foo_db", "").unwrap();
        repo.persist("/metadata/foo_db/schemas/b/tables", "").unwrap();
        repo.persist("/metadata/foo_db/schemas/a/tables/t1", "name: t1\n").unwrap();
        repo.persist("/metadata/foo_db/schemas/a/tables/t2", "name: t2\n").unwrap();
        repo.persist("/metadata/foo_dbx", "").unwrap();

        assert_eq!(repo.get("/metadata/foo_db").unwrap(), Some(String::new()));
        assert_eq!(repo.get("/metadata/missing").unwrap(), None);
        assert_eq!(repo.get_children_keys("/metadata").unwrap(), vec!["foo_db", "foo_dbx"]);
        assert_eq!(
            repo.get_children_keys("/metadata/foo_db/schemas").unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            repo.get_children_keys("/metadata/foo_db/schemas/a/tables").unwrap(),
            vec!["t1", "t2"]
        );
        assert!(repo.get_children_keys("/metadata/nope").unwrap().is_empty());
    }

    #[test]
    fn test_delete_removes_subtree_only() {
        let repo = MemoryPersistRepository::new();
        repo.persist("/metadata/foo_db", "").unwrap();
        repo.persist("/metadata/foo_db/schemas/s/tables/t", "name: t\n").unwrap();
        repo.persist("/metadata/foo_dbx", "").unwrap();

        repo.delete("/metadata/foo_db").unwrap();
        assert_eq!(repo.keys(), vec!["/metadata/foo_dbx"]);

        // absent key is a no-op
        repo.delete("/metadata/foo_db").unwrap();
    }

    #[test]
    fn test_delete_without_cascade() {
        let repo = MemoryPersistRepository::without_cascade_delete();
        assert!(!repo.supports_cascade_delete());
        repo.persist("/metadata/foo_db", "").unwrap();
        repo.persist("/metadata/foo_db/schemas/s/tables", "").unwrap();

        repo.delete("/metadata/foo_db").unwrap();
        assert_eq!(repo.keys(), vec!["/metadata/foo_db/schemas/s/tables"]);
    }

    #[test]
    fn test_watch_events() {
        let repo = MemoryPersistRepository::new();
        let seen: Arc<Mutex<Vec<(String, ChangeType)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        repo.watch(
            "/metadata/foo_db",
            Arc::new(move |event: &DataChangedEvent| {
                sink.lock().push((event.key.clone(), event.change_type));
            }),
        )
        .unwrap();

        repo.persist("/metadata/foo_db", "").unwrap();
        repo.persist("/metadata/foo_db/schemas/s/tables", "").unwrap();
        repo.persist("/metadata/foo_db/schemas/s/tables", "").unwrap();
        repo.persist("/metadata/foo_dbx", "").unwrap();
        repo.delete("/metadata/foo_db").unwrap();

        let seen = seen.lock().clone();
        assert_eq!(
            seen,
            vec![
                ("/metadata/foo_db".to_string(), ChangeType::Added),
                ("/metadata/foo_db/schemas/s/tables".to_string(), ChangeType::Added),
                ("/metadata/foo_db/schemas/s/tables".to_string(), ChangeType::Updated),
                ("/metadata/foo_db/schemas/s/tables".to_string(), ChangeType::Deleted),
                ("/metadata/foo_db".to_string(), ChangeType::Deleted),
            ]
        );
    }

    #[test]
    fn test_is_under() {
        assert!(is_under("/metadata/a", "/metadata"));
        assert!(is_under("/metadata", "/metadata"));
        assert!(!is_under("/metadatax", "/metadata"));
        assert!(is_under("/metadata/a", "/"));
    }
}
