//! Persist repository contract
//!
//! The coordination store (ZooKeeper, etcd, ...) is reached through this
//! trait. Every call is a blocking round trip from the caller's point of view.

use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Kind of change observed under a watched prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Added => write!(f, "ADDED"),
            ChangeType::Updated => write!(f, "UPDATED"),
            ChangeType::Deleted => write!(f, "DELETED"),
        }
    }
}

/// A single key change delivered to watchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChangedEvent {
    pub key: String,
    /// New value; the last known value for deletions.
    pub value: String,
    pub change_type: ChangeType,
}

impl DataChangedEvent {
    pub fn new(key: impl Into<String>, value: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            change_type,
        }
    }
}

/// Callback invoked for every change under a watched prefix.
pub type ChangeListener = Arc<dyn Fn(&DataChangedEvent) + Send + Sync>;

/// Hierarchical key/value store shared by all nodes of the cluster.
pub trait PersistRepository: Send + Sync {
    /// Value stored at `key`, `None` if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Names of the direct children of `key`, sorted. Empty if `key` is absent.
    fn get_children_keys(&self, key: &str) -> Result<Vec<String>>;

    fn is_existed(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Create or overwrite `key`.
    fn persist(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key` and, when [`supports_cascade_delete`] holds, everything
    /// below it. Deleting an absent key succeeds.
    ///
    /// [`supports_cascade_delete`]: PersistRepository::supports_cascade_delete
    fn delete(&self, key: &str) -> Result<()>;

    /// Deliver changes of `key` and every key below it to `listener`.
    fn watch(&self, key: &str, listener: ChangeListener) -> Result<()>;

    /// Whether `delete` removes the whole subtree.
    fn supports_cascade_delete(&self) -> bool {
        true
    }
}
