//! Database and schema mutual exclusion
//!
//! Database creation and removal hold their database exclusively; schema
//! mutations hold it shared and then lock their own schema. Mutations of one
//! schema run one at a time while different schemas proceed in parallel.
//! Guards are owned so they can be held across repository calls without
//! borrowing the registry.

use parking_lot::{
    ArcMutexGuard, ArcRwLockReadGuard, ArcRwLockWriteGuard, Mutex, RawMutex, RawRwLock, RwLock,
};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Held while a schema is being mutated.
pub type SchemaGuard = ArcMutexGuard<RawMutex, ()>;

/// Held by schema mutations; keeps the database from being created or dropped.
pub type DatabaseSharedGuard = ArcRwLockReadGuard<RawRwLock, ()>;

/// Held while a database is being created or dropped.
pub type DatabaseExclusiveGuard = ArcRwLockWriteGuard<RawRwLock, ()>;

/// Lazily created locks keyed by name.
#[derive(Debug)]
struct Registry<K, L> {
    entries: Mutex<HashMap<K, Arc<L>>>,
}

impl<K, L> Default for Registry<K, L> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, L: Default> Registry<K, L> {
    fn get(&self, key: K) -> Arc<L> {
        self.entries.lock().entry(key).or_default().clone()
    }

    /// Drop the entry for `key` unless someone holds or waits on it.
    fn forget(&self, key: &K) {
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            entries.remove(key);
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Registry of one lock per database and one per (database, schema key).
#[derive(Debug, Default)]
pub struct SchemaLocks {
    databases: Registry<String, RwLock<()>>,
    schemas: Registry<(String, String), Mutex<()>>,
}

impl SchemaLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no schema mutation of `database` runs and hold it alone.
    pub fn lock_database(&self, database: &str) -> DatabaseExclusiveGuard {
        self.databases.get(database.to_string()).write_arc()
    }

    /// Block until `database` is not being created or dropped.
    pub fn share_database(&self, database: &str) -> DatabaseSharedGuard {
        self.databases.get(database.to_string()).read_arc()
    }

    /// Block until the schema is free and return its guard.
    pub fn lock(&self, database: &str, schema: &str) -> SchemaGuard {
        self.schemas
            .get((database.to_string(), schema.to_string()))
            .lock_arc()
    }

    /// Lock several schemas of one database. Names are locked in sorted order
    /// and duplicates are locked once, so two callers never wait on each other
    /// in a cycle.
    pub fn lock_all(&self, database: &str, schemas: &[&str]) -> Vec<SchemaGuard> {
        let mut ordered: Vec<&str> = schemas.to_vec();
        ordered.sort_unstable();
        ordered.dedup();
        ordered
            .into_iter()
            .map(|schema| self.lock(database, schema))
            .collect()
    }

    /// Release the registry entry of a schema that is gone. Entries still in
    /// use are kept.
    pub fn forget_schema(&self, database: &str, schema: &str) {
        self.schemas
            .forget(&(database.to_string(), schema.to_string()));
    }

    /// Release the registry entry of a database that is gone.
    pub fn forget_database(&self, database: &str) {
        self.databases.forget(&database.to_string());
    }

    /// Number of registered database and schema locks.
    pub fn len(&self) -> usize {
        self.databases.len() + self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
