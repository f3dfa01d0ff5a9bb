#![allow(dead_code)]

use clustermeta::mode::{ClusterModeContextManager, ContextManager};
use clustermeta::persist::{
    ChangeListener, MemoryPersistRepository, MetaDataPersistService, PersistRepository,
};
use clustermeta::{Error, ModeConfig, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// One repository call, as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Children(String),
    Persist(String, String),
    Delete(String),
}

/// Memory repository that records every call and can be told to fail.
pub struct RecordingRepository {
    inner: MemoryPersistRepository,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::wrap(MemoryPersistRepository::new())
    }

    pub fn wrap(inner: MemoryPersistRepository) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Persist and delete calls only, in order
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Persist(..) | Call::Delete(_)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Make `operation` ("get", "list", "persist", "delete") on `key` fail
    pub fn fail_on(&self, operation: &'static str, key: &str) {
        self.failures.lock().push((operation, key.to_string()));
    }

    pub fn heal(&self) {
        self.failures.lock().clear();
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.inner.get(key).ok().flatten()
    }

    fn check(&self, operation: &'static str, key: &str) -> Result<()> {
        let failing = self
            .failures
            .lock()
            .iter()
            .any(|(op, k)| *op == operation && k == key);
        if failing {
            Err(Error::repository(operation, key, "injected failure"))
        } else {
            Ok(())
        }
    }
}

impl PersistRepository for RecordingRepository {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.calls.lock().push(Call::Get(key.to_string()));
        self.check("get", key)?;
        self.inner.get(key)
    }

    fn get_children_keys(&self, key: &str) -> Result<Vec<String>> {
        self.calls.lock().push(Call::Children(key.to_string()));
        self.check("list", key)?;
        self.inner.get_children_keys(key)
    }

    fn persist(&self, key: &str, value: &str) -> Result<()> {
        self.calls
            .lock()
            .push(Call::Persist(key.to_string(), value.to_string()));
        self.check("persist", key)?;
        self.inner.persist(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.calls.lock().push(Call::Delete(key.to_string()));
        self.check("delete", key)?;
        self.inner.delete(key)
    }

    fn watch(&self, key: &str, listener: ChangeListener) -> Result<()> {
        self.inner.watch(key, listener)
    }

    fn supports_cascade_delete(&self) -> bool {
        self.inner.supports_cascade_delete()
    }
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn context_manager(
    repository: Arc<dyn PersistRepository>,
    config: ModeConfig,
) -> Arc<ContextManager> {
    let service = MetaDataPersistService::new(repository, config.timeout());
    Arc::new(ContextManager::new(service, config))
}

/// Cluster manager over a fresh recording repository
pub fn cluster() -> (Arc<RecordingRepository>, ClusterModeContextManager) {
    cluster_with(ModeConfig::new())
}

pub fn cluster_with(config: ModeConfig) -> (Arc<RecordingRepository>, ClusterModeContextManager) {
    init_logging();
    let repository = Arc::new(RecordingRepository::new());
    let context = context_manager(repository.clone(), config);
    (repository, ClusterModeContextManager::new(context))
}

pub fn persist(key: &str, value: &str) -> Call {
    Call::Persist(key.to_string(), value.to_string())
}

pub fn delete(key: &str) -> Call {
    Call::Delete(key.to_string())
}
