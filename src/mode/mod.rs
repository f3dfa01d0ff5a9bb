//! Mode module
//!
//! This module contains the context managers: the local catalog snapshot, the
//! cluster mode orchestration of catalog mutations, and the watcher that
//! refreshes the snapshot from peers' writes.

pub mod cluster;
pub mod context;
pub mod lock;
pub mod watch;

pub use cluster::{AlterSchemaIntent, AlterSchemaMetaDataIntent, ClusterModeContextManager};
pub use context::ContextManager;
pub use lock::SchemaLocks;
pub use watch::MetaDataWatcher;
