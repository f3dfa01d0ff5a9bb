//! clustermeta - cluster metadata coordination for a database proxy
//!
//! This library keeps every proxy node's in-memory catalog consistent with a
//! hierarchical key/value store shared by the cluster:
//! - Catalog model (databases, schemas, tables, views)
//! - YAML projection of catalog entities
//! - Key layout and persist service over a pluggable repository
//! - Context manager, cluster mode orchestration and change watching

pub mod config;
pub mod error;
pub mod metadata;
pub mod mode;
pub mod persist;
pub mod yaml;

pub use config::ModeConfig;
pub use error::{Error, Result};
