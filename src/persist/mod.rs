//! Persist module
//!
//! This module maps the catalog onto the shared coordination store:
//! - Key layout (`node`)
//! - Repository contract and an in-process implementation
//! - The metadata persist service

pub mod memory;
pub mod node;
pub mod repository;
pub mod service;

pub use memory::MemoryPersistRepository;
pub use node::MetaDataNode;
pub use repository::{ChangeListener, ChangeType, DataChangedEvent, PersistRepository};
pub use service::MetaDataPersistService;
