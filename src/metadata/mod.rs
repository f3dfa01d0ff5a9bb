//! Metadata module
//!
//! This module contains the in-memory catalog: databases, schemas, tables,
//! views and the data types they are described with.

pub mod database;
pub mod schema;
pub mod types;

pub use database::{Database, MetaData, Schema};
pub use schema::{Column, Constraint, Index, Table, View};
pub use types::{DataType, DatabaseType, NameCase};
