//! Context manager
//!
//! Owns the local catalog snapshot. Readers take an `Arc<MetaData>` and keep
//! a consistent view for as long as they hold it; writers clone the current
//! snapshot, change the copy and swap it in. The exclusive section covers only
//! the clone and the swap, never a repository call.

use crate::config::ModeConfig;
use crate::error::Result;
use crate::metadata::{MetaData, Schema, Table, View};
use crate::persist::MetaDataPersistService;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Local catalog plus the service used to reach the shared store.
pub struct ContextManager {
    metadata: RwLock<Arc<MetaData>>,
    persist_service: MetaDataPersistService,
    config: ModeConfig,
}

impl ContextManager {
    /// Create a context manager with an empty catalog
    pub fn new(persist_service: MetaDataPersistService, config: ModeConfig) -> Self {
        Self {
            metadata: RwLock::new(Arc::new(MetaData::new())),
            persist_service,
            config,
        }
    }

    /// Create a context manager whose catalog is read from the store
    pub fn load(persist_service: MetaDataPersistService, config: ModeConfig) -> Result<Self> {
        let mut metadata = MetaData::new();
        for name in persist_service.load_database_names()? {
            let database =
                persist_service.load_database(&name, config.database_type, config.name_case)?;
            metadata.put_database(database);
        }
        info!(databases = metadata.database_names().len(), "loaded metadata from repository");
        Ok(Self {
            metadata: RwLock::new(Arc::new(metadata)),
            persist_service,
            config,
        })
    }

    /// Current snapshot of the catalog
    pub fn metadata(&self) -> Arc<MetaData> {
        self.metadata.read().clone()
    }

    /// Schema from the current snapshot
    pub fn get_schema(&self, database: &str, schema: &str) -> Option<Arc<Schema>> {
        self.metadata()
            .get_database(database)
            .and_then(|db| db.get_schema(schema))
            .cloned()
    }

    pub fn persist_service(&self) -> &MetaDataPersistService {
        &self.persist_service
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    /// Add an empty database unless it already exists
    pub fn add_database(&self, database: &str) -> bool {
        let (database_type, name_case) = (self.config.database_type, self.config.name_case);
        self.update(|metadata| metadata.add_database(database, database_type, name_case))
    }

    pub fn drop_database(&self, database: &str) -> bool {
        self.update(|metadata| metadata.drop_database(database).is_some())
    }

    /// Add an empty schema unless it already exists. False if the database is
    /// unknown.
    pub fn add_schema(&self, database: &str, schema: &str) -> bool {
        self.update(|metadata| {
            metadata
                .database_mut(database)
                .map(|db| {
                    db.add_schema(schema);
                })
                .is_some()
        })
    }

    pub fn drop_schema(&self, database: &str, schema: &str) -> bool {
        self.update(|metadata| {
            metadata
                .database_mut(database)
                .map(|db| db.remove_schema(schema).is_some())
                .unwrap_or(false)
        })
    }

    /// Move the contents of `schema` to `renamed_to`, replacing whatever is
    /// there, and remove `schema`. False if `schema` is unknown.
    pub fn rename_schema(&self, database: &str, schema: &str, renamed_to: &str) -> bool {
        self.update(|metadata| {
            let Some(db) = metadata.database_mut(database) else {
                return false;
            };
            let Some(old) = db.remove_schema(schema) else {
                return false;
            };
            db.put_schema(old.renamed(renamed_to));
            true
        })
    }

    /// Add or replace tables
    pub fn put_tables(&self, database: &str, schema: &str, tables: &[Table]) -> bool {
        self.update_schema(database, schema, |s| {
            for table in tables {
                s.put_table(table.clone());
            }
        })
    }

    /// Remove tables stored under exactly these names
    pub fn remove_tables(&self, database: &str, schema: &str, tables: &[String]) -> bool {
        self.update_schema(database, schema, |s| {
            for table in tables {
                s.remove_table(table);
            }
        })
    }

    /// Add or replace views
    pub fn put_views(&self, database: &str, schema: &str, views: &[View]) -> bool {
        self.update_schema(database, schema, |s| {
            for view in views {
                s.put_view(view.clone());
            }
        })
    }

    /// Remove views stored under exactly these names
    pub fn remove_views(&self, database: &str, schema: &str, views: &[String]) -> bool {
        self.update_schema(database, schema, |s| {
            for view in views {
                s.remove_view(view);
            }
        })
    }

    fn update_schema(
        &self,
        database: &str,
        schema: &str,
        mutate: impl FnOnce(&mut Schema),
    ) -> bool {
        self.update(|metadata| {
            match metadata
                .database_mut(database)
                .and_then(|db| db.schema_mut(schema))
            {
                Some(s) => {
                    mutate(s);
                    true
                }
                None => false,
            }
        })
    }

    /// Copy the current snapshot, apply `mutate`, publish the copy.
    ///
    /// The copy is taken from the snapshot current at swap time, so changes
    /// published by others in the meantime are kept.
    fn update<R>(&self, mutate: impl FnOnce(&mut MetaData) -> R) -> R {
        let mut current = self.metadata.write();
        let mut next = MetaData::clone(&current);
        let result = mutate(&mut next);
        *current = Arc::new(next);
        result
    }
}
