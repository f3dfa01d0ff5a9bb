//! Cluster mode context manager
//!
//! Applies catalog mutations to the local snapshot and to the shared store.
//! Store writes happen first and the snapshot is swapped afterwards. None of
//! the multi-key operations are atomic; they are ordered so that a partial
//! failure leaves an entity visible twice rather than not at all:
//!
//! - rename writes the new schema before deleting the old one;
//! - metadata alteration writes added/altered entities before deleting
//!   dropped ones, tables and views independently.
//!
//! Store failures are returned unchanged. Nothing is retried or rolled back.

use super::context::ContextManager;
use super::lock::{DatabaseSharedGuard, SchemaGuard, SchemaLocks};
use crate::error::{Error, Result};
use crate::metadata::{Schema, Table, View};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rename of a schema inside a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterSchemaIntent {
    pub database: String,
    /// Storage unit the DDL was routed to, if any. Recorded for tracing only.
    pub logic_data_source: Option<String>,
    pub schema: String,
    pub renamed_to: String,
}

impl AlterSchemaIntent {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        renamed_to: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            logic_data_source: None,
            schema: schema.into(),
            renamed_to: renamed_to.into(),
        }
    }

    pub fn logic_data_source(mut self, name: impl Into<String>) -> Self {
        self.logic_data_source = Some(name.into());
        self
    }
}

/// Incremental change of the tables and views of one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterSchemaMetaDataIntent {
    pub database: String,
    pub schema: String,
    /// Storage unit the DDL was routed to, if any. Recorded for tracing only.
    pub logic_data_source: Option<String>,
    pub added_tables: Vec<Table>,
    pub altered_tables: Vec<Table>,
    pub dropped_tables: Vec<String>,
    pub added_views: Vec<View>,
    pub altered_views: Vec<View>,
    pub dropped_views: Vec<String>,
}

impl AlterSchemaMetaDataIntent {
    pub fn new(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            ..Self::default()
        }
    }

    pub fn logic_data_source(mut self, name: impl Into<String>) -> Self {
        self.logic_data_source = Some(name.into());
        self
    }

    pub fn add_table(mut self, table: Table) -> Self {
        self.added_tables.push(table);
        self
    }

    pub fn alter_table(mut self, table: Table) -> Self {
        self.altered_tables.push(table);
        self
    }

    pub fn drop_table(mut self, name: impl Into<String>) -> Self {
        self.dropped_tables.push(name.into());
        self
    }

    pub fn add_view(mut self, view: View) -> Self {
        self.added_views.push(view);
        self
    }

    pub fn alter_view(mut self, view: View) -> Self {
        self.altered_views.push(view);
        self
    }

    pub fn drop_view(mut self, name: impl Into<String>) -> Self {
        self.dropped_views.push(name.into());
        self
    }
}

/// Entry point for catalog mutations in cluster mode.
///
/// Database creation and removal exclude every schema mutation of that
/// database; schema mutations re-check the database once they hold its
/// shared lock, so a schema is never written below a dropped database.
pub struct ClusterModeContextManager {
    context: Arc<ContextManager>,
    locks: SchemaLocks,
}

impl ClusterModeContextManager {
    pub fn new(context: Arc<ContextManager>) -> Self {
        Self {
            context,
            locks: SchemaLocks::new(),
        }
    }

    pub fn context(&self) -> &Arc<ContextManager> {
        &self.context
    }

    /// Persist the database node and add an empty database.
    /// An existing database keeps its schemas.
    pub fn create_database(&self, database: &str) -> Result<()> {
        info!(database, "create database");
        let _guard = self.locks.lock_database(database);
        self.context.persist_service().persist_database(database)?;
        self.context.add_database(database);
        Ok(())
    }

    /// Delete the database subtree and forget the database.
    /// Unknown databases are deleted anyway; the delete is idempotent.
    pub fn drop_database(&self, database: &str) -> Result<()> {
        info!(database, "drop database");
        {
            let _guard = self.locks.lock_database(database);
            self.context.persist_service().delete_database(database)?;
            self.context.drop_database(database);
        }
        self.locks.forget_database(database);
        Ok(())
    }

    /// Persist the schema's tables-collection node and add an empty schema.
    /// An existing schema keeps its tables and views, and its stored name.
    pub fn create_schema(&self, database: &str, schema: &str) -> Result<()> {
        info!(database, schema, "create schema");
        let _database = self.share_database(database)?;
        let _guard = self.lock(database, schema);
        let name = self.stored_schema_name(database, schema);
        self.context.persist_service().persist_schema(database, &name)?;
        let added = self.context.add_schema(database, &name);
        self.applied(added, database, &name)
    }

    /// Delete each schema root and forget each schema, in the given order.
    /// Stops at the first store failure; schemas before it stay dropped.
    pub fn drop_schema(&self, database: &str, schemas: &[String]) -> Result<()> {
        info!(database, ?schemas, "drop schema");
        {
            let _database = self.locks.share_database(database);
            for schema in schemas {
                {
                    let _guard = self.lock(database, schema);
                    let name = self.stored_schema_name(database, schema);
                    self.context.persist_service().delete_schema(database, &name)?;
                    self.context.drop_schema(database, schema);
                }
                self.forget_schema(database, schema);
            }
        }
        self.locks.forget_database(database);
        Ok(())
    }

    /// Rename a schema: write it under the new name with all its tables and
    /// views, swap the snapshot, then delete the old schema root.
    ///
    /// If the final delete fails the rename is visible everywhere but the old
    /// node lingers; [`Error::RenameIncomplete`] is returned and
    /// [`complete_schema_rename`](Self::complete_schema_rename) finishes it.
    pub fn alter_schema(&self, intent: &AlterSchemaIntent) -> Result<()> {
        let database = intent.database.as_str();
        info!(
            database,
            schema = %intent.schema,
            renamed_to = %intent.renamed_to,
            logic_data_source = ?intent.logic_data_source,
            "alter schema"
        );
        let _database = self.share_database(database)?;
        let name_case = self.context.config().name_case;
        if name_case.key(&intent.schema) == name_case.key(&intent.renamed_to) {
            debug!(database, schema = %intent.schema, "rename to the same schema, nothing to do");
            return Ok(());
        }
        let guards = self.lock_all(
            database,
            &[intent.schema.as_str(), intent.renamed_to.as_str()],
        );

        let old = self.require_schema(database, &intent.schema)?;
        if self.context.get_schema(database, &intent.renamed_to).is_some() {
            return Err(Error::SchemaAlreadyExists {
                database: database.to_string(),
                schema: intent.renamed_to.clone(),
            });
        }

        let renamed: Schema = old.renamed(intent.renamed_to.as_str());
        let service = self.context.persist_service();
        service.persist_schema_with_contents(database, &renamed)?;
        let swapped = self
            .context
            .rename_schema(database, &intent.schema, &intent.renamed_to);
        self.applied(swapped, database, &intent.schema)?;

        service.delete_schema(database, old.name()).map_err(|source| {
            warn!(
                database,
                schema = old.name(),
                error = %source,
                "old schema node left behind after rename"
            );
            Error::RenameIncomplete {
                database: database.to_string(),
                schema: old.name().to_string(),
                renamed_to: intent.renamed_to.clone(),
                source: Box::new(source),
            }
        })?;
        drop(guards);
        self.forget_schema(database, &intent.schema);
        Ok(())
    }

    /// Finish a rename that returned [`Error::RenameIncomplete`]: delete the
    /// old schema root. Safe to call more than once.
    pub fn complete_schema_rename(&self, database: &str, schema: &str) -> Result<()> {
        info!(database, schema, "complete schema rename");
        {
            let _database = self.locks.share_database(database);
            let _guard = self.lock(database, schema);
            self.context.persist_service().delete_schema(database, schema)?;
            self.context.drop_schema(database, schema);
        }
        self.forget_schema(database, schema);
        self.locks.forget_database(database);
        Ok(())
    }

    /// Apply added, altered and dropped tables and views of one schema.
    ///
    /// Dropping an entity the schema does not have is skipped without a
    /// store call.
    pub fn alter_schema_metadata(&self, intent: &AlterSchemaMetaDataIntent) -> Result<()> {
        let database = intent.database.as_str();
        info!(
            database,
            schema = %intent.schema,
            logic_data_source = ?intent.logic_data_source,
            added_tables = intent.added_tables.len(),
            altered_tables = intent.altered_tables.len(),
            dropped_tables = intent.dropped_tables.len(),
            added_views = intent.added_views.len(),
            altered_views = intent.altered_views.len(),
            dropped_views = intent.dropped_views.len(),
            "alter schema metadata"
        );
        let _database = self.share_database(database)?;
        let _guard = self.lock(database, &intent.schema);
        let schema = self.require_schema(database, &intent.schema)?;
        let schema_name = schema.name().to_string();

        self.alter_tables(database, &schema_name, intent)?;
        self.alter_views(database, &schema_name, intent)?;
        Ok(())
    }

    /// Upserts first, then deletes of dropped tables and of keys left behind
    /// by an upsert that replaced a differently spelled table.
    fn alter_tables(
        &self,
        database: &str,
        schema: &str,
        intent: &AlterSchemaMetaDataIntent,
    ) -> Result<()> {
        let service = self.context.persist_service();
        let upserts: Vec<Table> = intent
            .added_tables
            .iter()
            .chain(&intent.altered_tables)
            .cloned()
            .collect();
        let before = self.require_schema(database, schema)?;
        let superseded: Vec<String> = upserts
            .iter()
            .filter_map(|table| {
                before
                    .get_table(table.name())
                    .map(|old| old.name().to_string())
                    .filter(|old| old != table.name())
            })
            .collect();
        for table in &upserts {
            service.persist_table(database, schema, table)?;
        }
        if !upserts.is_empty() {
            let put = self.context.put_tables(database, schema, &upserts);
            self.applied(put, database, schema)?;
        }
        for name in &superseded {
            debug!(database, schema, table = %name, "delete key of renamed-case table");
            service.delete_table(database, schema, name)?;
        }

        let current = self.require_schema(database, schema)?;
        let dropped: Vec<String> = intent
            .dropped_tables
            .iter()
            .filter_map(|name| current.get_table(name).map(|t| t.name().to_string()))
            .collect();
        for name in &intent.dropped_tables {
            if !current.contains_table(name) {
                debug!(database, schema, table = %name, "drop of unknown table skipped");
            }
        }
        for name in &dropped {
            service.delete_table(database, schema, name)?;
        }
        if !dropped.is_empty() {
            let removed = self.context.remove_tables(database, schema, &dropped);
            self.applied(removed, database, schema)?;
        }
        Ok(())
    }

    fn alter_views(
        &self,
        database: &str,
        schema: &str,
        intent: &AlterSchemaMetaDataIntent,
    ) -> Result<()> {
        let service = self.context.persist_service();
        let upserts: Vec<View> = intent
            .added_views
            .iter()
            .chain(&intent.altered_views)
            .cloned()
            .collect();
        let before = self.require_schema(database, schema)?;
        let superseded: Vec<String> = upserts
            .iter()
            .filter_map(|view| {
                before
                    .get_view(&view.name)
                    .map(|old| old.name.clone())
                    .filter(|old| *old != view.name)
            })
            .collect();
        for view in &upserts {
            service.persist_view(database, schema, view)?;
        }
        if !upserts.is_empty() {
            let put = self.context.put_views(database, schema, &upserts);
            self.applied(put, database, schema)?;
        }
        for name in &superseded {
            debug!(database, schema, view = %name, "delete key of renamed-case view");
            service.delete_view(database, schema, name)?;
        }

        let current = self.require_schema(database, schema)?;
        let dropped: Vec<String> = intent
            .dropped_views
            .iter()
            .filter_map(|name| current.get_view(name).map(|v| v.name.clone()))
            .collect();
        for name in &intent.dropped_views {
            if !current.contains_view(name) {
                debug!(database, schema, view = %name, "drop of unknown view skipped");
            }
        }
        for name in &dropped {
            service.delete_view(database, schema, name)?;
        }
        if !dropped.is_empty() {
            let removed = self.context.remove_views(database, schema, &dropped);
            self.applied(removed, database, schema)?;
        }
        Ok(())
    }

    /// Shared database guard, once the database is known to exist under it.
    fn share_database(&self, database: &str) -> Result<DatabaseSharedGuard> {
        let guard = self.locks.share_database(database);
        if self.context.metadata().contains_database(database) {
            Ok(guard)
        } else {
            drop(guard);
            self.locks.forget_database(database);
            Err(Error::DatabaseNotFound(database.to_string()))
        }
    }

    fn require_schema(&self, database: &str, schema: &str) -> Result<Arc<Schema>> {
        self.context
            .get_schema(database, schema)
            .ok_or_else(|| Error::SchemaNotFound {
                database: database.to_string(),
                schema: schema.to_string(),
            })
    }

    /// Map a context mutation that found no target to the missing level.
    fn applied(&self, applied: bool, database: &str, schema: &str) -> Result<()> {
        if applied {
            Ok(())
        } else if !self.context.metadata().contains_database(database) {
            Err(Error::DatabaseNotFound(database.to_string()))
        } else {
            Err(Error::SchemaNotFound {
                database: database.to_string(),
                schema: schema.to_string(),
            })
        }
    }

    /// Name the schema is stored under, `schema` itself if it is unknown.
    fn stored_schema_name(&self, database: &str, schema: &str) -> String {
        self.context
            .get_schema(database, schema)
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| schema.to_string())
    }

    fn lock(&self, database: &str, schema: &str) -> SchemaGuard {
        self.locks
            .lock(database, &self.context.config().name_case.key(schema))
    }

    fn lock_all(&self, database: &str, schemas: &[&str]) -> Vec<SchemaGuard> {
        let name_case = self.context.config().name_case;
        let keys: Vec<String> = schemas.iter().map(|s| name_case.key(s)).collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.locks.lock_all(database, &keys)
    }

    fn forget_schema(&self, database: &str, schema: &str) {
        self.locks
            .forget_schema(database, &self.context.config().name_case.key(schema));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModeConfig;
    use crate::persist::{MemoryPersistRepository, MetaDataPersistService, PersistRepository};
    use std::time::Duration;

    fn cluster() -> (Arc<MemoryPersistRepository>, ClusterModeContextManager) {
        let repository = Arc::new(MemoryPersistRepository::new());
        let service = MetaDataPersistService::new(repository.clone(), Duration::from_secs(5));
        let context = Arc::new(ContextManager::new(service, ModeConfig::new()));
        (repository, ClusterModeContextManager::new(context))
    }

    #[test]
    fn test_intent_builders() {
        let intent = AlterSchemaMetaDataIntent::new("foo_db", "foo_schema")
            .logic_data_source("ds_0")
            .add_table(Table::new("t1"))
            .alter_table(Table::new("t2"))
            .drop_table("t3")
            .add_view(View::new("v1", ""))
            .drop_view("v2");
        assert_eq!(intent.added_tables.len(), 1);
        assert_eq!(intent.altered_tables.len(), 1);
        assert_eq!(intent.dropped_tables, vec!["t3"]);
        assert_eq!(intent.dropped_views, vec!["v2"]);
        assert_eq!(intent.logic_data_source.as_deref(), Some("ds_0"));
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let (repository, cluster) = cluster();
        cluster.create_database("foo_db").unwrap();
        cluster.create_schema("foo_db", "foo_schema").unwrap();
        let keys = repository.keys();

        cluster
            .alter_schema(&AlterSchemaIntent::new("foo_db", "foo_schema", "foo_schema"))
            .unwrap();
        assert_eq!(repository.keys(), keys);
        assert!(repository
            .is_existed("/metadata/foo_db/schemas/foo_schema/tables")
            .unwrap());
    }

    #[test]
    fn test_rename_onto_existing_schema_is_rejected() {
        let (repository, cluster) = cluster();
        cluster.create_database("foo_db").unwrap();
        cluster.create_schema("foo_db", "foo_schema").unwrap();
        cluster.create_schema("foo_db", "bar_schema").unwrap();
        let keys = repository.keys();

        let result =
            cluster.alter_schema(&AlterSchemaIntent::new("foo_db", "foo_schema", "bar_schema"));
        assert!(matches!(result, Err(Error::SchemaAlreadyExists { .. })));
        assert_eq!(repository.keys(), keys);
    }

    #[test]
    fn test_lock_registry_shrinks_after_drops() {
        let (_repository, cluster) = cluster();
        cluster.create_database("foo_db").unwrap();
        cluster.create_schema("foo_db", "s1").unwrap();
        cluster.create_schema("foo_db", "s2").unwrap();
        cluster
            .alter_schema(&AlterSchemaIntent::new("foo_db", "s2", "s3"))
            .unwrap();
        cluster
            .drop_schema("foo_db", &["s1".to_string(), "ghost".to_string()])
            .unwrap();
        cluster.complete_schema_rename("foo_db", "s2").unwrap();
        assert!(cluster.create_schema("bar_db", "s1").is_err());

        cluster.drop_database("foo_db").unwrap();
        // Only the lock of the renamed schema is still registered.
        assert_eq!(cluster.locks.len(), 1);
        cluster.drop_schema("foo_db", &["s3".to_string()]).unwrap();
        assert!(cluster.locks.is_empty());
    }
}
