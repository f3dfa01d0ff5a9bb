//! Metadata persist service
//!
//! Stateless translation of catalog operations into repository calls. Nothing
//! here is transactional: a multi-key operation that fails midway leaves the
//! keys it already wrote in place.
//!
//! Every repository call runs on its own thread against a deadline. A call
//! that misses it is reported as [`Error::Timeout`] while it keeps running in
//! the background; whatever it eventually changes reaches this node through
//! the watcher like a peer's write.

use super::node::{MetaDataNode, ROOT};
use super::repository::PersistRepository;
use crate::error::{Error, Result};
use crate::metadata::{Database, DatabaseType, NameCase, Schema, Table, View};
use crate::yaml::{self, EMPTY_SCHEMA_DOCUMENT};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Reads and writes catalog entities at their canonical keys.
#[derive(Clone)]
pub struct MetaDataPersistService {
    repository: Arc<dyn PersistRepository>,
    timeout: Duration,
}

impl MetaDataPersistService {
    /// Create a service; every repository call that does not complete within
    /// `timeout` is reported as [`Error::Timeout`].
    pub fn new(repository: Arc<dyn PersistRepository>, timeout: Duration) -> Self {
        Self {
            repository,
            timeout,
        }
    }

    pub fn repository(&self) -> &Arc<dyn PersistRepository> {
        &self.repository
    }

    // ========== Writes ==========

    pub fn persist_database(&self, database: &str) -> Result<()> {
        self.write(
            &MetaDataNode::Database {
                database: database.to_string(),
            },
            "",
        )
    }

    pub fn delete_database(&self, database: &str) -> Result<()> {
        self.remove(&MetaDataNode::Database {
            database: database.to_string(),
        })
    }

    /// Write the schema's tables-collection node.
    ///
    /// Only the collection node itself is (re)written; table documents below
    /// it are left alone.
    pub fn persist_schema(&self, database: &str, schema: &str) -> Result<()> {
        self.write(
            &MetaDataNode::Tables {
                database: database.to_string(),
                schema: schema.to_string(),
            },
            EMPTY_SCHEMA_DOCUMENT,
        )
    }

    /// Write the collection node, then every table and view of `schema`.
    pub fn persist_schema_with_contents(&self, database: &str, schema: &Schema) -> Result<()> {
        self.persist_schema(database, schema.name())?;
        for table in schema.tables() {
            self.persist_table(database, schema.name(), table)?;
        }
        for view in schema.views() {
            self.persist_view(database, schema.name(), view)?;
        }
        Ok(())
    }

    pub fn delete_schema(&self, database: &str, schema: &str) -> Result<()> {
        self.remove(&MetaDataNode::Schema {
            database: database.to_string(),
            schema: schema.to_string(),
        })
    }

    pub fn persist_table(&self, database: &str, schema: &str, table: &Table) -> Result<()> {
        let document = yaml::to_document(table)?;
        self.write(
            &MetaDataNode::Table {
                database: database.to_string(),
                schema: schema.to_string(),
                table: table.name().to_string(),
            },
            &document,
        )
    }

    pub fn delete_table(&self, database: &str, schema: &str, table: &str) -> Result<()> {
        self.remove(&MetaDataNode::Table {
            database: database.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }

    pub fn persist_view(&self, database: &str, schema: &str, view: &View) -> Result<()> {
        let document = yaml::to_document(view)?;
        self.write(
            &MetaDataNode::View {
                database: database.to_string(),
                schema: schema.to_string(),
                view: view.name.clone(),
            },
            &document,
        )
    }

    pub fn delete_view(&self, database: &str, schema: &str, view: &str) -> Result<()> {
        self.remove(&MetaDataNode::View {
            database: database.to_string(),
            schema: schema.to_string(),
            view: view.to_string(),
        })
    }

    // ========== Reads ==========

    pub fn load_database_names(&self) -> Result<Vec<String>> {
        self.children(ROOT)
    }

    pub fn load_schema_names(&self, database: &str) -> Result<Vec<String>> {
        self.children(&MetaDataNode::schemas_path(database))
    }

    /// Table stored at its key; an absent document yields an empty table
    /// carrying `table` as its name.
    pub fn load_table(&self, database: &str, schema: &str, table: &str) -> Result<Table> {
        let key = MetaDataNode::table_path(database, schema, table);
        let document = self.get(&key)?;
        let mut loaded: Table = yaml::from_document(&key, document.as_deref())?;
        if loaded.name().is_empty() {
            loaded.set_name(table);
        }
        Ok(loaded)
    }

    /// View stored at its key; an absent document yields a view with an
    /// empty definition.
    pub fn load_view(&self, database: &str, schema: &str, view: &str) -> Result<View> {
        let key = MetaDataNode::view_path(database, schema, view);
        let document = self.get(&key)?;
        let mut loaded: View = yaml::from_document(&key, document.as_deref())?;
        if loaded.name.is_empty() {
            loaded.name = view.to_string();
        }
        Ok(loaded)
    }

    pub fn load_schema(&self, database: &str, schema: &str, name_case: NameCase) -> Result<Schema> {
        let mut loaded = Schema::new(schema, name_case);

        for table in self.children(&MetaDataNode::tables_path(database, schema))? {
            loaded.put_table(self.load_table(database, schema, &table)?);
        }

        for view in self.children(&MetaDataNode::views_path(database, schema))? {
            loaded.put_view(self.load_view(database, schema, &view)?);
        }
        Ok(loaded)
    }

    pub fn load_database(
        &self,
        database: &str,
        database_type: DatabaseType,
        name_case: NameCase,
    ) -> Result<Database> {
        let mut loaded = Database::new(database, database_type, name_case);
        for schema in self.load_schema_names(database)? {
            loaded.put_schema(self.load_schema(database, &schema, name_case)?);
        }
        Ok(loaded)
    }

    // ========== Internals ==========

    fn write(&self, node: &MetaDataNode, document: &str) -> Result<()> {
        let key = node.path();
        debug!(key = %key, bytes = document.len(), "persist metadata node");
        let (path, value) = (key.clone(), document.to_string());
        self.timed("persist", &key, move |repository| repository.persist(&path, &value))
    }

    fn remove(&self, node: &MetaDataNode) -> Result<()> {
        let key = node.path();
        debug!(key = %key, "delete metadata node");
        self.delete_subtree(&key)
    }

    /// Delete `key` and everything below it, walking the tree when the
    /// repository does not cascade on its own.
    fn delete_subtree(&self, key: &str) -> Result<()> {
        if !self.repository.supports_cascade_delete() {
            for child in self.children(key)? {
                self.delete_subtree(&format!("{}/{}", key, child))?;
            }
        }
        let path = key.to_string();
        self.timed("delete", key, move |repository| repository.delete(&path))
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = key.to_string();
        self.timed("get", key, move |repository| repository.get(&path))
    }

    fn children(&self, key: &str) -> Result<Vec<String>> {
        let path = key.to_string();
        self.timed("list", key, move |repository| repository.get_children_keys(&path))
    }

    /// Run `call` against the repository, waiting at most `timeout` for it.
    fn timed<T, F>(&self, operation: &'static str, key: &str, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PersistRepository) -> Result<T> + Send + 'static,
    {
        let repository = Arc::clone(&self.repository);
        let (sender, receiver) = mpsc::sync_channel(1);
        let started = Instant::now();
        thread::Builder::new()
            .name(format!("persist-{}", operation))
            .spawn(move || {
                // The receiver is gone once the caller has given up.
                let _ = sender.send(call(repository.as_ref()));
            })?;

        match receiver.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                let elapsed = started.elapsed();
                warn!(
                    operation,
                    key,
                    ?elapsed,
                    timeout = ?self.timeout,
                    "repository call did not complete in time"
                );
                Err(Error::Timeout {
                    operation,
                    key: key.to_string(),
                    elapsed,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::Internal(format!(
                "repository {} of '{}' panicked",
                operation, key
            ))),
        }
    }
}
