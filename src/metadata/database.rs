//! Catalog tree for clustermeta
//!
//! `MetaData` → `Database` → `Schema` → {`Table`, `View`}. Databases and
//! schemas sit behind `Arc` so that cloning a `MetaData` snapshot is shallow
//! and a mutation only copies the path it touches.

use super::schema::{Table, View};
use super::types::{DatabaseType, NameCase};
use std::collections::HashMap;
use std::sync::Arc;

/// A named set of tables and views inside a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    name_case: NameCase,
    tables: HashMap<String, Table>,
    views: HashMap<String, View>,
}

impl Schema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>, name_case: NameCase) -> Self {
        Self {
            name: name.into(),
            name_case,
            tables: HashMap::new(),
            views: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same contents under another name (used by rename).
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Add or replace a table
    pub fn put_table(&mut self, table: Table) {
        self.tables.insert(self.name_case.key(table.name()), table);
    }

    /// Remove a table only if it is stored under exactly `name`. Under
    /// case-insensitive naming another spelling may have replaced it.
    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        let key = self.name_case.key(name);
        if self.tables.get(&key)?.name() != name {
            return None;
        }
        self.tables.remove(&key)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&self.name_case.key(name))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(&self.name_case.key(name))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Table names, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.values().map(|t| t.name().to_string()).collect();
        names.sort();
        names
    }

    /// Add or replace a view
    pub fn put_view(&mut self, view: View) {
        self.views.insert(self.name_case.key(&view.name), view);
    }

    /// Remove a view only if it is stored under exactly `name`
    pub fn remove_view(&mut self, name: &str) -> Option<View> {
        let key = self.name_case.key(name);
        if self.views.get(&key)?.name != name {
            return None;
        }
        self.views.remove(&key)
    }

    pub fn get_view(&self, name: &str) -> Option<&View> {
        self.views.get(&self.name_case.key(name))
    }

    pub fn contains_view(&self, name: &str) -> bool {
        self.views.contains_key(&self.name_case.key(name))
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    /// View names, sorted
    pub fn view_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.views.values().map(|v| v.name.clone()).collect();
        names.sort();
        names
    }

    /// True when the schema has neither tables nor views
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }
}

/// A logical database: a dialect tag plus its schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    name: String,
    database_type: DatabaseType,
    name_case: NameCase,
    schemas: HashMap<String, Arc<Schema>>,
}

impl Database {
    /// Create a database with no schemas
    pub fn new(name: impl Into<String>, database_type: DatabaseType, name_case: NameCase) -> Self {
        Self {
            name: name.into(),
            database_type,
            name_case,
            schemas: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    pub fn name_case(&self) -> NameCase {
        self.name_case
    }

    pub fn get_schema(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(&self.name_case.key(name))
    }

    pub fn contains_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(&self.name_case.key(name))
    }

    /// Mutable access to a schema, copying it first if a snapshot still shares it
    pub fn schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas
            .get_mut(&self.name_case.key(name))
            .map(Arc::make_mut)
    }

    /// Add an empty schema unless one with this name already exists.
    /// Returns true when a schema was added.
    pub fn add_schema(&mut self, name: &str) -> bool {
        let key = self.name_case.key(name);
        if self.schemas.contains_key(&key) {
            return false;
        }
        self.schemas
            .insert(key, Arc::new(Schema::new(name, self.name_case)));
        true
    }

    /// Add or replace a schema
    pub fn put_schema(&mut self, schema: Schema) {
        self.schemas
            .insert(self.name_case.key(schema.name()), Arc::new(schema));
    }

    pub fn remove_schema(&mut self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.remove(&self.name_case.key(name))
    }

    /// Schema names, sorted
    pub fn schema_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.values().map(|s| s.name().to_string()).collect();
        names.sort();
        names
    }
}

/// The whole catalog of one proxy process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaData {
    databases: HashMap<String, Arc<Database>>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_database(&self, name: &str) -> Option<&Arc<Database>> {
        self.databases.get(name)
    }

    pub fn contains_database(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }

    /// Mutable access to a database, copying it first if a snapshot still shares it
    pub fn database_mut(&mut self, name: &str) -> Option<&mut Database> {
        self.databases.get_mut(name).map(Arc::make_mut)
    }

    /// Add an empty database unless it already exists.
    /// Returns true when a database was added.
    pub fn add_database(
        &mut self,
        name: &str,
        database_type: DatabaseType,
        name_case: NameCase,
    ) -> bool {
        if self.databases.contains_key(name) {
            return false;
        }
        self.databases.insert(
            name.to_string(),
            Arc::new(Database::new(name, database_type, name_case)),
        );
        true
    }

    /// Add or replace a database
    pub fn put_database(&mut self, database: Database) {
        self.databases
            .insert(database.name().to_string(), Arc::new(database));
    }

    pub fn drop_database(&mut self, name: &str) -> Option<Arc<Database>> {
        self.databases.remove(name)
    }

    /// Database names, sorted
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::schema::Column;
    use crate::metadata::types::DataType;

    #[test]
    fn test_schema_tables_and_views() {
        let mut schema = Schema::new("foo_schema", NameCase::Sensitive);
        assert!(schema.is_empty());

        schema.put_table(Table::new("t_order").with_column(Column::new("id", DataType::Integer)));
        schema.put_view(View::new("v_order", "select id from t_order"));
        assert!(schema.contains_table("t_order"));
        assert!(!schema.contains_table("T_ORDER"));
        assert_eq!(schema.view_names(), vec!["v_order"]);

        assert!(schema.remove_table("t_order").is_some());
        assert!(schema.remove_table("t_order").is_none());
        assert!(!schema.is_empty());
    }

    #[test]
    fn test_case_insensitive_lookup_keeps_name() {
        let mut db = Database::new("foo_db", DatabaseType::PostgreSQL, NameCase::Insensitive);
        assert!(db.add_schema("Foo_Schema"));
        assert!(!db.add_schema("FOO_SCHEMA"));

        let schema = db.schema_mut("foo_schema").unwrap();
        schema.put_table(Table::new("T_Order"));
        assert!(schema.contains_table("t_order"));
        assert_eq!(schema.table_names(), vec!["T_Order"]);
        assert_eq!(db.schema_names(), vec!["Foo_Schema"]);

        let schema = db.schema_mut("foo_schema").unwrap();
        assert!(schema.remove_table("t_order").is_none());
        assert!(schema.remove_table("T_Order").is_some());
    }

    #[test]
    fn test_snapshot_clone_is_isolated() {
        let mut metadata = MetaData::new();
        metadata.add_database("foo_db", DatabaseType::MySQL, NameCase::Sensitive);
        metadata.database_mut("foo_db").unwrap().add_schema("foo_schema");

        let before = metadata.clone();
        metadata
            .database_mut("foo_db")
            .unwrap()
            .schema_mut("foo_schema")
            .unwrap()
            .put_table(Table::new("t_order"));

        let old_schema = before.get_database("foo_db").unwrap().get_schema("foo_schema").unwrap();
        assert!(old_schema.is_empty());
        let new_schema = metadata.get_database("foo_db").unwrap().get_schema("foo_schema").unwrap();
        assert!(new_schema.contains_table("t_order"));
    }

    #[test]
    fn test_renamed_schema_keeps_contents() {
        let mut schema = Schema::new("foo_schema", NameCase::Sensitive);
        schema.put_table(Table::new("t_order"));
        let renamed = schema.renamed("bar_schema");
        assert_eq!(renamed.name(), "bar_schema");
        assert_eq!(renamed.table_names(), vec!["t_order"]);
    }
}
