//! Canonical key paths for persisted metadata.
//!
//! This module is the single source of truth for the key layout. Peer nodes
//! read the same keys, so the format must not drift.
//!
//! ```text
//! /metadata/{db}
//! └── schemas/
//!     └── {schema}/
//!         ├── tables            (collection node, empty document)
//!         │   └── {table}       (table document)
//!         └── views/
//!             └── {view}        (view document)
//! ```
//!
//! Names are used verbatim as path segments. Callers must not pass names that
//! contain `/`.

/// Root of all metadata keys.
pub const ROOT: &str = "/metadata";

const SCHEMAS: &str = "schemas";
const TABLES: &str = "tables";
const VIEWS: &str = "views";

/// A metadata key, decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaDataNode {
    Database {
        database: String,
    },
    Schemas {
        database: String,
    },
    Schema {
        database: String,
        schema: String,
    },
    Tables {
        database: String,
        schema: String,
    },
    Table {
        database: String,
        schema: String,
        table: String,
    },
    Views {
        database: String,
        schema: String,
    },
    View {
        database: String,
        schema: String,
        view: String,
    },
}

impl MetaDataNode {
    /// `/metadata/{db}`
    pub fn database_path(database: &str) -> String {
        format!("{ROOT}/{database}")
    }

    /// `/metadata/{db}/schemas`
    pub fn schemas_path(database: &str) -> String {
        format!("{ROOT}/{database}/{SCHEMAS}")
    }

    /// `/metadata/{db}/schemas/{schema}`
    pub fn schema_path(database: &str, schema: &str) -> String {
        format!("{ROOT}/{database}/{SCHEMAS}/{schema}")
    }

    /// `/metadata/{db}/schemas/{schema}/tables`
    pub fn tables_path(database: &str, schema: &str) -> String {
        format!("{ROOT}/{database}/{SCHEMAS}/{schema}/{TABLES}")
    }

    /// `/metadata/{db}/schemas/{schema}/tables/{table}`
    pub fn table_path(database: &str, schema: &str, table: &str) -> String {
        format!("{ROOT}/{database}/{SCHEMAS}/{schema}/{TABLES}/{table}")
    }

    /// `/metadata/{db}/schemas/{schema}/views`
    pub fn views_path(database: &str, schema: &str) -> String {
        format!("{ROOT}/{database}/{SCHEMAS}/{schema}/{VIEWS}")
    }

    /// `/metadata/{db}/schemas/{schema}/views/{view}`
    pub fn view_path(database: &str, schema: &str, view: &str) -> String {
        format!("{ROOT}/{database}/{SCHEMAS}/{schema}/{VIEWS}/{view}")
    }

    /// The key this node lives at.
    pub fn path(&self) -> String {
        match self {
            Self::Database { database } => Self::database_path(database),
            Self::Schemas { database } => Self::schemas_path(database),
            Self::Schema { database, schema } => Self::schema_path(database, schema),
            Self::Tables { database, schema } => Self::tables_path(database, schema),
            Self::Table {
                database,
                schema,
                table,
            } => Self::table_path(database, schema, table),
            Self::Views { database, schema } => Self::views_path(database, schema),
            Self::View {
                database,
                schema,
                view,
            } => Self::view_path(database, schema, view),
        }
    }

    /// Decode a key produced by [`MetaDataNode::path`]. Any other key is `None`.
    pub fn parse(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(ROOT)?.strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        let node = match segments.as_slice() {
            [db] => Self::Database { database: db.to_string() },
            [db, SCHEMAS] => Self::Schemas { database: db.to_string() },
            [db, SCHEMAS, schema] => Self::Schema {
                database: db.to_string(),
                schema: schema.to_string(),
            },
            [db, SCHEMAS, schema, TABLES] => Self::Tables {
                database: db.to_string(),
                schema: schema.to_string(),
            },
            [db, SCHEMAS, schema, TABLES, table] => Self::Table {
                database: db.to_string(),
                schema: schema.to_string(),
                table: table.to_string(),
            },
            [db, SCHEMAS, schema, VIEWS] => Self::Views {
                database: db.to_string(),
                schema: schema.to_string(),
            },
            [db, SCHEMAS, schema, VIEWS, view] => Self::View {
                database: db.to_string(),
                schema: schema.to_string(),
                view: view.to_string(),
            },
            _ => return None,
        };
        Some(node)
    }

    /// Database the node belongs to.
    pub fn database(&self) -> &str {
        match self {
            Self::Database { database }
            | Self::Schemas { database }
            | Self::Schema { database, .. }
            | Self::Tables { database, .. }
            | Self::Table { database, .. }
            | Self::Views { database, .. }
            | Self::View { database, .. } => database,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(MetaDataNode::database_path("foo_db"), "/metadata/foo_db");
        assert_eq!(
            MetaDataNode::tables_path("foo_db", "foo_schema"),
            "/metadata/foo_db/schemas/foo_schema/tables"
        );
        assert_eq!(
            MetaDataNode::table_path("foo_db", "foo_schema", "foo_table"),
            "/metadata/foo_db/schemas/foo_schema/tables/foo_table"
        );
        assert_eq!(
            MetaDataNode::view_path("foo_db", "foo_schema", "foo_view"),
            "/metadata/foo_db/schemas/foo_schema/views/foo_view"
        );
        assert_eq!(
            MetaDataNode::schema_path("foo_db", "foo_schema"),
            "/metadata/foo_db/schemas/foo_schema"
        );
    }

    #[test]
    fn test_names_are_verbatim() {
        assert_eq!(
            MetaDataNode::table_path("Foo_DB", "Foo Schema", "T_ORDER"),
            "/metadata/Foo_DB/schemas/Foo Schema/tables/T_ORDER"
        );
    }

    #[test]
    fn test_parse_inverts_path() {
        let nodes = [
            MetaDataNode::Database {
                database: "db".into(),
            },
            MetaDataNode::Schemas {
                database: "db".into(),
            },
            MetaDataNode::Schema {
                database: "db".into(),
                schema: "s".into(),
            },
            MetaDataNode::Tables {
                database: "db".into(),
                schema: "s".into(),
            },
            MetaDataNode::Table {
                database: "db".into(),
                schema: "s".into(),
                table: "t".into(),
            },
            MetaDataNode::Views {
                database: "db".into(),
                schema: "s".into(),
            },
            MetaDataNode::View {
                database: "db".into(),
                schema: "s".into(),
                view: "v".into(),
            },
        ];
        for node in nodes {
            assert_eq!(MetaDataNode::parse(&node.path()), Some(node.clone()));
            assert_eq!(node.database(), "db");
        }
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert_eq!(MetaDataNode::parse("/metadata"), None);
        assert_eq!(MetaDataNode::parse("/metadata/"), None);
        assert_eq!(MetaDataNode::parse("/rules/foo"), None);
        assert_eq!(MetaDataNode::parse("/metadata/db/rules"), None);
        assert_eq!(MetaDataNode::parse("/metadata/db/schemas/s/tables/t/x"), None);
        assert_eq!(MetaDataNode::parse("/metadata//schemas"), None);
    }
}
