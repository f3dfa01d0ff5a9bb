//! Table document model.

use super::YamlProjection;
use crate::metadata::{Column, Constraint, DataType, Index, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Persisted form of a table.
///
/// Each collection is `None` when the table has no entries of that kind, and
/// is then left out of the document entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlTable {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<IndexMap<String, YamlColumn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes: Option<IndexMap<String, YamlIndex>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<IndexMap<String, YamlConstraint>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlColumn {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub generated: bool,
    #[serde(default = "enabled")]
    pub case_sensitive: bool,
    #[serde(default = "enabled")]
    pub visible: bool,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default = "enabled")]
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlIndex {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlConstraint {
    pub name: String,
    pub referenced_table_name: String,
}

fn enabled() -> bool {
    true
}

/// `None` for an empty collection so it is omitted from the document.
fn non_empty<T>(map: IndexMap<String, T>) -> Option<IndexMap<String, T>> {
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

impl From<&Column> for YamlColumn {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            primary_key: column.primary_key,
            generated: column.generated,
            case_sensitive: column.case_sensitive,
            visible: column.visible,
            unsigned: column.unsigned,
            nullable: column.nullable,
        }
    }
}

impl From<YamlColumn> for Column {
    fn from(column: YamlColumn) -> Self {
        Column::new(column.name, column.data_type)
            .primary_key(column.primary_key)
            .generated(column.generated)
            .case_sensitive(column.case_sensitive)
            .visible(column.visible)
            .unsigned(column.unsigned)
            .nullable(column.nullable)
    }
}

impl YamlProjection for Table {
    type Document = YamlTable;

    fn to_yaml(&self) -> YamlTable {
        YamlTable {
            name: self.name().to_string(),
            columns: non_empty(
                self.columns()
                    .map(|c| (c.name.clone(), YamlColumn::from(c)))
                    .collect(),
            ),
            indexes: non_empty(
                self.indexes()
                    .map(|i| {
                        let index = YamlIndex {
                            name: i.name.clone(),
                            columns: i.columns.clone(),
                            unique: i.unique,
                        };
                        (i.name.clone(), index)
                    })
                    .collect(),
            ),
            constraints: non_empty(
                self.constraints()
                    .map(|c| {
                        let constraint = YamlConstraint {
                            name: c.name.clone(),
                            referenced_table_name: c.referenced_table_name.clone(),
                        };
                        (c.name.clone(), constraint)
                    })
                    .collect(),
            ),
        }
    }

    fn from_yaml(document: YamlTable) -> Table {
        let mut table = Table::new(document.name);
        for (_, column) in document.columns.unwrap_or_default() {
            table.add_column(column.into());
        }
        for (_, index) in document.indexes.unwrap_or_default() {
            table.add_index(Index::new(index.name, index.columns).unique(index.unique));
        }
        for (_, constraint) in document.constraints.unwrap_or_default() {
            table.add_constraint(Constraint::new(
                constraint.name,
                constraint.referenced_table_name,
            ));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::{from_document, to_document};

    fn full_table() -> Table {
        Table::new("t_order")
            .with_column(
                Column::new("order_id", DataType::BigInt)
                    .primary_key(true)
                    .generated(true),
            )
            .with_column(Column::new("user_id", DataType::Integer).unsigned(true))
            .with_column(Column::new("status", DataType::Varchar(50)).case_sensitive(false))
            .with_index(Index::new("idx_user", vec!["user_id".to_string()]).unique(true))
            .with_constraint(Constraint::new("fk_user", "t_user"))
    }

    #[test]
    fn test_bare_table_is_name_only() {
        let document = to_document(&Table::new("foo_table")).unwrap();
        assert_eq!(document, "name: foo_table\n");
    }

    #[test]
    fn test_field_order() {
        let document = to_document(&full_table()).unwrap();
        let name = document.find("name: t_order").unwrap();
        let columns = document.find("columns:").unwrap();
        let indexes = document.find("indexes:").unwrap();
        let constraints = document.find("constraints:").unwrap();
        assert!(name < columns && columns < indexes && indexes < constraints);
        assert!(document.find("order_id").unwrap() < document.find("user_id").unwrap());
    }

    #[test]
    fn test_round_trip_with_partial_collections() {
        let tables = [
            Table::new("empty"),
            full_table(),
            Table::new("only_columns").with_column(Column::new("id", DataType::Integer)),
            Table::new("only_indexes").with_index(Index::new("idx", vec![])),
            Table::new("only_constraints").with_constraint(Constraint::new("fk", "other")),
        ];
        for table in tables {
            let document = to_document(&table).unwrap();
            let parsed: Table = from_document("/k", Some(&document)).unwrap();
            assert_eq!(parsed, table, "document:\n{}", document);
        }
    }

    #[test]
    fn test_partial_document_reads_missing_collections_as_empty() {
        let text = "name: t_user\ncolumns:\n  id:\n    name: id\n    dataType: INTEGER\n";
        let table: Table = from_document("/k", Some(text)).unwrap();
        assert_eq!(table.column_names(), vec!["id"]);
        assert_eq!(table.index_count(), 0);
        assert_eq!(table.constraint_count(), 0);

        let id = table.get_column("id").unwrap();
        assert!(id.visible);
        assert!(id.nullable);
        assert!(!id.primary_key);
    }
}
