//! Data types for clustermeta
//!
//! This module defines the column data types, the database dialect tag and the
//! naming policy used to key catalog entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SQL Data Types
///
/// Persisted in its SQL spelling (`VARCHAR(100)`, `DECIMAL(10, 2)`), so the
/// stored documents stay readable by any node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DataType {
    /// Boolean type
    Boolean,
    /// Small integer (16-bit)
    SmallInt,
    /// Integer (32-bit)
    Integer,
    /// Big integer (64-bit)
    BigInt,
    /// Single-precision floating point
    Float,
    /// Double-precision floating point
    Double,
    /// Fixed-point decimal with precision and scale
    Decimal(u8, u8),
    /// Fixed-length character string
    Char(usize),
    /// Variable-length character string with max length
    Varchar(usize),
    /// Unlimited text
    Text,
    /// Date (year, month, day)
    Date,
    /// Time (hour, minute, second)
    Time,
    /// Timestamp (date + time)
    Timestamp,
    /// Binary data
    Blob,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::Integer => write!(f, "INTEGER"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::Decimal(p, s) => write!(f, "DECIMAL({}, {})", p, s),
            DataType::Char(n) => write!(f, "CHAR({})", n),
            DataType::Varchar(n) => write!(f, "VARCHAR({})", n),
            DataType::Text => write!(f, "TEXT"),
            DataType::Date => write!(f, "DATE"),
            DataType::Time => write!(f, "TIME"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
            DataType::Blob => write!(f, "BLOB"),
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (base, args) = match s.split_once('(') {
            Some((base, rest)) => {
                let args = rest
                    .strip_suffix(')')
                    .ok_or_else(|| format!("unbalanced parentheses in data type '{}'", s))?;
                (base.trim(), Some(args))
            }
            None => (s, None),
        };

        let number = |arg: &str| -> Result<usize, String> {
            arg.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid length '{}' in data type '{}'", arg.trim(), s))
        };

        let data_type = match (base.to_ascii_uppercase().as_str(), args) {
            ("BOOLEAN", None) => DataType::Boolean,
            ("SMALLINT", None) => DataType::SmallInt,
            ("INTEGER", None) => DataType::Integer,
            ("BIGINT", None) => DataType::BigInt,
            ("FLOAT", None) => DataType::Float,
            ("DOUBLE", None) => DataType::Double,
            ("TEXT", None) => DataType::Text,
            ("DATE", None) => DataType::Date,
            ("TIME", None) => DataType::Time,
            ("TIMESTAMP", None) => DataType::Timestamp,
            ("BLOB", None) => DataType::Blob,
            ("CHAR", Some(n)) => DataType::Char(number(n)?),
            ("VARCHAR", Some(n)) => DataType::Varchar(number(n)?),
            ("DECIMAL", Some(args)) => {
                let (p, scale) = args
                    .split_once(',')
                    .ok_or_else(|| format!("DECIMAL needs precision and scale: '{}'", s))?;
                let p = u8::try_from(number(p)?).map_err(|_| format!("precision out of range: '{}'", s))?;
                let scale =
                    u8::try_from(number(scale)?).map_err(|_| format!("scale out of range: '{}'", s))?;
                DataType::Decimal(p, scale)
            }
            _ => return Err(format!("unknown data type '{}'", s)),
        };
        Ok(data_type)
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.to_string()
    }
}

impl TryFrom<String> for DataType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// SQL dialect of a logical database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DatabaseType {
    #[default]
    MySQL,
    PostgreSQL,
    #[serde(rename = "openGauss")]
    OpenGauss,
    Oracle,
    SQLServer,
    H2,
    SQL92,
}

impl DatabaseType {
    pub fn name(&self) -> &'static str {
        match self {
            DatabaseType::MySQL => "MySQL",
            DatabaseType::PostgreSQL => "PostgreSQL",
            DatabaseType::OpenGauss => "openGauss",
            DatabaseType::Oracle => "Oracle",
            DatabaseType::SQLServer => "SQLServer",
            DatabaseType::H2 => "H2",
            DatabaseType::SQL92 => "SQL92",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How schema, table and view names are keyed inside a database.
///
/// Only affects in-memory lookup. Persisted paths always carry names verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    #[default]
    Sensitive,
    Insensitive,
}

impl NameCase {
    /// Lookup key for `name` under this policy.
    pub fn key(&self, name: &str) -> String {
        match self {
            NameCase::Sensitive => name.to_string(),
            NameCase::Insensitive => name.to_lowercase(),
        }
    }
}
