//! Cluster mode configuration
//!
//! Loaded from YAML (camelCase keys) or assembled with the builder setters.
//!
//! ```yaml
//! databaseType: PostgreSQL
//! nameCase: insensitive
//! persistTimeoutMillis: 3000
//! ```

use crate::error::{Error, Result};
use crate::metadata::{DatabaseType, NameCase};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default bound on a single repository call
pub const DEFAULT_PERSIST_TIMEOUT_MILLIS: u64 = 5000;

/// Configuration of the cluster mode context manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ModeConfig {
    /// Dialect of databases created through `create_database`
    pub database_type: DatabaseType,
    /// How schema, table and view names are keyed in memory
    pub name_case: NameCase,
    /// Bound on each repository call, in milliseconds
    pub persist_timeout_millis: u64,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            database_type: DatabaseType::default(),
            name_case: NameCase::default(),
            persist_timeout_millis: DEFAULT_PERSIST_TIMEOUT_MILLIS,
        }
    }
}

impl ModeConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database type
    pub fn database_type(mut self, database_type: DatabaseType) -> Self {
        self.database_type = database_type;
        self
    }

    /// Set the name case policy
    pub fn name_case(mut self, name_case: NameCase) -> Self {
        self.name_case = name_case;
        self
    }

    /// Set the repository call timeout
    pub fn persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout_millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Deadline for a single repository call
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_millis)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ModeConfig = if yaml.trim().is_empty() {
            ModeConfig::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| Error::InvalidConfig(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject settings the context manager cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.persist_timeout_millis == 0 {
            return Err(Error::InvalidConfig(
                "persistTimeoutMillis must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ModeConfig::new();
        assert_eq!(config.database_type, DatabaseType::MySQL);
        assert_eq!(config.name_case, NameCase::Sensitive);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(ModeConfig::from_yaml_str("").unwrap(), config);
    }

    #[test]
    fn test_from_yaml() {
        let config = ModeConfig::from_yaml_str(
            "databaseType: openGauss\nnameCase: insensitive\npersistTimeoutMillis: 250\n",
        )
        .unwrap();
        assert_eq!(config.database_type, DatabaseType::OpenGauss);
        assert_eq!(config.name_case, NameCase::Insensitive);
        assert_eq!(config.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ModeConfig::from_yaml_str("databaseType: PostgreSQL\n").unwrap();
        assert_eq!(config.database_type, DatabaseType::PostgreSQL);
        assert_eq!(config.persist_timeout_millis, DEFAULT_PERSIST_TIMEOUT_MILLIS);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            ModeConfig::from_yaml_str("persistTimeoutMillis: 0\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ModeConfig::from_yaml_str("databaseType: Sybase\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ModeConfig::from_yaml_str("unknownKey: 1\n"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nameCase: insensitive").unwrap();
        let config = ModeConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.name_case, NameCase::Insensitive);

        assert!(matches!(
            ModeConfig::from_yaml_file("/nonexistent/mode.yaml"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = ModeConfig::new()
            .database_type(DatabaseType::H2)
            .persist_timeout(Duration::from_millis(1500));
        assert_eq!(config.database_type, DatabaseType::H2);
        assert_eq!(config.persist_timeout_millis, 1500);
    }
}
