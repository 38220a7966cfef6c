//! Configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Fallback page size applied when a query is invoked without explicit
/// pagination.
///
/// Many entity queries never pass `first`; this single named constant is the
/// one place that fallback lives.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Database connection settings for the MariaDB backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Host address or socket path
    pub address: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    pub user: String,

    pub password: String,

    pub name: String,

    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_port() -> u16 {
    3306
}

fn default_max_connections() -> u32 {
    10
}

/// Domain defaults applied when records omit optional attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Page size fallback for unpaginated queries
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Priority assigned to issues with no explicit rating source
    #[serde(default = "default_issue_priority")]
    pub issue_priority: i64,

    /// Repository name assumed for component versions that do not name one
    #[serde(default = "default_repository_name")]
    pub repository_name: String,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_issue_priority() -> i64 {
    100
}

fn default_repository_name() -> String {
    "nvd".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            issue_priority: default_issue_priority(),
            repository_name: default_repository_name(),
        }
    }
}

/// Complete configuration for a vigil deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VigilConfig {
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            database: None,
            defaults: DefaultsConfig::default(),
        }
    }
}

impl VigilConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = VigilConfig::default();
        assert!(config.database.is_none());
        assert_eq!(config.defaults.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.defaults.repository_name, "nvd");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = VigilConfig::from_yaml_str("defaults:\n  issue_priority: 50\n").unwrap();
        assert_eq!(config.defaults.issue_priority, 50);
        assert_eq!(config.defaults.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_database_section() {
        let yaml = r#"
database:
  address: db.internal
  user: vigil
  password: secret
  name: vigil
defaults:
  page_size: 250
"#;
        let config = VigilConfig::from_yaml_str(yaml).unwrap();
        let db = config.database.unwrap();
        assert_eq!(db.address, "db.internal");
        assert_eq!(db.port, 3306);
        assert_eq!(db.max_connections, 10);
        assert_eq!(config.defaults.page_size, 250);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "defaults:\n  repository_name: osv\n").unwrap();
        let config = VigilConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.defaults.repository_name, "osv");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(VigilConfig::from_yaml_str("defaults: [not, a, map]").is_err());
    }
}
