//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = Config::from_yaml("database:\n  name: monitoring\n").unwrap();
        assert_eq!(config.database.uri, "mongodb://localhost:27017");
        assert_eq!(config.storage.migrations_root.to_str(), Some("migrations"));
        assert_eq!(config.storage.dumps_root.to_str(), Some("dumps"));
        assert_eq!(config.tools.mongodump, "mongodump");
        assert_eq!(config.tools.mongorestore, "mongorestore");
    }

    #[test]
    fn test_missing_database_name_rejected() {
        let err = Config::from_yaml("database:\n  name: ''\n").unwrap_err();
        assert!(err.to_string().contains("database.name"));
    }

    #[test]
    fn test_non_mongodb_uri_rejected() {
        let yaml = "database:\n  uri: postgres://localhost\n  name: monitoring\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("database.uri"));
    }

    #[test]
    fn test_explicit_fields_override_defaults() {
        let yaml = "\
database:
  uri: mongodb://db.internal:27017
  name: monitoring
storage:
  migrations_root: /srv/migrations
  dumps_root: /srv/dumps
tools:
  mongodump: /usr/local/bin/mongodump
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.database.uri, "mongodb://db.internal:27017");
        assert_eq!(
            config.storage.migrations_root.to_str(),
            Some("/srv/migrations")
        );
        assert_eq!(config.tools.mongodump, "/usr/local/bin/mongodump");
        assert_eq!(config.tools.mongorestore, "mongorestore");
    }
}
