//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.database.name.is_empty() {
        return Err(MigrateError::Config("database.name is required".into()));
    }
    if !config.database.uri.starts_with("mongodb://")
        && !config.database.uri.starts_with("mongodb+srv://")
    {
        return Err(MigrateError::Config(format!(
            "database.uri must be a mongodb:// or mongodb+srv:// URI, got '{}'",
            config.database.uri
        )));
    }
    if config.tools.mongodump.is_empty() {
        return Err(MigrateError::Config("tools.mongodump must not be empty".into()));
    }
    if config.tools.mongorestore.is_empty() {
        return Err(MigrateError::Config(
            "tools.mongorestore must not be empty".into(),
        ));
    }

    Ok(())
}
