//! Error types for the migration library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or command error
    #[error("Database error: {0}")]
    Connection(#[from] mongodb::error::Error),

    /// Latest-version lookup against a collection with no migration directory.
    ///
    /// An entirely absent migration history is treated as a setup fault and
    /// aborts the whole batch, unlike an unresolved reference which is skipped.
    #[error("Migration directory for collection {collection} does not exist: {path:?}")]
    MigrationRootMissing { collection: String, path: PathBuf },

    /// A selected unit has no handler registered in the catalog
    #[error("No registered migration for collection {collection} with reference {reference}")]
    UnregisteredUnit { collection: String, reference: String },

    /// A unit's migrate/rollback operation failed
    #[error("Migration failed for collection {collection}: {message}")]
    Execution { collection: String, message: String },

    /// External dump/restore tool exited non-zero
    #[error("Dump tool failed (exit {status:?}): {command}")]
    DumpTool {
        command: String,
        status: Option<i32>,
        output: String,
    },

    /// No dump snapshot matches the reference being rolled back
    #[error("Dump for collection {collection} with reference {reference} does not exist")]
    SnapshotMissing { collection: String, reference: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    /// Create an Execution error
    pub fn execution(collection: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Execution {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
