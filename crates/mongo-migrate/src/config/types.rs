//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection configuration.
    pub database: DatabaseConfig,

    /// Filesystem layout for migration units and dump snapshots.
    #[serde(default)]
    pub storage: StorageConfig,

    /// External dump/restore tool configuration.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection URI (default: mongodb://localhost:27017).
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database name.
    pub name: String,
}

/// Filesystem layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of migration units, one subdirectory per collection
    /// (default: "migrations").
    #[serde(default = "default_migrations_root")]
    pub migrations_root: PathBuf,

    /// Root directory of dump snapshots, one subdirectory per collection
    /// (default: "dumps").
    #[serde(default = "default_dumps_root")]
    pub dumps_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            migrations_root: default_migrations_root(),
            dumps_root: default_dumps_root(),
        }
    }
}

/// External dump/restore tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Dump executable (default: "mongodump").
    #[serde(default = "default_mongodump")]
    pub mongodump: String,

    /// Restore executable (default: "mongorestore").
    #[serde(default = "default_mongorestore")]
    pub mongorestore: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mongodump: default_mongodump(),
            mongorestore: default_mongorestore(),
        }
    }
}

fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_migrations_root() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_dumps_root() -> PathBuf {
    PathBuf::from("dumps")
}

fn default_mongodump() -> String {
    "mongodump".to_string()
}

fn default_mongorestore() -> String {
    "mongorestore".to_string()
}
