//! # mongo-migrate
//!
//! Versioned, reversible data-migrations for MongoDB collections.
//!
//! This library provides the core functionality for discovering migration
//! units by collection and reference, executing them against a live database,
//! and rolling them back using point-in-time dump snapshots:
//!
//! - **File-based version resolution** with "latest by timestamp" semantics
//!   when no reference is given
//! - **Typed handler catalog** keyed by `(collection, reference)` instead of
//!   dynamic code loading
//! - **Partial-failure-tolerant batches**: sibling collections run to
//!   completion even when one fails
//! - **Dump-based rollback** via the external `mongodump`/`mongorestore`
//!   executables, judged by exit code and captured output
//!
//! ## Example
//!
//! ```rust,no_run
//! use mongo_migrate::{
//!     CollectionRegistry, Config, MigrationCatalog, MigrationRequest, Orchestrator, RunOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mongo_migrate::MigrateError> {
//!     let config = Config::load("config.yaml")?;
//!     let catalog = MigrationCatalog::new(); // register units here
//!     let orchestrator = Orchestrator::new(config, CollectionRegistry::with_builtins(), catalog);
//!     let report = orchestrator
//!         .migrate(vec![MigrationRequest::latest("users")], RunOptions::default())
//!         .await?;
//!     println!("batch {}", report.status);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod dump;
pub mod error;
pub mod orchestrator;
pub mod reference;
pub mod registry;
pub mod resolver;

// Re-exports for convenient access
pub use catalog::{MigrationCatalog, MigrationCtx, MigrationHandler, RunOptions};
pub use config::{Config, DatabaseConfig, StorageConfig, ToolsConfig};
pub use dump::{check_dump_exists, run_dump_command, DumpBridge, DumpLookup, DumpOutcome};
pub use error::{MigrateError, Result};
pub use orchestrator::{
    BatchOperation, BatchReport, BatchStatus, CollectionOutcome, DbSession, Orchestrator,
};
pub use reference::generate_reference;
pub use registry::{CollectionRegistry, MigrationRequest};
pub use resolver::{MigrationResolver, ResolvedMigration, UnitName};
