//! Migration handler catalog for explicit unit registration.
//!
//! The [`MigrationCatalog`] is a registry of migration handlers keyed by
//! `(collection, reference)`. Unlike dynamic loading of unit files at runtime,
//! handlers are compiled in and explicitly registered, then resolved via
//! lookup against the unit names discovered on disk. The catalog is
//! explicitly constructed and injected into the orchestrator, enabling
//! deterministic initialization and easy testing with stub handlers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::Database;

use crate::config::ToolsConfig;
use crate::dump::DumpBridge;
use crate::error::Result;

/// Options passed through to every unit's migrate/rollback operation.
///
/// The orchestrator does not interpret these flags; each unit decides how
/// `force` and `all` affect its own behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Force the operation even where the unit would normally guard it.
    pub force: bool,

    /// Apply the operation to all documents rather than a unit-chosen subset.
    pub all: bool,
}

/// Execution context threaded to every migration unit.
///
/// Carries the live database handle and the filesystem/tool configuration a
/// unit needs to snapshot or restore its collection. There is no module-scope
/// connection; the orchestrator constructs one context per batch from an
/// explicitly acquired session.
#[derive(Debug, Clone)]
pub struct MigrationCtx {
    /// Live database handle, shared across concurrently executing units.
    pub db: Database,

    /// Database name, used to parameterize dump commands.
    pub database_name: String,

    dumps_root: PathBuf,
    tools: ToolsConfig,
}

impl MigrationCtx {
    /// Create a new context.
    pub fn new(
        db: Database,
        database_name: impl Into<String>,
        dumps_root: impl Into<PathBuf>,
        tools: ToolsConfig,
    ) -> Self {
        Self {
            db,
            database_name: database_name.into(),
            dumps_root: dumps_root.into(),
            tools,
        }
    }

    /// Dump/restore bridge configured for this context's snapshot directory.
    pub fn bridge(&self) -> DumpBridge {
        DumpBridge::new(&self.dumps_root).with_tools(&self.tools.mongodump, &self.tools.mongorestore)
    }
}

/// A registered migration unit: a forward change and its reversal, bound to
/// exactly one collection and identified by a short opaque reference.
#[async_trait]
pub trait MigrationHandler: Send + Sync {
    /// Collection this unit is bound to.
    fn collection(&self) -> &str;

    /// Reference token identifying this unit (and its paired dump snapshot).
    fn reference(&self) -> &str;

    /// Apply the forward change.
    async fn migrate(&self, ctx: &MigrationCtx, options: &RunOptions) -> Result<()>;

    /// Reverse the change.
    async fn rollback(&self, ctx: &MigrationCtx, options: &RunOptions) -> Result<()>;
}

/// Registry of migration handlers keyed by `(collection, reference)`.
#[derive(Default)]
pub struct MigrationCatalog {
    handlers: HashMap<(String, String), Arc<dyn MigrationHandler>>,
}

impl MigrationCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own `(collection, reference)` key.
    ///
    /// A later registration with the same key replaces the earlier one.
    pub fn register(&mut self, handler: Arc<dyn MigrationHandler>) {
        let key = (
            handler.collection().to_string(),
            handler.reference().to_string(),
        );
        self.handlers.insert(key, handler);
    }

    /// Look up a handler. References are scoped per collection; the same
    /// reference under a different collection is a different identity.
    pub fn get(&self, collection: &str, reference: &str) -> Option<Arc<dyn MigrationHandler>> {
        self.handlers
            .get(&(collection.to_string(), reference.to_string()))
            .cloned()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the catalog has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
