//! Batch orchestrator - drives migrate/rollback across collections.
//!
//! One CLI invocation is one batch: requests are validated against the
//! collection registry, resolved to registered units, and executed
//! concurrently against an explicitly acquired database session. The batch
//! is a one-shot state machine
//! (`Idle → Connected → Resolving → Executing → {Completed | Failed}`);
//! terminal states end the process via the caller's exit-code mapping.
//!
//! Execution joins every unit with a single wait-for-all: a failing
//! collection never cancels siblings already in flight, it only makes the
//! final batch status `Failed`. Every per-collection outcome is collected and
//! reported, not just the first failure.

use std::fmt;

use futures::future::join_all;
use mongodb::bson::doc;
use mongodb::{Client, Database};
use tracing::{error, info};

use crate::catalog::{MigrationCatalog, MigrationCtx, RunOptions};
use crate::config::{Config, DatabaseConfig};
use crate::error::{MigrateError, Result};
use crate::registry::{CollectionRegistry, MigrationRequest};
use crate::resolver::{MigrationResolver, ResolvedMigration, UnitName};

/// Which of the two unit operations a batch drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    Migrate,
    Rollback,
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Migrate => write!(f, "migrate"),
            Self::Rollback => write!(f, "rollback"),
        }
    }
}

/// Final state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every unit completed.
    Completed,

    /// At least one unit failed; siblings still ran to completion.
    Failed,

    /// The user declined the rollback confirmation; nothing executed.
    Aborted,

    /// No request survived validation and resolution; nothing to execute.
    NothingToDo,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Aborted => write!(f, "aborted"),
            Self::NothingToDo => write!(f, "nothing to do"),
        }
    }
}

/// Outcome of one unit's execution within a batch.
#[derive(Debug)]
pub struct CollectionOutcome {
    /// Collection the unit ran against.
    pub collection: String,

    /// Reference of the executed unit.
    pub reference: String,

    /// Failure, if the unit's operation rejected.
    pub error: Option<MigrateError>,
}

impl CollectionOutcome {
    /// Whether the unit completed.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a batch run: aggregate status plus every per-collection outcome.
#[derive(Debug)]
pub struct BatchReport {
    /// Operation the batch drove.
    pub operation: BatchOperation,

    /// Final batch status.
    pub status: BatchStatus,

    /// Per-collection outcomes, one per executed unit.
    pub outcomes: Vec<CollectionOutcome>,
}

impl BatchReport {
    fn empty(operation: BatchOperation) -> Self {
        Self {
            operation,
            status: BatchStatus::NothingToDo,
            outcomes: Vec::new(),
        }
    }

    fn from_outcomes(operation: BatchOperation, outcomes: Vec<CollectionOutcome>) -> Self {
        Self {
            operation,
            status: status_of(&outcomes),
            outcomes,
        }
    }

    /// Whether the batch should map to a success exit status. Aborted and
    /// nothing-to-do batches are clean exits, not failures.
    pub fn is_success(&self) -> bool {
        self.status != BatchStatus::Failed
    }
}

fn status_of(outcomes: &[CollectionOutcome]) -> BatchStatus {
    if outcomes.iter().any(|outcome| outcome.error.is_some()) {
        BatchStatus::Failed
    } else {
        BatchStatus::Completed
    }
}

/// An explicitly acquired database session.
///
/// Scoped acquisition with guaranteed release: the orchestrator connects once
/// per batch, threads the handle through execution, and closes it before
/// returning. No module-scope connection state exists.
pub struct DbSession {
    client: Client,

    /// Live database handle.
    pub db: Database,
}

impl DbSession {
    /// Connect and verify the connection with a ping. Failure here is fatal
    /// to the batch; there is no retry.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.uri).await?;
        let db = client.database(&config.name);
        db.run_command(doc! { "ping": 1 }).await?;
        info!(database = %config.name, "connected");
        Ok(Self { client, db })
    }

    /// Release the session.
    pub async fn close(self) {
        self.client.shutdown().await;
    }
}

enum Prepared {
    Done(BatchReport),
    Ready {
        session: DbSession,
        resolved: Vec<ResolvedMigration>,
    },
}

/// Migration batch orchestrator.
pub struct Orchestrator {
    config: Config,
    registry: CollectionRegistry,
    catalog: MigrationCatalog,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(config: Config, registry: CollectionRegistry, catalog: MigrationCatalog) -> Self {
        Self {
            config,
            registry,
            catalog,
        }
    }

    /// Run the migrate operation for every resolvable request concurrently.
    pub async fn migrate(
        &self,
        requests: Vec<MigrationRequest>,
        options: RunOptions,
    ) -> Result<BatchReport> {
        match self.prepare(BatchOperation::Migrate, requests).await? {
            Prepared::Done(report) => Ok(report),
            Prepared::Ready { session, resolved } => {
                let ctx = self.context(&session);
                let outcomes =
                    execute_units(&resolved, &ctx, &options, BatchOperation::Migrate).await;
                session.close().await;
                Ok(BatchReport::from_outcomes(BatchOperation::Migrate, outcomes))
            }
        }
    }

    /// Run the rollback operation for every resolvable request concurrently.
    ///
    /// `confirm` gates the entire batch with a single prompt; declining aborts
    /// cleanly with zero rollback calls.
    pub async fn rollback<F>(
        &self,
        requests: Vec<MigrationRequest>,
        options: RunOptions,
        confirm: F,
    ) -> Result<BatchReport>
    where
        F: FnOnce() -> Result<bool>,
    {
        match self.prepare(BatchOperation::Rollback, requests).await? {
            Prepared::Done(report) => Ok(report),
            Prepared::Ready { session, resolved } => {
                let ctx = self.context(&session);
                let result = rollback_units(&resolved, &ctx, &options, confirm).await;
                session.close().await;
                let (status, outcomes) = result?;
                Ok(BatchReport {
                    operation: BatchOperation::Rollback,
                    status,
                    outcomes,
                })
            }
        }
    }

    /// Run a single unit's migrate operation, selected by its storage name.
    pub async fn run_single(
        &self,
        collection: &str,
        file_name: &str,
        options: RunOptions,
    ) -> Result<()> {
        let unit = UnitName::parse(file_name).ok_or_else(|| {
            MigrateError::Config(format!("'{file_name}' is not a migration unit file name"))
        })?;
        let handler = self.catalog.get(collection, &unit.reference).ok_or_else(|| {
            MigrateError::UnregisteredUnit {
                collection: collection.to_string(),
                reference: unit.reference.clone(),
            }
        })?;

        let session = DbSession::connect(&self.config.database).await?;
        let ctx = self.context(&session);
        let result = handler.migrate(&ctx, &options).await;
        session.close().await;
        result
    }

    async fn prepare(
        &self,
        operation: BatchOperation,
        requests: Vec<MigrationRequest>,
    ) -> Result<Prepared> {
        let (valid, invalid) = self.registry.partition(requests);
        for request in &invalid {
            info!(collection = %request.collection, "collection is not registered, skipping");
        }
        if valid.is_empty() {
            info!("no registered collections in the request list");
            return Ok(Prepared::Done(BatchReport::empty(operation)));
        }

        let session = DbSession::connect(&self.config.database).await?;

        let resolver =
            MigrationResolver::new(&self.config.storage.migrations_root, &self.catalog);
        let resolved = match resolver.resolve_all(&valid) {
            Ok(resolved) => resolved,
            Err(e) => {
                session.close().await;
                return Err(e);
            }
        };

        if resolved.is_empty() {
            info!("no migrations found for the requested collections");
            session.close().await;
            return Ok(Prepared::Done(BatchReport::empty(operation)));
        }

        Ok(Prepared::Ready { session, resolved })
    }

    fn context(&self, session: &DbSession) -> MigrationCtx {
        MigrationCtx::new(
            session.db.clone(),
            &self.config.database.name,
            &self.config.storage.dumps_root,
            self.config.tools.clone(),
        )
    }
}

/// Execute one operation across all units with a single wait-for-all join.
///
/// Every launched unit runs to completion; a failure only lands in that
/// unit's outcome. No ordering is guaranteed between sibling collections.
pub(crate) async fn execute_units(
    units: &[ResolvedMigration],
    ctx: &MigrationCtx,
    options: &RunOptions,
    operation: BatchOperation,
) -> Vec<CollectionOutcome> {
    let tasks = units.iter().map(|unit| async move {
        let result = match operation {
            BatchOperation::Migrate => unit.handler.migrate(ctx, options).await,
            BatchOperation::Rollback => unit.handler.rollback(ctx, options).await,
        };
        match &result {
            Ok(()) => {
                info!(collection = %unit.collection, reference = %unit.reference, "{operation} completed");
            }
            Err(e) => {
                error!(collection = %unit.collection, reference = %unit.reference, "{operation} failed: {e}");
            }
        }
        CollectionOutcome {
            collection: unit.collection.clone(),
            reference: unit.reference.clone(),
            error: result.err(),
        }
    });

    join_all(tasks).await
}

/// Confirmation-gated rollback over resolved units.
pub(crate) async fn rollback_units<F>(
    units: &[ResolvedMigration],
    ctx: &MigrationCtx,
    options: &RunOptions,
    confirm: F,
) -> Result<(BatchStatus, Vec<CollectionOutcome>)>
where
    F: FnOnce() -> Result<bool>,
{
    if !confirm()? {
        info!("rollback aborted by the user");
        return Ok((BatchStatus::Aborted, Vec::new()));
    }

    let outcomes = execute_units(units, ctx, options, BatchOperation::Rollback).await;
    let status = status_of(&outcomes);
    Ok((status, outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MigrationHandler;
    use crate::config::ToolsConfig;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stub handler that records calls and optionally fails.
    struct Recording {
        collection: &'static str,
        reference: &'static str,
        fail: bool,
        migrate_calls: AtomicUsize,
        rollback_calls: AtomicUsize,
    }

    impl Recording {
        fn new(collection: &'static str, reference: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                collection,
                reference,
                fail,
                migrate_calls: AtomicUsize::new(0),
                rollback_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MigrationHandler for Recording {
        fn collection(&self) -> &str {
            self.collection
        }

        fn reference(&self) -> &str {
            self.reference
        }

        async fn migrate(&self, _ctx: &MigrationCtx, _options: &RunOptions) -> Result<()> {
            self.migrate_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MigrateError::execution(self.collection, "boom"));
            }
            Ok(())
        }

        async fn rollback(&self, _ctx: &MigrationCtx, _options: &RunOptions) -> Result<()> {
            self.rollback_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MigrateError::execution(self.collection, "boom"));
            }
            Ok(())
        }
    }

    fn resolved(handler: &Arc<Recording>) -> ResolvedMigration {
        ResolvedMigration {
            collection: handler.collection.to_string(),
            reference: handler.reference.to_string(),
            created_at: Utc::now(),
            handler: handler.clone(),
        }
    }

    /// A context over a lazily-connecting client; stub handlers never touch
    /// the database, so no server is needed.
    async fn test_ctx() -> MigrationCtx {
        let client = Client::with_uri_str("mongodb://127.0.0.1:27017")
            .await
            .unwrap();
        MigrationCtx::new(
            client.database("migrate_tests"),
            "migrate_tests",
            std::env::temp_dir(),
            ToolsConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_execute_collects_every_outcome() {
        let ok = Recording::new("users", "ref1", false);
        let failing = Recording::new("coupons", "ref2", true);
        let units = vec![resolved(&ok), resolved(&failing)];
        let ctx = test_ctx().await;

        let outcomes =
            execute_units(&units, &ctx, &RunOptions::default(), BatchOperation::Migrate).await;

        // Both units were attempted even though one failed.
        assert_eq!(outcomes.len(), 2);
        assert_eq!(ok.migrate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(failing.migrate_calls.load(Ordering::SeqCst), 1);

        let report = BatchReport::from_outcomes(BatchOperation::Migrate, outcomes);
        assert_eq!(report.status, BatchStatus::Failed);
        assert!(!report.is_success());

        let users = report
            .outcomes
            .iter()
            .find(|o| o.collection == "users")
            .unwrap();
        assert!(users.is_success());
    }

    #[tokio::test]
    async fn test_declined_confirmation_executes_zero_rollbacks() {
        let a = Recording::new("users", "ref1", false);
        let b = Recording::new("coupons", "ref2", false);
        let units = vec![resolved(&a), resolved(&b)];
        let ctx = test_ctx().await;

        let (status, outcomes) =
            rollback_units(&units, &ctx, &RunOptions::default(), || Ok(false))
                .await
                .unwrap();

        assert_eq!(status, BatchStatus::Aborted);
        assert!(outcomes.is_empty());
        assert_eq!(a.rollback_calls.load(Ordering::SeqCst), 0);
        assert_eq!(b.rollback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_accepted_confirmation_rolls_back_every_unit() {
        let a = Recording::new("users", "ref1", false);
        let b = Recording::new("coupons", "ref2", false);
        let units = vec![resolved(&a), resolved(&b)];
        let ctx = test_ctx().await;

        let (status, outcomes) = rollback_units(&units, &ctx, &RunOptions::default(), || Ok(true))
            .await
            .unwrap();

        assert_eq!(status, BatchStatus::Completed);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(a.rollback_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.rollback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_with_no_registered_collection_is_nothing_to_do() {
        let config = Config::from_yaml(
            "database:\n  uri: mongodb://127.0.0.1:27017\n  name: migrate_tests\n",
        )
        .unwrap();
        let orchestrator = Orchestrator::new(
            config,
            CollectionRegistry::with_builtins(),
            MigrationCatalog::new(),
        );

        // Validation short-circuits before any connection attempt.
        let report = orchestrator
            .migrate(
                vec![MigrationRequest::latest("sessions")],
                RunOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(report.status, BatchStatus::NothingToDo);
        assert!(report.is_success());
        assert!(report.outcomes.is_empty());
    }
}
