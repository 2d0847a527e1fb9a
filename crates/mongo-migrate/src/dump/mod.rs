//! Dump/restore bridge around the external database dump tool.
//!
//! The bridge spawns the dump/restore executables as subprocesses, captures
//! their combined output, and judges them by exit code alone. Per-collection
//! operations run concurrently and independently: a failure dumping or
//! restoring one collection is logged and reported, never propagated to
//! siblings. Restore is destructive (drop-then-load), so the bridge never
//! restores speculatively: a missing snapshot is a reported, recoverable
//! condition.

mod snapshot;

pub use snapshot::{check_dump_exists, DumpLookup};

use std::path::PathBuf;

use chrono::Utc;
use futures::future::join_all;
use tokio::process::Command;
use tracing::{error, info};

use crate::error::{MigrateError, Result};
use crate::resolver::TIMESTAMP_FORMAT;

/// Per-collection result of a dump or restore pass.
#[derive(Debug)]
pub struct DumpOutcome {
    /// Collection the operation ran against.
    pub collection: String,

    /// Failure, if the operation did not complete.
    pub error: Option<MigrateError>,
}

impl DumpOutcome {
    /// Whether the operation completed.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Run a dump-tool command line through the shell and capture its output.
///
/// Stdout and stderr are accumulated into a single log buffer and emitted
/// after process exit, tagged success/failure by exit code. A non-zero exit
/// yields a [`MigrateError::DumpTool`] carrying the status and captured text.
pub async fn run_dump_command(command: &str) -> Result<String> {
    let output = Command::new("sh").arg("-c").arg(command).output().await?;

    let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
    logs.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        info!(%command, "dump tool succeeded");
        if !logs.trim().is_empty() {
            info!("{}", logs.trim_end());
        }
        Ok(logs)
    } else {
        error!(%command, status = ?output.status.code(), "dump tool failed");
        if !logs.trim().is_empty() {
            error!("{}", logs.trim_end());
        }
        Err(MigrateError::DumpTool {
            command: command.to_string(),
            status: output.status.code(),
            output: logs,
        })
    }
}

/// Bridge to the external dump/restore executables.
#[derive(Debug, Clone)]
pub struct DumpBridge {
    dumps_root: PathBuf,
    mongodump: String,
    mongorestore: String,
}

impl DumpBridge {
    /// Create a bridge writing snapshots under `dumps_root`.
    pub fn new(dumps_root: impl Into<PathBuf>) -> Self {
        Self {
            dumps_root: dumps_root.into(),
            mongodump: "mongodump".to_string(),
            mongorestore: "mongorestore".to_string(),
        }
    }

    /// Override the dump/restore executable names.
    pub fn with_tools(
        mut self,
        mongodump: impl Into<String>,
        mongorestore: impl Into<String>,
    ) -> Self {
        self.mongodump = mongodump.into();
        self.mongorestore = mongorestore.into();
        self
    }

    /// Snapshot each collection of `database` under the given reference.
    ///
    /// An empty collection list is a no-op: nothing is spawned and no outcome
    /// is produced. Collections are dumped concurrently; each failure is
    /// caught, logged, and reported in that collection's outcome only.
    pub async fn create_dump(
        &self,
        database: &str,
        collections: &[String],
        reference: &str,
    ) -> Vec<DumpOutcome> {
        if collections.is_empty() {
            return Vec::new();
        }

        let stamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let tasks = collections.iter().map(|collection| {
            let stamp = stamp.clone();
            async move {
                let result = self
                    .dump_collection(database, collection, reference, &stamp)
                    .await;
                if let Err(ref e) = result {
                    error!(collection = %collection, "dump failed: {e}");
                }
                DumpOutcome {
                    collection: collection.clone(),
                    error: result.err(),
                }
            }
        });

        join_all(tasks).await
    }

    /// Restore each collection from the snapshot tagged with `reference`.
    ///
    /// Existing collection contents are dropped before loading the archive.
    /// A collection with no matching snapshot is logged as a failure and does
    /// not affect sibling restores.
    pub async fn restore_dump(&self, reference: &str, collections: &[String]) -> Vec<DumpOutcome> {
        let tasks = collections.iter().map(|collection| async move {
            let result = self.restore_collection(reference, collection).await;
            if let Err(ref e) = result {
                error!(collection = %collection, "restore failed: {e}");
            }
            DumpOutcome {
                collection: collection.clone(),
                error: result.err(),
            }
        });

        join_all(tasks).await
    }

    async fn dump_collection(
        &self,
        database: &str,
        collection: &str,
        reference: &str,
        stamp: &str,
    ) -> Result<()> {
        let dump_dir = self
            .dumps_root
            .join(collection)
            .join(format!("{reference}-dump-{stamp}"));
        tokio::fs::create_dir_all(&dump_dir).await?;

        let archive = dump_dir.join(format!("{reference}.gz"));
        let command = format!(
            "{} -d {} -c {} --archive={} --gzip",
            self.mongodump,
            database,
            collection.to_lowercase(),
            archive.display()
        );
        run_dump_command(&command).await?;
        Ok(())
    }

    async fn restore_collection(&self, reference: &str, collection: &str) -> Result<()> {
        let collection_dir = self.dumps_root.join(collection);
        let lookup = check_dump_exists(&collection_dir, reference)?;

        let Some(file_name) = lookup.file_name else {
            return Err(MigrateError::SnapshotMissing {
                collection: collection.to_string(),
                reference: reference.to_string(),
            });
        };

        let archive = collection_dir.join(file_name).join(format!("{reference}.gz"));
        let command = format!(
            "{} --verbose --drop --gzip --archive={}",
            self.mongorestore,
            archive.display()
        );
        run_dump_command(&command).await?;
        Ok(())
    }
}
