//! Migration unit resolution from on-disk unit names.
//!
//! Migration units live under `<migrations_root>/<collection>/` with names of
//! the form `<reference>-<timestamp>-<collection>.rs`, where the timestamp is
//! ISO-8601 with millisecond precision and a trailing `Z`. The name is the
//! version-resolution source of truth: a request with a reference is matched
//! by prefix, a request without one gets the unit with the latest embedded
//! timestamp. Names that do not match the pattern are invisible to the
//! resolver. The executable logic itself is looked up in the
//! [`MigrationCatalog`] under the `(collection, reference)` key.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::warn;

use crate::catalog::{MigrationCatalog, MigrationHandler};
use crate::dump::check_dump_exists;
use crate::error::{MigrateError, Result};
use crate::registry::MigrationRequest;

/// Timestamp layout embedded in unit and snapshot names: ISO-8601 with
/// millisecond precision and a trailing `Z`. Fixed-width and zero-padded, so
/// the rendered form also sorts lexicographically in time order.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn unit_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^([A-Za-z0-9+_=]+)-(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z)-([A-Za-z0-9_]+)\.rs$",
        )
        .expect("unit name pattern is valid")
    })
}

/// Components parsed from a migration unit's storage name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitName {
    /// Reference token.
    pub reference: String,

    /// Creation timestamp embedded in the name.
    pub created_at: DateTime<Utc>,

    /// Collection the unit is bound to.
    pub collection: String,
}

impl UnitName {
    /// Parse a storage name, returning None for names that do not match the
    /// fixed layout (such names are excluded from candidacy, not errors).
    pub fn parse(name: &str) -> Option<Self> {
        let captures = unit_name_pattern().captures(name)?;
        let created_at = DateTime::parse_from_rfc3339(&captures[2])
            .ok()?
            .with_timezone(&Utc);

        Some(Self {
            reference: captures[1].to_string(),
            created_at,
            collection: captures[3].to_string(),
        })
    }
}

/// A request resolved to a concrete, registered migration unit.
#[derive(Clone)]
pub struct ResolvedMigration {
    /// Collection the unit runs against.
    pub collection: String,

    /// Reference parsed from the unit's storage name.
    pub reference: String,

    /// Creation timestamp parsed from the unit's storage name.
    pub created_at: DateTime<Utc>,

    /// Registered handler implementing the unit's operations.
    pub handler: Arc<dyn MigrationHandler>,
}

impl std::fmt::Debug for ResolvedMigration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedMigration")
            .field("collection", &self.collection)
            .field("reference", &self.reference)
            .field("created_at", &self.created_at)
            .field("handler", &"<dyn MigrationHandler>")
            .finish()
    }
}

/// Resolves `(collection, reference?)` requests to registered migration units.
pub struct MigrationResolver<'a> {
    migrations_root: PathBuf,
    catalog: &'a MigrationCatalog,
}

impl<'a> MigrationResolver<'a> {
    /// Create a resolver over `migrations_root` backed by `catalog`.
    pub fn new(migrations_root: impl Into<PathBuf>, catalog: &'a MigrationCatalog) -> Self {
        Self {
            migrations_root: migrations_root.into(),
            catalog,
        }
    }

    /// Resolve a single request.
    ///
    /// Returns `Ok(None)` when the request should be skipped: the reference
    /// does not match any unit, the matched name does not parse, no unit
    /// exists for a latest-lookup, or no handler is registered for the
    /// resolved key. A latest-lookup against a collection whose migration
    /// directory is missing entirely is fatal.
    pub fn resolve(&self, request: &MigrationRequest) -> Result<Option<ResolvedMigration>> {
        let collection_dir = self.migrations_root.join(&request.collection);

        let unit = match &request.reference {
            Some(reference) => self.find_by_reference(&collection_dir, request, reference)?,
            None => self.find_latest(&collection_dir, request)?,
        };

        let Some(unit) = unit else {
            return Ok(None);
        };

        match self.catalog.get(&request.collection, &unit.reference) {
            Some(handler) => Ok(Some(ResolvedMigration {
                collection: request.collection.clone(),
                reference: unit.reference,
                created_at: unit.created_at,
                handler,
            })),
            None => {
                warn!(
                    collection = %request.collection,
                    reference = %unit.reference,
                    "no registered handler for resolved unit, skipping"
                );
                Ok(None)
            }
        }
    }

    /// Resolve a list of requests independently, dropping skipped ones.
    ///
    /// Fatal resolution errors (a missing migration directory on a
    /// latest-lookup) propagate immediately, so a batch containing one aborts
    /// before anything executes. An empty result means the batch has nothing
    /// to do and is a no-op success for the caller.
    pub fn resolve_all(&self, requests: &[MigrationRequest]) -> Result<Vec<ResolvedMigration>> {
        let mut resolved = Vec::with_capacity(requests.len());
        for request in requests {
            if let Some(migration) = self.resolve(request)? {
                resolved.push(migration);
            }
        }
        Ok(resolved)
    }

    fn find_by_reference(
        &self,
        collection_dir: &Path,
        request: &MigrationRequest,
        reference: &str,
    ) -> Result<Option<UnitName>> {
        let lookup = check_dump_exists(collection_dir, reference)?;

        let Some(file_name) = lookup.file_name else {
            warn!(
                collection = %request.collection,
                reference = %reference,
                "reference does not exist for collection, skipping"
            );
            return Ok(None);
        };

        match UnitName::parse(&file_name) {
            Some(unit) => Ok(Some(unit)),
            None => {
                warn!(
                    collection = %request.collection,
                    file = %file_name,
                    "matched file is not a migration unit, skipping"
                );
                Ok(None)
            }
        }
    }

    fn find_latest(
        &self,
        collection_dir: &Path,
        request: &MigrationRequest,
    ) -> Result<Option<UnitName>> {
        if !collection_dir.is_dir() {
            return Err(MigrateError::MigrationRootMissing {
                collection: request.collection.clone(),
                path: collection_dir.to_path_buf(),
            });
        }

        let mut latest: Option<UnitName> = None;
        for entry in std::fs::read_dir(collection_dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            let Some(unit) = UnitName::parse(&name) else {
                continue;
            };
            if unit.collection != request.collection {
                continue;
            }
            // Strict comparison keeps the first-listed unit on equal stamps.
            match &latest {
                Some(current) if unit.created_at <= current.created_at => {}
                _ => latest = Some(unit),
            }
        }

        if latest.is_none() {
            warn!(
                collection = %request.collection,
                "no migration file found for collection, skipping"
            );
        }

        Ok(latest)
    }
}
