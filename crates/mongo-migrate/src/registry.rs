//! Known-collections registry and request validation.
//!
//! The registry is a fixed, closed set of collection names that migration
//! requests are validated against. Requests naming an unregistered collection
//! are partitioned out before resolution and never executed.

use std::collections::BTreeSet;

/// A single entry parsed from the command surface: a collection name and an
/// optional reference. When the reference is absent the resolver picks the
/// latest unit for that collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    /// Collection name.
    pub collection: String,

    /// Reference of the migration unit to run, or None for "latest".
    pub reference: Option<String>,
}

impl MigrationRequest {
    /// Request a specific unit by reference.
    pub fn new(collection: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            reference: Some(reference.into()),
        }
    }

    /// Request the latest unit for a collection.
    pub fn latest(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            reference: None,
        }
    }

    /// Parse a `collection[:reference]` command-line argument.
    ///
    /// An empty reference (`"users:"`) is treated the same as no reference.
    pub fn parse(arg: &str) -> Self {
        match arg.split_once(':') {
            Some((collection, reference)) if !reference.is_empty() => {
                Self::new(collection, reference)
            }
            Some((collection, _)) => Self::latest(collection),
            None => Self::latest(arg),
        }
    }
}

/// Fixed, closed set of valid collection names.
#[derive(Debug, Clone)]
pub struct CollectionRegistry {
    names: BTreeSet<String>,
}

impl CollectionRegistry {
    /// Create a registry from an explicit name list.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a registry with the application's model collections.
    pub fn with_builtins() -> Self {
        Self::from_names(["users", "reports", "coupons"])
    }

    /// Whether a collection name is registered.
    pub fn contains(&self, collection: &str) -> bool {
        self.names.contains(collection)
    }

    /// Registered collection names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Split requests into (registered, unregistered), preserving order.
    pub fn partition(
        &self,
        requests: Vec<MigrationRequest>,
    ) -> (Vec<MigrationRequest>, Vec<MigrationRequest>) {
        requests
            .into_iter()
            .partition(|request| self.contains(&request.collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_with_reference() {
        let request = MigrationRequest::parse("users:xK9fQ2w_");
        assert_eq!(request.collection, "users");
        assert_eq!(request.reference.as_deref(), Some("xK9fQ2w_"));
    }

    #[test]
    fn test_parse_collection_without_reference() {
        let request = MigrationRequest::parse("users");
        assert_eq!(request.collection, "users");
        assert_eq!(request.reference, None);
    }

    #[test]
    fn test_parse_empty_reference_means_latest() {
        let request = MigrationRequest::parse("users:");
        assert_eq!(request.reference, None);
    }

    #[test]
    fn test_partition_preserves_order_and_drops_nothing() {
        let registry = CollectionRegistry::with_builtins();
        let requests = vec![
            MigrationRequest::latest("users"),
            MigrationRequest::latest("sessions"),
            MigrationRequest::new("coupons", "abc"),
        ];

        let (valid, invalid) = registry.partition(requests);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].collection, "users");
        assert_eq!(valid[1].collection, "coupons");
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].collection, "sessions");
    }

    #[test]
    fn test_builtin_collections() {
        let registry = CollectionRegistry::with_builtins();
        assert!(registry.contains("users"));
        assert!(registry.contains("reports"));
        assert!(registry.contains("coupons"));
        assert!(!registry.contains("applications"));
    }
}
