//! Dump snapshot lookup by reference prefix.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;

/// Result of a snapshot lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpLookup {
    /// Whether a matching entry was found.
    pub exists: bool,

    /// Name of the matching entry, when found.
    pub file_name: Option<String>,
}

impl DumpLookup {
    fn none() -> Self {
        Self::default()
    }

    fn found(file_name: String) -> Self {
        Self {
            exists: true,
            file_name: Some(file_name),
        }
    }
}

/// Check whether `directory` contains an entry whose name starts with
/// `reference` and return its name.
///
/// The first match in directory-listing order wins; when several entries share
/// a prefix the selection is platform-dependent, not creation order. A missing
/// directory means "no dump yet" and is not an error; any other filesystem
/// error propagates.
pub fn check_dump_exists(directory: &Path, reference: &str) -> Result<DumpLookup> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DumpLookup::none()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name.starts_with(reference) {
            return Ok(DumpLookup::found(name));
        }
    }

    Ok(DumpLookup::none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let lookup = check_dump_exists(&dir.path().join("absent"), "ref1").unwrap();
        assert!(!lookup.exists);
        assert_eq!(lookup.file_name, None);
    }

    #[test]
    fn test_prefix_match_returns_entry_name() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("ref1-dump-2024-01-01T00:00:00.000Z")).unwrap();

        let lookup = check_dump_exists(dir.path(), "ref1").unwrap();
        assert!(lookup.exists);
        assert_eq!(
            lookup.file_name.as_deref(),
            Some("ref1-dump-2024-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_no_match_when_prefix_differs() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("ref1-dump-2024-01-01T00:00:00.000Z")).unwrap();

        let lookup = check_dump_exists(dir.path(), "ref2").unwrap();
        assert!(!lookup.exists);
    }
}
