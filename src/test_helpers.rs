//! Shared test utilities.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let storage = source_tree(&[
//!     ("index.md", "---\ntitle: Home\n---\n# Hi"),
//!     ("css/site.css", "body{}"),
//! ]);
//! let files = read_source(&storage, Path::new(SOURCE), &IgnoreSet::new()).unwrap();
//!
//! assert_eq!(paths_of(&files), vec!["css/site.css", "index.md"]);
//! ```

use crate::collection::{FileCollection, FileRecord};
use crate::metadata::{MetaValue, Metadata};
use crate::storage::MemoryStorage;

/// Source root used by [`source_tree`].
pub const SOURCE: &str = "/src";
/// Destination root for in-memory builds.
pub const DESTINATION: &str = "/out";

// =========================================================================
// Fixture setup
// =========================================================================

/// In-memory storage with `files` (relative to [`SOURCE`]) at mode `0o644`.
pub fn source_tree(files: &[(&str, &str)]) -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.add_dir(SOURCE, 0o755);
    for (path, content) in files {
        storage.add_file(format!("{SOURCE}/{path}"), *content, 0o644);
    }
    storage
}

/// Build a metadata map from key/value pairs.
pub fn meta(pairs: &[(&str, MetaValue)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A synthesized record carrying `pairs` as metadata.
pub fn record_with_meta(content: &str, pairs: &[(&str, MetaValue)]) -> FileRecord {
    FileRecord::new(content).with_metadata(meta(pairs))
}

// =========================================================================
// Extractors
// =========================================================================

pub fn paths_of(files: &FileCollection) -> Vec<&str> {
    files.paths().collect()
}

/// Content of `path` as UTF-8. Panics if missing or not text.
pub fn text_of<'a>(files: &'a FileCollection, path: &str) -> &'a str {
    files
        .get(path)
        .unwrap_or_else(|| panic!("{path} not in collection: {:?}", paths_of(files)))
        .text()
        .unwrap_or_else(|| panic!("{path} is not UTF-8"))
}
