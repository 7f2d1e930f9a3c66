//! The in-memory file collection that flows Read → Stages → Write.
//!
//! Keys are *logical paths*: forward-slash separated, relative to the source
//! (and destination) root, never starting with `/`. The collection is a
//! `BTreeMap`, so iteration is ordered by logical path and every write or
//! listing is deterministic.

use crate::metadata::{MetaValue, Metadata};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// One file in the collection.
///
/// `content` and `metadata` are public and stage-mutable. The permission bits
/// captured at read time are private: a stage can read them but never change
/// them, and records it creates through [`FileRecord::new`] carry none.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub content: Vec<u8>,
    pub metadata: Option<Metadata>,
    source_permissions: Option<u32>,
}

impl FileRecord {
    /// A synthesized record: no metadata, no source permissions.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
            source_permissions: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn from_source(
        content: Vec<u8>,
        metadata: Option<Metadata>,
        source_permissions: Option<u32>,
    ) -> Self {
        Self {
            content,
            metadata,
            source_permissions,
        }
    }

    /// Mode bits of the walked source file, if this record came from one.
    pub fn source_permissions(&self) -> Option<u32> {
        self.source_permissions
    }

    /// Metadata value for `key`, if the record has metadata and the key is set.
    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    /// Insert a metadata value, creating the mapping if the record had none.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
    }

    /// Content as UTF-8, if it is valid.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Mapping from logical path to [`FileRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCollection {
    files: BTreeMap<String, FileRecord>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record at `path`, returning the previous one.
    pub fn insert(&mut self, path: impl Into<String>, record: FileRecord) -> Option<FileRecord> {
        self.files.insert(path.into(), record)
    }

    pub fn remove(&mut self, path: &str) -> Option<FileRecord> {
        self.files.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut FileRecord> {
        self.files.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FileRecord> {
        self.files.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, FileRecord> {
        self.files.iter_mut()
    }

    /// Keep only the records for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut FileRecord) -> bool) {
        self.files.retain(|path, record| keep(path, record));
    }

    /// Total content size in bytes.
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(|r| r.content.len()).sum()
    }
}

impl<'a> IntoIterator for &'a FileCollection {
    type Item = (&'a String, &'a FileRecord);
    type IntoIter = btree_map::Iter<'a, String, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

impl<'a> IntoIterator for &'a mut FileCollection {
    type Item = (&'a String, &'a mut FileRecord);
    type IntoIter = btree_map::IterMut<'a, String, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter_mut()
    }
}

impl<K: Into<String>> FromIterator<(K, FileRecord)> for FileCollection {
    fn from_iter<I: IntoIterator<Item = (K, FileRecord)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
