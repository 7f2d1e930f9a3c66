//! The filesystem capability used by the reader and writer.
//!
//! The pipeline never calls `std::fs` directly. Everything goes through
//! [`Storage`], which is handed to [`Pipeline`](crate::Pipeline) at
//! construction. The production implementation is
//! [`OsStorage`](super::OsStorage); [`MemoryStorage`](super::MemoryStorage)
//! is an in-memory double with failure injection for tests.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A traversal failure. `path` is the entry being visited when known.
#[derive(Error, Debug)]
#[error("walk failed at {}", display_path(.path))]
pub struct WalkError {
    pub path: Option<PathBuf>,
    #[source]
    pub source: io::Error,
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<unknown>".to_string(),
    }
}

/// One entry produced by [`Storage::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    /// Permission bits (`0o7777` mask) where the platform has them.
    pub mode: Option<u32>,
}

/// Result of [`Storage::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub is_dir: bool,
    pub mode: u32,
}

pub type Walk<'a> = Box<dyn Iterator<Item = Result<WalkEntry, WalkError>> + 'a>;

/// Filesystem operations needed by a build.
pub trait Storage {
    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate `path`, write `contents`, and set its mode to `mode`.
    /// The mode is applied after writing, so it holds even for existing files.
    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()>;

    /// Create `path` and any missing parents. New directories get `mode`,
    /// subject to the platform's umask.
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Set the permission bits of an existing entry, ignoring the umask.
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Remove a directory and everything under it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn stat(&self, path: &Path) -> io::Result<Stat>;

    /// Depth-first traversal of `root`, root included. Entries for which
    /// `skip` returns `true` are not yielded, and skipped directories are not
    /// descended into.
    fn walk<'a>(&'a self, root: &Path, skip: &'a dyn Fn(&Path) -> bool) -> Walk<'a>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        (**self).write(path, contents, mode)
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        (**self).create_dir_all(path, mode)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        (**self).set_mode(path, mode)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir_all(path)
    }

    fn stat(&self, path: &Path) -> io::Result<Stat> {
        (**self).stat(path)
    }

    fn walk<'a>(&'a self, root: &Path, skip: &'a dyn Fn(&Path) -> bool) -> Walk<'a> {
        (**self).walk(root, skip)
    }
}
