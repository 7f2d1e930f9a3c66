//! [`Storage`] over the real filesystem.
//!
//! Traversal uses `walkdir` with symlinks followed: a linked directory is
//! descended into and a linked file reads as its target. A dangling link or a
//! link cycle is reported as a walk error.

use super::backend::{Stat, Storage, Walk, WalkEntry, WalkError};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct OsStorage;

impl OsStorage {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

fn walk_error(err: walkdir::Error) -> WalkError {
    WalkError {
        path: err.path().map(Path::to_path_buf),
        source: io::Error::from(err),
    }
}

fn walk_entry(entry: walkdir::DirEntry) -> Result<WalkEntry, WalkError> {
    // With links followed this is the target's metadata.
    let metadata = entry.metadata().map_err(walk_error)?;

    Ok(WalkEntry {
        is_dir: metadata.is_dir(),
        mode: mode_of(&metadata),
        path: entry.into_path(),
    })
}

impl Storage for OsStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        // A previous build may have left a read-only file here.
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        fs::write(path, contents)?;
        self.set_mode(path, mode)
    }

    #[cfg(unix)]
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(mode).create(path)
    }

    #[cfg(not(unix))]
    fn create_dir_all(&self, path: &Path, _mode: u32) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn set_mode(&self, _path: &Path, _mode: u32) -> io::Result<()> {
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn stat(&self, path: &Path) -> io::Result<Stat> {
        let metadata = fs::metadata(path)?;
        Ok(Stat {
            is_dir: metadata.is_dir(),
            mode: mode_of(&metadata).unwrap_or(0o755),
        })
    }

    fn walk<'a>(&'a self, root: &Path, skip: &'a dyn Fn(&Path) -> bool) -> Walk<'a> {
        let iter = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(move |entry| !skip(entry.path()))
            .map(|result| result.map_err(walk_error).and_then(walk_entry));
        Box::new(iter)
    }
}
