//! In-memory [`Storage`] for tests and embedding.
//!
//! Entries live in a `BTreeMap` keyed by path, so a walk visits parents before
//! children and siblings in byte order. Uses `Mutex` (not `RefCell`) so the
//! storage is `Sync`.
//!
//! Failures can be injected per path with [`MemoryStorage::fail_read`],
//! [`MemoryStorage::fail_write`], [`MemoryStorage::fail_walk`] and
//! [`MemoryStorage::fail_remove`].

use super::backend::{Stat, Storage, Walk, WalkEntry, WalkError};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File { content: Vec<u8>, mode: u32 },
    Dir { mode: u32 },
}

#[derive(Debug, Default)]
struct Failures {
    read: BTreeSet<PathBuf>,
    write: BTreeSet<PathBuf>,
    walk: BTreeSet<PathBuf>,
    remove: BTreeSet<PathBuf>,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
    failures: Mutex<Failures>,
}

fn injected(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("injected failure at {}", path.display()),
    )
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn nodes(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Node>> {
        self.nodes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn failures(&self) -> MutexGuard<'_, Failures> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a file, creating parent directories (`0o755`) as needed.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>, mode: u32) {
        let path = path.as_ref();
        let mut nodes = self.nodes();
        if let Some(parent) = path.parent() {
            insert_dirs(&mut nodes, parent, 0o755);
        }
        nodes.insert(
            path.to_path_buf(),
            Node::File {
                content: content.into(),
                mode,
            },
        );
    }

    /// Add a directory (and parents).
    pub fn add_dir(&self, path: impl AsRef<Path>, mode: u32) {
        let path = path.as_ref();
        let mut nodes = self.nodes();
        insert_dirs(&mut nodes, path, 0o755);
        nodes.insert(path.to_path_buf(), Node::Dir { mode });
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.nodes().get(path.as_ref()) {
            Some(Node::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        match self.nodes().get(path.as_ref()) {
            Some(Node::File { mode, .. } | Node::Dir { mode }) => Some(*mode),
            None => None,
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.nodes().contains_key(path.as_ref())
    }

    /// Every file path under `root`, relative to it, slash-separated and sorted.
    pub fn files_under(&self, root: impl AsRef<Path>) -> Vec<String> {
        let root = root.as_ref();
        self.nodes()
            .iter()
            .filter(|(_, node)| matches!(node, Node::File { .. }))
            .filter_map(|(path, _)| path.strip_prefix(root).ok())
            .map(crate::paths::to_slash)
            .collect()
    }

    pub fn fail_read(&self, path: impl AsRef<Path>) {
        self.failures().read.insert(path.as_ref().to_path_buf());
    }

    pub fn fail_write(&self, path: impl AsRef<Path>) {
        self.failures().write.insert(path.as_ref().to_path_buf());
    }

    /// Make the walk yield an error when it reaches `path`.
    pub fn fail_walk(&self, path: impl AsRef<Path>) {
        self.failures().walk.insert(path.as_ref().to_path_buf());
    }

    pub fn fail_remove(&self, path: impl AsRef<Path>) {
        self.failures().remove.insert(path.as_ref().to_path_buf());
    }
}

fn insert_dirs(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path, mode: u32) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        nodes
            .entry(ancestor.to_path_buf())
            .or_insert(Node::Dir { mode });
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if self.failures().read.contains(path) {
            return Err(injected(path));
        }
        match self.nodes().get(path) {
            Some(Node::File { content, .. }) => Ok(content.clone()),
            Some(Node::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        if self.failures().write.contains(path) {
            return Err(injected(path));
        }
        let mut nodes = self.nodes();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            match nodes.get(parent) {
                Some(Node::Dir { .. }) => {}
                Some(Node::File { .. }) => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("{} is not a directory", parent.display()),
                    ));
                }
                None => return Err(not_found(parent)),
            }
        }
        if let Some(Node::Dir { .. }) = nodes.get(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        nodes.insert(
            path.to_path_buf(),
            Node::File {
                content: contents.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        if self.failures().write.contains(path) {
            return Err(injected(path));
        }
        let mut nodes = self.nodes();
        for ancestor in path.ancestors() {
            if let Some(Node::File { .. }) = nodes.get(ancestor) {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", ancestor.display()),
                ));
            }
        }
        insert_dirs(&mut nodes, path, mode);
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        match self.nodes().get_mut(path) {
            Some(Node::File { mode: m, .. } | Node::Dir { mode: m }) => {
                *m = mode;
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.failures().remove.contains(path) {
            return Err(injected(path));
        }
        let mut nodes = self.nodes();
        match nodes.get(path) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", path.display()),
                ));
            }
            None => return Err(not_found(path)),
        }
        nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn stat(&self, path: &Path) -> io::Result<Stat> {
        match self.nodes().get(path) {
            Some(Node::File { mode, .. }) => Ok(Stat {
                is_dir: false,
                mode: *mode,
            }),
            Some(Node::Dir { mode }) => Ok(Stat {
                is_dir: true,
                mode: *mode,
            }),
            None => Err(not_found(path)),
        }
    }

    fn walk<'a>(&'a self, root: &Path, skip: &'a dyn Fn(&Path) -> bool) -> Walk<'a> {
        let nodes = self.nodes();
        let failures = self.failures();

        if !nodes.contains_key(root) {
            let err = WalkError {
                path: Some(root.to_path_buf()),
                source: not_found(root),
            };
            return Box::new(std::iter::once(Err::<WalkEntry, WalkError>(err)));
        }

        let mut pruned: Vec<&Path> = Vec::new();
        let mut out = Vec::new();
        for (path, node) in nodes.range(root.to_path_buf()..) {
            if !path.starts_with(root) {
                continue;
            }
            if pruned.iter().any(|dir| path.starts_with(dir)) {
                continue;
            }
            if skip(path) {
                pruned.push(path);
                continue;
            }
            if failures.walk.contains(path) {
                out.push(Err(WalkError {
                    path: Some(path.clone()),
                    source: injected(path),
                }));
                continue;
            }
            let (is_dir, mode) = match node {
                Node::File { mode, .. } => (false, *mode),
                Node::Dir { mode } => (true, *mode),
            };
            out.push(Ok(WalkEntry {
                path: path.clone(),
                is_dir,
                mode: Some(mode),
            }));
        }
        Box::new(out.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_file_creates_parents() {
        let storage = MemoryStorage::new();
        storage.add_file("/src/a/b.txt", "x", 0o644);

        assert!(storage.stat(Path::new("/src/a")).unwrap().is_dir);
        assert_eq!(storage.file("/src/a/b.txt").unwrap(), b"x");
    }

    #[test]
    fn write_requires_existing_parent() {
        let storage = MemoryStorage::new();
        let err = storage
            .write(Path::new("/out/a.txt"), b"x", 0o644)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn walk_visits_root_then_children_in_order() {
        let storage = MemoryStorage::new();
        storage.add_file("/src/b.txt", "", 0o644);
        storage.add_file("/src/a/z.txt", "", 0o644);
        storage.add_file("/other/c.txt", "", 0o644);

        let paths: Vec<PathBuf> = storage
            .walk(Path::new("/src"), &|_| false)
            .map(|e| e.unwrap().path)
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/src"),
                PathBuf::from("/src/a"),
                PathBuf::from("/src/a/z.txt"),
                PathBuf::from("/src/b.txt"),
            ]
        );
    }

    #[test]
    fn walk_prunes_skipped_subtree() {
        let storage = MemoryStorage::new();
        storage.add_file("/src/skip/a.txt", "", 0o644);
        storage.add_file("/src/keep.txt", "", 0o644);

        let paths: Vec<PathBuf> = storage
            .walk(Path::new("/src"), &|p| p == Path::new("/src/skip"))
            .map(|e| e.unwrap().path)
            .collect();
        assert!(!paths.iter().any(|p| p.starts_with("/src/skip")));
        assert!(paths.contains(&PathBuf::from("/src/keep.txt")));
    }

    #[test]
    fn sibling_with_common_prefix_not_walked() {
        let storage = MemoryStorage::new();
        storage.add_file("/src/a.txt", "", 0o644);
        storage.add_file("/srcs/b.txt", "", 0o644);

        let count = storage.walk(Path::new("/src"), &|_| false).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn remove_dir_all_removes_subtree_only() {
        let storage = MemoryStorage::new();
        storage.add_file("/out/a/b.txt", "", 0o644);
        storage.add_file("/outside.txt", "", 0o644);

        storage.remove_dir_all(Path::new("/out")).unwrap();
        assert!(!storage.exists("/out"));
        assert!(!storage.exists("/out/a/b.txt"));
        assert!(storage.exists("/outside.txt"));
    }

    #[test]
    fn injected_failures() {
        let storage = MemoryStorage::new();
        storage.add_file("/src/a.txt", "", 0o644);
        storage.add_dir("/out", 0o755);
        storage.fail_read("/src/a.txt");
        storage.fail_write("/out/a.txt");
        storage.fail_walk("/src/a.txt");
        storage.fail_remove("/out");

        assert!(storage.read(Path::new("/src/a.txt")).is_err());
        assert!(storage.remove_dir_all(Path::new("/out")).is_err());
        assert!(storage.exists("/out"));
        assert!(storage.write(Path::new("/out/a.txt"), b"", 0o644).is_err());
        let errors = storage
            .walk(Path::new("/src"), &|_| false)
            .filter(Result::is_err)
            .count();
        assert_eq!(errors, 1);
    }
}
