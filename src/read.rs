//! Source tree ingestion.
//!
//! Phase 1 of a build. Walks the source root and turns every regular file
//! into a [`FileRecord`] keyed by its logical path:
//!
//! ```text
//! source/                      collection
//! ├── index.html          →    "index.html"
//! ├── about.md            →    "about.md"        (frontmatter → metadata)
//! └── css/
//!     └── site.css        →    "css/site.css"
//! ```
//!
//! ## Ignoring
//!
//! The [`IgnoreSet`] is checked once per visited entry against the walked
//! path (the source root joined with the entry's relative path). An ignored
//! file is not read; an ignored directory is not descended into.
//!
//! ## Failure
//!
//! Any traversal error, unreadable file, or bad frontmatter aborts the whole
//! read. There is no partial result.
//!
//! ## Logical paths
//!
//! The part of a walked path below the root must be valid UTF-8, since
//! logical paths are strings. A file or directory name that is not is a read
//! error naming the path; it is never converted lossily.
//!
//! Distinct walked paths give distinct logical paths. Should a storage yield
//! the same logical path twice, the later one wins and a warning names both.

use crate::collection::{FileCollection, FileRecord};
use crate::frontmatter::{self, FrontmatterError};
use crate::paths;
use crate::storage::Storage;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("no source directory set")]
    MissingSource,
    #[error("filesystem walk error at {}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not read file {}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file name is not valid UTF-8: {}", .path.display())]
    NonUtf8Path { path: PathBuf },
    #[error("could not read frontmatter in {}", .path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },
}

/// Paths excluded from a read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    paths: HashSet<PathBuf>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        self.paths.insert(path.into());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<P: Into<PathBuf>> Extend<P> for IgnoreSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.paths.extend(iter.into_iter().map(Into::into));
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut set = IgnoreSet::new();
        set.extend(iter);
        set
    }
}

/// Read the tree under `root` into a fresh collection.
pub fn read_source(
    storage: &impl Storage,
    root: &Path,
    ignore: &IgnoreSet,
) -> Result<FileCollection, ReadError> {
    if root.as_os_str().is_empty() {
        return Err(ReadError::MissingSource);
    }

    let skip = |path: &Path| ignore.contains(path);

    let mut files = FileCollection::new();
    let mut origins: HashMap<String, PathBuf> = HashMap::new();

    for entry in storage.walk(root, &skip) {
        let entry = entry.map_err(|err| ReadError::Walk {
            path: err.path.unwrap_or_else(|| root.to_path_buf()),
            source: err.source,
        })?;
        if entry.is_dir {
            continue;
        }

        let logical = logical_path(&entry.path, root)?;
        debug!(path = %logical, "reading file");

        let record = read_file(storage, &entry.path, entry.mode)?;

        if let Some(previous) = origins.insert(logical.clone(), entry.path.clone()) {
            warn!(
                logical_path = %logical,
                first = %previous.display(),
                second = %entry.path.display(),
                "two source files map to the same logical path; keeping the second"
            );
        }
        files.insert(logical, record);
    }

    Ok(files)
}

/// Load one file and split off its frontmatter.
pub fn read_file(
    storage: &impl Storage,
    path: &Path,
    mode: Option<u32>,
) -> Result<FileRecord, ReadError> {
    let data = storage.read(path).map_err(|source| ReadError::File {
        path: path.to_path_buf(),
        source,
    })?;

    let extracted = frontmatter::extract(&data).map_err(|source| ReadError::Frontmatter {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(FileRecord::from_source(
        extracted.content.to_vec(),
        extracted.metadata,
        mode,
    ))
}

fn logical_path(path: &Path, root: &Path) -> Result<String, ReadError> {
    let non_utf8 = || ReadError::NonUtf8Path {
        path: path.to_path_buf(),
    };

    let relative = path.strip_prefix(root).unwrap_or(path);
    if relative.as_os_str().is_empty() {
        // The root itself is a file.
        return path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(non_utf8);
    }

    let relative = relative.to_str().ok_or_else(non_utf8)?;
    Ok(paths::normalize(&paths::to_slash(Path::new(relative)), ""))
}
