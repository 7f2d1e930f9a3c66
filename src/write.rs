//! Destination tree materialization.
//!
//! Phase 3 of a build. Each logical path is joined onto the destination
//! root, parent directories are created, and the content is written with an
//! explicit mode:
//!
//! | record                         | file mode            |
//! |--------------------------------|----------------------|
//! | read from source               | source permission bits |
//! | created by a stage             | [`DEFAULT_FILE_MODE`] |
//!
//! The mode is set after the bytes are written, so the result does not
//! depend on the process umask or on whatever file was there before.
//!
//! ## Cleaning
//!
//! With `clean` set, the destination root must already exist and be a
//! directory. Its mode is
//! recorded, the tree is removed, and an empty directory with the same mode
//! is recreated. This is not atomic: a failure between removal and
//! recreation leaves no destination at all.
//!
//! A failed write leaves earlier files on disk. There is no rollback.

use crate::collection::FileCollection;
use crate::paths;
use crate::storage::Storage;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_FILE_MODE: u32 = 0o644;
pub const DIR_MODE: u32 = 0o755;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("no destination directory set")]
    MissingDestination,
    #[error("cannot clean {}: it does not exist", .path.display())]
    CleanNotFound { path: PathBuf },
    #[error("could not clean {}", .path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("logical path {logical_path:?} escapes the destination")]
    Escapes { logical_path: String },
    #[error("could not create directory for {logical_path}")]
    CreateDir {
        logical_path: String,
        #[source]
        source: io::Error,
    },
    #[error("could not write {logical_path}")]
    Write {
        logical_path: String,
        #[source]
        source: io::Error,
    },
}

/// What a write did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub files: usize,
    pub bytes: usize,
    pub cleaned: bool,
}

/// Empty `root`, keeping its permission bits.
pub fn clean_destination(storage: &impl Storage, root: &Path) -> Result<(), WriteError> {
    let clean_err = |source: io::Error| WriteError::Clean {
        path: root.to_path_buf(),
        source,
    };

    let stat = match storage.stat(root) {
        Ok(stat) => stat,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(WriteError::CleanNotFound {
                path: root.to_path_buf(),
            });
        }
        Err(err) => return Err(clean_err(err)),
    };
    if !stat.is_dir {
        return Err(clean_err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("{} is not a directory", root.display()),
        )));
    }

    info!(path = %root.display(), "cleaning destination");
    storage.remove_dir_all(root).map_err(clean_err)?;
    storage
        .create_dir_all(root, stat.mode)
        .map_err(clean_err)?;
    storage.set_mode(root, stat.mode).map_err(clean_err)?;
    Ok(())
}

/// Write every record in `files` under `root`.
pub fn write_collection(
    storage: &impl Storage,
    files: &FileCollection,
    root: &Path,
    clean: bool,
) -> Result<WriteSummary, WriteError> {
    if root.as_os_str().is_empty() {
        return Err(WriteError::MissingDestination);
    }

    let mut summary = WriteSummary {
        cleaned: clean,
        ..WriteSummary::default()
    };

    if clean {
        clean_destination(storage, root)?;
    }

    for (logical, record) in files {
        if !paths::is_contained(logical) {
            return Err(WriteError::Escapes {
                logical_path: logical.clone(),
            });
        }

        let target = root.join(logical);
        if let Some(parent) = target.parent() {
            storage
                .create_dir_all(parent, DIR_MODE)
                .map_err(|source| WriteError::CreateDir {
                    logical_path: logical.clone(),
                    source,
                })?;
        }

        let mode = record.source_permissions().unwrap_or(DEFAULT_FILE_MODE);
        debug!(path = %logical, mode = %format!("{mode:o}"), "writing file");
        storage
            .write(&target, &record.content, mode)
            .map_err(|source| WriteError::Write {
                logical_path: logical.clone(),
                source,
            })?;

        summary.files += 1;
        summary.bytes += record.content.len();
    }

    Ok(summary)
}
