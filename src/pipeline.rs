//! The build controller: Read → Stages → Write.
//!
//! ```text
//! source/ ──read──▶ FileCollection ──stage 1──▶ … ──stage N──▶ ──write──▶ destination/
//! ```
//!
//! A [`Pipeline`] owns its configuration, its registered stages, the storage
//! it performs I/O through, and the collection of the last read. Each phase
//! can be driven on its own ([`Pipeline::read`], [`Pipeline::run_stages`],
//! [`Pipeline::write`]) or all three in order with [`Pipeline::build`].
//!
//! ```no_run
//! use snapsite::{Pipeline, FileCollection, stage_fn};
//!
//! let mut pipeline = Pipeline::with_os_storage()
//!     .source("site")
//!     .destination("public")
//!     .clean(true)
//!     .ignore("site/.git");
//! pipeline.use_stage(stage_fn("noop", |_: &mut FileCollection| Ok(())));
//!
//! let report = pipeline.build()?;
//! println!("{} files written", report.write.files);
//! # Ok::<(), snapsite::BuildError>(())
//! ```
//!
//! `build` takes `&mut self`, so one pipeline cannot run two builds at once.
//! Parallel builds need separate pipelines.

use crate::collection::FileCollection;
use crate::read::{self, IgnoreSet, ReadError};
use crate::stage::{self, Stage, StageError};
use crate::storage::{OsStorage, Storage};
use crate::write::{self, WriteError, WriteSummary};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed at read step")]
    Read(#[source] ReadError),
    #[error("failed during plugin run")]
    Stages(#[source] StageError),
    #[error("failed writing files")]
    Write(#[source] WriteError),
}

/// Counts from a completed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub files_read: usize,
    pub stages_run: usize,
    pub write: WriteSummary,
}

pub struct Pipeline<S: Storage = OsStorage> {
    source: PathBuf,
    destination: PathBuf,
    clean: bool,
    ignore: IgnoreSet,
    stages: Vec<Box<dyn Stage>>,
    files: FileCollection,
    storage: S,
}

impl Pipeline<OsStorage> {
    pub fn with_os_storage() -> Self {
        Self::new(OsStorage)
    }
}

impl<S: Storage> Pipeline<S> {
    pub fn new(storage: S) -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            clean: false,
            ignore: IgnoreSet::new(),
            stages: Vec::new(),
            files: FileCollection::new(),
            storage,
        }
    }

    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = path.into();
        self
    }

    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = path.into();
        self
    }

    /// Empty the destination before writing.
    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Skip `path` while reading. Compared against walked paths, so it should
    /// include the source root (e.g. `site/.git`).
    pub fn ignore(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignore.insert(path);
        self
    }

    pub fn ignore_all<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ignore.extend(paths);
        self
    }

    /// Append a stage. Stages run in the order they were added.
    pub fn use_stage(&mut self, stage: impl Stage + 'static) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append an already boxed stage.
    pub fn use_boxed_stage(&mut self, stage: Box<dyn Stage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Replace the collection with a fresh read of the source tree.
    pub fn read(&mut self) -> Result<usize, ReadError> {
        self.files.clear();
        info!(source = %self.source.display(), "reading source");
        self.files = read::read_source(&self.storage, &self.source, &self.ignore)?;
        info!(files = self.files.len(), "read complete");
        Ok(self.files.len())
    }

    pub fn run_stages(&mut self) -> Result<usize, StageError> {
        stage::run_stages(&mut self.files, &mut self.stages)
    }

    pub fn write(&self) -> Result<WriteSummary, WriteError> {
        info!(destination = %self.destination.display(), clean = self.clean, "writing files");
        let summary =
            write::write_collection(&self.storage, &self.files, &self.destination, self.clean)?;
        info!(files = summary.files, bytes = summary.bytes, "write complete");
        Ok(summary)
    }

    /// Read, run every stage, then write. Nothing is written if reading or
    /// any stage fails.
    pub fn build(&mut self) -> Result<BuildReport, BuildError> {
        let files_read = self.read().map_err(BuildError::Read)?;
        let stages_run = self.run_stages().map_err(BuildError::Stages)?;
        let write = self.write().map_err(BuildError::Write)?;
        Ok(BuildReport {
            files_read,
            stages_run,
            write,
        })
    }

    pub fn files(&self) -> &FileCollection {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut FileCollection {
        &mut self.files
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn source_dir(&self) -> &Path {
        &self.source
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name())
    }
}

impl<S: Storage> fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("clean", &self.clean)
            .field("ignore", &self.ignore)
            .field("stages", &self.stages)
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}
