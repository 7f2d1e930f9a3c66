//! # snapsite
//!
//! A static-content build pipeline. A tree of source files is read into
//! memory, passed through an ordered list of transform stages, and written to
//! a destination tree.
//!
//! # Architecture: Read → Stages → Write
//!
//! ```text
//! 1. Read    source/         →  FileCollection   (walk, frontmatter, logical paths)
//! 2. Stages  FileCollection  →  FileCollection   (each stage mutates in place)
//! 3. Write   FileCollection  →  destination/     (optional clean, permissions)
//! ```
//!
//! The collection maps *logical paths* (`css/site.css`, relative to both
//! roots) to [`FileRecord`]s: content bytes, optional YAML frontmatter
//! parsed into [`Metadata`], and the source file's permission bits.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | The controller: builder configuration, phase methods, `build()` |
//! | [`read`] | Phase 1: walks the source tree and fills the collection |
//! | [`stage`] | The `Stage` trait, `stage_fn`, and the ordered runner |
//! | [`write`] | Phase 3: cleans the destination and materializes the collection |
//! | [`collection`] | `FileCollection` and `FileRecord` |
//! | [`metadata`] | `MetaValue`, the closed type for frontmatter values |
//! | [`frontmatter`] | Splits a leading `---` YAML block from file content |
//! | [`paths`] | Lexical logical-path computation |
//! | [`storage`] | The filesystem trait with real and in-memory implementations |
//! | [`stages`] | Built-in stages: drafts, template, markdown, layout, minify |
//! | [`config`] | `snapsite.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Exclusive Borrow Per Stage
//!
//! A stage receives `&mut FileCollection` for the duration of its `run` and
//! nothing else. It cannot keep a handle to the collection, and stages can
//! never run concurrently against the same build. A pipeline's `build` takes
//! `&mut self` for the same reason.
//!
//! ## Storage Injected at Construction
//!
//! The reader and writer never call `std::fs`. A [`Pipeline`] is built over
//! a [`storage::Storage`] implementation, so the whole Read → Write cycle
//! runs against [`storage::MemoryStorage`] in tests, with failure injection
//! for every I/O path.
//!
//! ## Permissions Are Explicit
//!
//! Written files get their source permission bits, or `0o644` for files a
//! stage created. The mode is set after writing, so the process umask does
//! not affect the result.
//!
//! ## No Partial Builds
//!
//! Any read or stage failure stops the build before anything is written.
//! Write failures leave earlier files on disk; there is no rollback and the
//! clean step is not atomic.

pub mod collection;
pub mod config;
pub mod frontmatter;
pub mod metadata;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod read;
pub mod stage;
pub mod stages;
pub mod storage;
pub mod write;

pub use collection::{FileCollection, FileRecord};
pub use metadata::{MetaValue, Metadata};
pub use pipeline::{BuildError, BuildReport, Pipeline};
pub use read::IgnoreSet;
pub use stage::{Stage, StageError, StageFailure, stage_fn};
pub use write::WriteSummary;

#[cfg(test)]
pub(crate) mod test_helpers;
