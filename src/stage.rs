//! Transform stages and the runner that applies them.
//!
//! A stage receives the whole collection by exclusive reference and may
//! rewrite content, edit metadata, add entries, or remove them. Stages run in
//! registration order and the first failure stops the run.
//!
//! Closures become stages through [`stage_fn`], which takes the name
//! explicitly:
//!
//! ```
//! use snapsite::{FileCollection, stage_fn};
//!
//! let stamp = stage_fn("stamp", |files: &mut FileCollection| {
//!     for (_, record) in files.iter_mut() {
//!         record.content.extend_from_slice(b"\n<!-- built -->");
//!     }
//!     Ok(())
//! });
//! # let _ = stamp;
//! ```

use crate::collection::FileCollection;
use std::error::Error;
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Error type returned by a stage.
pub type StageFailure = Box<dyn Error + Send + Sync>;

pub trait Stage {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    fn run(&mut self, files: &mut FileCollection) -> Result<(), StageFailure>;
}

impl fmt::Debug for dyn Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Stage").field(&self.name()).finish()
    }
}

/// A closure with a name.
pub struct FnStage<F> {
    name: String,
    run: F,
}

impl<F> Stage for FnStage<F>
where
    F: FnMut(&mut FileCollection) -> Result<(), StageFailure>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, files: &mut FileCollection) -> Result<(), StageFailure> {
        (self.run)(files)
    }
}

pub fn stage_fn<F>(name: impl Into<String>, run: F) -> FnStage<F>
where
    F: FnMut(&mut FileCollection) -> Result<(), StageFailure>,
{
    FnStage {
        name: name.into(),
        run,
    }
}

#[derive(Error, Debug)]
#[error("stage `{stage}` failed")]
pub struct StageError {
    pub stage: String,
    /// Position in the registration order.
    pub index: usize,
    #[source]
    pub source: StageFailure,
}

/// Run `stages` over `files` in order. Returns how many ran.
pub fn run_stages(
    files: &mut FileCollection,
    stages: &mut [Box<dyn Stage>],
) -> Result<usize, StageError> {
    for (index, stage) in stages.iter_mut().enumerate() {
        let name = stage.name().to_string();
        info!(stage = %name, files = files.len(), "running stage");
        let started = Instant::now();

        stage.run(files).map_err(|source| StageError {
            stage: name.clone(),
            index,
            source,
        })?;

        debug!(stage = %name, elapsed = ?started.elapsed(), "stage finished");
    }
    Ok(stages.len())
}
