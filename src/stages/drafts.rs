use crate::collection::FileCollection;
use crate::metadata::flag;
use crate::stage::{Stage, StageFailure};
use tracing::debug;

/// Removes files marked `draft: true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftsStage;

impl Stage for DraftsStage {
    fn name(&self) -> &str {
        "drafts"
    }

    fn run(&mut self, files: &mut FileCollection) -> Result<(), StageFailure> {
        files.retain(|path, record| {
            let draft = flag(record.metadata.as_ref(), "draft");
            if draft {
                debug!(path, "dropping draft");
            }
            !draft
        });
        Ok(())
    }
}
