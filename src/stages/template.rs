//! Template expansion.
//!
//! An entry whose frontmatter sets `template: true` is treated as a
//! `minijinja` template. It is rendered with its own frontmatter as the
//! context, so `title: Home` is available as `{{ title }}`, and the output
//! replaces the content. Nothing is escaped. Missing keys render as empty.
//!
//! ```text
//! ---
//! template: true
//! title: Home
//! ---
//! <h1>{{ title }}</h1>        →    <h1>Home</h1>
//! ```
//!
//! Entries without the flag are left alone.

use super::ContentError;
use crate::collection::FileCollection;
use crate::metadata::{Metadata, flag};
use crate::stage::{Stage, StageFailure};
use minijinja::Environment;
use tracing::debug;

#[derive(Debug, Default)]
pub struct TemplateStage {
    env: Environment<'static>,
}

impl TemplateStage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Stage for TemplateStage {
    fn name(&self) -> &str {
        "template"
    }

    fn run(&mut self, files: &mut FileCollection) -> Result<(), StageFailure> {
        let empty = Metadata::new();
        for (path, record) in files.iter_mut() {
            if !flag(record.metadata.as_ref(), "template") {
                continue;
            }
            let text = record.text().ok_or_else(|| ContentError::NotUtf8 {
                path: path.clone(),
            })?;
            let context = record.metadata.as_ref().unwrap_or(&empty);
            let rendered = self
                .env
                .render_str(text, context)
                .map_err(|source| ContentError::Template {
                    path: path.clone(),
                    source,
                })?;

            debug!(path = %path, "rendered template");
            record.content = rendered.into_bytes();
        }
        Ok(())
    }
}
