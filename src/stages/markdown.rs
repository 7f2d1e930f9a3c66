//! Markdown rendering.
//!
//! Every `*.md` entry is rendered with `pulldown-cmark` (tables, footnotes,
//! strikethrough and task lists enabled) and moved to the same logical path
//! with an `.html` extension. Frontmatter carries over, plus a
//! [`RENDERED_FROM`] key holding the original path so that later stages (the
//! layout stage in particular) can tell rendered pages from hand-written HTML.
//!
//! The rendered entry is a new file, so it has no source permissions and is
//! written with the default mode.
//!
//! A page can opt out with `markdown: false`; it is then copied through
//! unchanged.

use super::ContentError;
use crate::collection::{FileCollection, FileRecord};
use crate::stage::{Stage, StageFailure};
use pulldown_cmark::{Options, Parser, html as md_html};
use tracing::{debug, warn};

/// Metadata key set on every rendered page.
pub const RENDERED_FROM: &str = "rendered_from";

#[derive(Debug, Clone, Copy)]
pub struct MarkdownStage {
    options: Options,
}

impl MarkdownStage {
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        }
    }
}

impl Default for MarkdownStage {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render(markdown: &str, options: Options) -> String {
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

fn html_path(md_path: &str) -> String {
    let stem = md_path.strip_suffix(".md").unwrap_or(md_path);
    format!("{stem}.html")
}

fn opted_out(record: &FileRecord) -> bool {
    record.meta("markdown").and_then(|v| v.as_bool()) == Some(false)
}

impl Stage for MarkdownStage {
    fn name(&self) -> &str {
        "markdown"
    }

    fn run(&mut self, files: &mut FileCollection) -> Result<(), StageFailure> {
        let sources: Vec<String> = files
            .iter()
            .filter(|(path, record)| path.ends_with(".md") && !opted_out(record))
            .map(|(path, _)| path.clone())
            .collect();

        for md_path in sources {
            let Some(record) = files.remove(&md_path) else {
                continue;
            };
            let text = record
                .text()
                .ok_or_else(|| ContentError::NotUtf8 {
                    path: md_path.clone(),
                })?;

            let mut rendered = FileRecord::new(render(text, self.options));
            rendered.metadata = record.metadata;
            rendered.set_meta(RENDERED_FROM, md_path.as_str());

            let target = html_path(&md_path);
            debug!(from = %md_path, to = %target, "rendered markdown");
            if files.insert(target.clone(), rendered).is_some() {
                warn!(path = %target, "rendered markdown replaced an existing file");
            }
        }
        Ok(())
    }
}
