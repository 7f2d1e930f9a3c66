//! Page layout.
//!
//! Wraps an HTML fragment in a complete document:
//!
//! ```html
//! <!DOCTYPE html>
//! <html lang="en">
//!   <head>
//!     <meta charset="UTF-8">
//!     <meta name="viewport" ...>
//!     <title>Page · Site</title>
//!     <link rel="stylesheet" href="...">   <!-- when configured -->
//!   </head>
//!   <body><main>…fragment…</main></body>
//! </html>
//! ```
//!
//! An `.html` entry is laid out when its metadata has `layout: true`, or when
//! the markdown stage produced it and it does not set `layout: false`.
//! Hand-written HTML without frontmatter passes through untouched.

use super::ContentError;
use super::markdown::RENDERED_FROM;
use crate::collection::{FileCollection, FileRecord};
use crate::config::LayoutConfig;
use crate::stage::{Stage, StageFailure};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct LayoutStage {
    site_title: Option<String>,
    stylesheet: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl LayoutStage {
    pub fn new(site_title: Option<String>, stylesheet: Option<String>) -> Self {
        Self {
            site_title,
            stylesheet,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(non_empty(&config.site_title), non_empty(&config.stylesheet))
    }

    fn page_title(&self, path: &str, record: &FileRecord) -> String {
        let page = record
            .meta("title")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(path).to_string());
        match &self.site_title {
            Some(site) => format!("{page} · {site}"),
            None => page,
        }
    }

    fn document(&self, title: &str, body: &str) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (title) }
                    @if let Some(href) = &self.stylesheet {
                        link rel="stylesheet" href=(href);
                    }
                }
                body {
                    main {
                        (PreEscaped(body))
                    }
                }
            }
        }
    }
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

fn wants_layout(path: &str, record: &FileRecord) -> bool {
    if !path.ends_with(".html") {
        return false;
    }
    match record.meta("layout").and_then(|v| v.as_bool()) {
        Some(explicit) => explicit,
        None => record.meta(RENDERED_FROM).is_some(),
    }
}

impl Stage for LayoutStage {
    fn name(&self) -> &str {
        "layout"
    }

    fn run(&mut self, files: &mut FileCollection) -> Result<(), StageFailure> {
        for (path, record) in files.iter_mut() {
            if !wants_layout(path, record) {
                continue;
            }
            let body = record.text().ok_or_else(|| ContentError::NotUtf8 {
                path: path.clone(),
            })?;
            let title = self.page_title(path, record);
            let document = self.document(&title, body).into_string();

            debug!(path = %path, title = %title, "applied layout");
            record.content = document.into_bytes();
        }
        Ok(())
    }
}
