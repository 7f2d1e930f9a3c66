//! Stages shipped with the binary.
//!
//! | Name       | Effect |
//! |------------|--------|
//! | `drafts`   | Drops every file whose frontmatter sets `draft: true` |
//! | `template` | Expands files with `template: true`, frontmatter as context |
//! | `markdown` | Renders `*.md` to `*.html` (opt out with `markdown: false`) |
//! | `layout`   | Wraps rendered pages in a full HTML document |
//! | `minify`   | Minifies `*.css` unless `minify` is set to anything but `true` |
//!
//! They implement [`Stage`] like any user stage and get no special treatment
//! from the pipeline. [`builtin`] maps configured names to instances.

mod drafts;
mod layout;
mod markdown;
mod minify;
mod template;

pub use drafts::DraftsStage;
pub use layout::LayoutStage;
pub use markdown::{MarkdownStage, RENDERED_FROM};
pub use minify::MinifyStage;
pub use template::TemplateStage;

use crate::config::SiteConfig;
use crate::stage::Stage;
use thiserror::Error;

/// Names accepted in the `stages` config list, in their usual order.
pub const BUILTIN_STAGES: &[&str] = &["drafts", "template", "markdown", "layout", "minify"];

/// Failure inside a built-in stage.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: String },
    #[error("could not render template in {path}")]
    Template {
        path: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("could not minify {path}: {message}")]
    Minify { path: String, message: String },
}

/// Instantiate the built-in stage called `name`.
pub fn builtin(name: &str, config: &SiteConfig) -> Option<Box<dyn Stage>> {
    match name {
        "drafts" => Some(Box::new(DraftsStage)),
        "template" => Some(Box::new(TemplateStage::new())),
        "markdown" => Some(Box::new(MarkdownStage::new())),
        "layout" => Some(Box::new(LayoutStage::from_config(&config.layout))),
        "minify" => Some(Box::new(MinifyStage)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn every_listed_builtin_resolves() {
        let config = SiteConfig::default();
        for name in BUILTIN_STAGES {
            let stage = builtin(name, &config).unwrap();
            assert_eq!(stage.name(), *name);
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(builtin("sitemap", &SiteConfig::default()).is_none());
    }

    #[test]
    fn default_stages_build_a_site() {
        let storage = source_tree(&[
            ("index.md", "---\ntitle: Home\ntemplate: true\n---\n# Welcome to {{ title }}"),
            ("wip.md", "---\ndraft: true\n---\nnot yet"),
            ("raw.html", "<p>as is</p>"),
            ("css/site.css", "body {\n  margin: 0;\n}\n"),
        ]);
        let config = SiteConfig {
            source: SOURCE.into(),
            destination: DESTINATION.into(),
            layout: crate::config::LayoutConfig {
                site_title: "Demo".into(),
                stylesheet: "/css/site.css".into(),
            },
            ..SiteConfig::default()
        };

        let mut pipeline = config.pipeline(&storage).unwrap();
        let report = pipeline.build().unwrap();

        assert_eq!(report.files_read, 4);
        assert_eq!(report.stages_run, 5);
        assert_eq!(
            paths_of(pipeline.files()),
            vec!["css/site.css", "index.html", "raw.html"]
        );

        let index = text_of(pipeline.files(), "index.html");
        assert!(index.contains("<title>Home · Demo</title>"));
        assert!(index.contains("<h1>Welcome to Home</h1>"));
        let css = text_of(pipeline.files(), "css/site.css");
        assert!(css.starts_with("body{margin:0"), "{css}");
        assert!(!css.contains('\n'));
        assert_eq!(storage.file("/out/raw.html").unwrap(), b"<p>as is</p>");
        assert_eq!(storage.mode("/out/index.html"), Some(0o644));
    }
}
