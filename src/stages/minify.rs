//! CSS minification with the `minifier` crate.
//!
//! Every `*.css` entry is minified when its frontmatter has no `minify` key
//! or sets it to boolean `true`. Any other value, `minify: false` included,
//! leaves the file as is.

use super::ContentError;
use crate::collection::{FileCollection, FileRecord};
use crate::metadata::MetaValue;
use crate::stage::{Stage, StageFailure};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyStage;

fn wants_minify(path: &str, record: &FileRecord) -> bool {
    path.ends_with(".css")
        && matches!(record.meta("minify"), None | Some(MetaValue::Bool(true)))
}

impl Stage for MinifyStage {
    fn name(&self) -> &str {
        "minify"
    }

    fn run(&mut self, files: &mut FileCollection) -> Result<(), StageFailure> {
        for (path, record) in files.iter_mut() {
            if !wants_minify(path, record) {
                continue;
            }
            let text = record.text().ok_or_else(|| ContentError::NotUtf8 {
                path: path.clone(),
            })?;
            let minified = minifier::css::minify(text)
                .map_err(|message| ContentError::Minify {
                    path: path.clone(),
                    message: message.to_string(),
                })?
                .to_string();

            debug!(path = %path, before = text.len(), after = minified.len(), "minified");
            record.content = minified.into_bytes();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    const CSS: &str = "/* site */\nbody {\n    color : red ;\n}\n\na  { margin: 0 }\n";

    #[test]
    fn css_gets_smaller_and_keeps_rules() {
        let mut files = FileCollection::new();
        files.insert("css/site.css", FileRecord::new(CSS));

        MinifyStage.run(&mut files).unwrap();

        let out = text_of(&files, "css/site.css");
        assert!(out.len() < CSS.len());
        assert!(!out.contains("/* site */"));
        assert!(!out.contains('\n'));
        assert!(out.contains("body{"));
        assert!(out.contains("color:red"));
    }

    #[test]
    fn only_missing_or_true_minifies() {
        let mut files = FileCollection::new();
        files.insert("off.css", record_with_meta(CSS, &[("minify", false.into())]));
        files.insert("on.css", record_with_meta(CSS, &[("minify", true.into())]));
        files.insert("quoted.css", record_with_meta(CSS, &[("minify", "true".into())]));
        files.insert("other.css", record_with_meta(CSS, &[("title", "x".into())]));

        MinifyStage.run(&mut files).unwrap();

        assert_eq!(text_of(&files, "off.css"), CSS);
        assert_eq!(text_of(&files, "quoted.css"), CSS);
        assert_ne!(text_of(&files, "on.css"), CSS);
        assert_ne!(text_of(&files, "other.css"), CSS);
    }

    #[test]
    fn other_extensions_untouched() {
        let mut files = FileCollection::new();
        files.insert("page.html", FileRecord::new("<p>  spaced  </p>\n"));
        files.insert("site.scss", FileRecord::new(CSS));

        MinifyStage.run(&mut files).unwrap();

        assert_eq!(text_of(&files, "page.html"), "<p>  spaced  </p>\n");
        assert_eq!(text_of(&files, "site.scss"), CSS);
    }

    #[test]
    fn keeps_source_permissions() {
        let mut files = FileCollection::new();
        files.insert(
            "a.css",
            FileRecord::from_source(b"a { color: red; }".to_vec(), None, Some(0o640)),
        );

        MinifyStage.run(&mut files).unwrap();
        assert_eq!(files.get("a.css").unwrap().source_permissions(), Some(0o640));
    }

    #[test]
    fn invalid_utf8_fails_with_path() {
        let mut files = FileCollection::new();
        files.insert("bin.css", FileRecord::new(vec![0xff, 0xfe]));

        let err = MinifyStage.run(&mut files).unwrap_err();
        assert_eq!(err.to_string(), "bin.css is not valid UTF-8");
    }
}
