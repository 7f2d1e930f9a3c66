//! Site configuration.
//!
//! Loaded from `snapsite.toml` in the working directory (or the path given
//! with `--config`). The file is optional; every key has a default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source = "source"          # Tree to read
//! destination = "public"     # Tree to write
//! clean = false              # Empty the destination before writing
//! ignore = []                # Paths to skip, relative to `source`
//! stages = ["drafts", "template", "markdown", "layout", "minify"]
//!
//! [layout]
//! site_title = ""            # Appended to page titles when set
//! stylesheet = ""            # href of a <link rel="stylesheet"> when set
//! ```
//!
//! Unknown keys are rejected to catch typos early. Command-line flags
//! override the file.

use crate::pipeline::Pipeline;
use crate::stages::{self, BUILTIN_STAGES};
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "snapsite.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `snapsite.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory to read.
    pub source: PathBuf,
    /// Directory to write.
    pub destination: PathBuf,
    /// Remove everything in `destination` before writing.
    pub clean: bool,
    /// Paths under `source` that are not read. A directory skips its subtree.
    pub ignore: Vec<PathBuf>,
    /// Built-in stages to run, in order.
    pub stages: Vec<String>,
    pub layout: LayoutConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("source"),
            destination: PathBuf::from("public"),
            clean: false,
            ignore: Vec::new(),
            stages: BUILTIN_STAGES.iter().map(|s| s.to_string()).collect(),
            layout: LayoutConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub site_title: String,
    pub stylesheet: String,
}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.as_os_str().is_empty() {
            return Err(ConfigError::Validation("source must not be empty".into()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "destination must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for name in &self.stages {
            if !BUILTIN_STAGES.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "unknown stage `{name}` (expected one of: {})",
                    BUILTIN_STAGES.join(", ")
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "stage `{name}` listed more than once"
                )));
            }
        }
        Ok(())
    }

    /// Ignore entries as walked paths (joined onto `source`).
    pub fn ignore_paths(&self) -> Vec<PathBuf> {
        self.ignore.iter().map(|p| self.source.join(p)).collect()
    }

    /// A pipeline over `storage` with this config's paths and stages.
    pub fn pipeline<S: Storage>(&self, storage: S) -> Result<Pipeline<S>, ConfigError> {
        self.validate()?;
        let mut pipeline = Pipeline::new(storage)
            .source(&self.source)
            .destination(&self.destination)
            .clean(self.clean)
            .ignore_all(self.ignore_paths());
        for name in &self.stages {
            let stage = stages::builtin(name, self)
                .ok_or_else(|| ConfigError::Validation(format!("unknown stage `{name}`")))?;
            pipeline.use_boxed_stage(stage);
        }
        Ok(pipeline)
    }
}

/// Load and validate config from `path`. A missing file gives the defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let config = match fs::read_to_string(path) {
        Ok(content) => parse_config(&content)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => SiteConfig::default(),
        Err(err) => return Err(err.into()),
    };
    config.validate()?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<SiteConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Returns a fully-commented stock `snapsite.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# snapsite configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory to read.
source = "source"

# Directory to write. Created as needed.
destination = "public"

# Remove everything in the destination before writing. The destination
# must already exist when this is on.
clean = false

# Paths to skip while reading, relative to `source`.
# A directory skips everything under it.
# ignore = [".git", "drafts/notes.txt"]
ignore = []

# Built-in stages to run, in order. Available:
#   drafts    drop files whose frontmatter sets `draft: true`
#   template  expand files whose frontmatter sets `template: true`,
#             with the frontmatter as template variables
#   markdown  render *.md to *.html (opt out per file with `markdown: false`)
#   layout    wrap rendered pages in a full HTML document
#   minify    minify *.css (skip a file by setting `minify: false`)
stages = ["drafts", "template", "markdown", "layout", "minify"]

# ---------------------------------------------------------------------------
# Page layout
# ---------------------------------------------------------------------------
[layout]
# Appended to every page title as "Page · Site". Empty to disable.
site_title = ""

# href of a stylesheet linked from every laid-out page. Empty to disable.
stylesheet = ""
"##
}
