//! Frontmatter extraction.
//!
//! A source file may begin with a YAML block fenced by lines containing
//! exactly `---`:
//!
//! ```text
//! ---
//! title: About
//! tags: [intro]
//! ---
//! The body starts here.
//! ```
//!
//! The fences must use `\n` line endings. The opening fence must be the very
//! first bytes of the file; the closing fence is the first `\n---\n` after it.
//! A file whose only closing `---` is on its last line (no trailing newline)
//! is malformed.

use crate::metadata::{self, ConversionError, Metadata};
use thiserror::Error;

const OPENING: &[u8] = b"---\n";
const CLOSING: &[u8] = b"\n---\n";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error(
        "malformed frontmatter: a file that starts with `---` must close the block with a line containing only `---`"
    )]
    Unterminated,
    #[error("could not parse frontmatter YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid frontmatter")]
    Shape(#[from] ConversionError),
}

/// Content with its frontmatter removed.
#[derive(Debug, PartialEq)]
pub struct Extracted<'a> {
    pub content: &'a [u8],
    /// `None` when the input had no frontmatter block at all.
    pub metadata: Option<Metadata>,
}

/// Split `data` into frontmatter and content.
///
/// Input without a leading `---\n` comes back unchanged with no metadata. An
/// empty block (`---\n---\n`) yields empty metadata, not `None`.
pub fn extract(data: &[u8]) -> Result<Extracted<'_>, FrontmatterError> {
    if !data.starts_with(OPENING) {
        return Ok(Extracted {
            content: data,
            metadata: None,
        });
    }

    // Search from the newline that ends the opening fence so that an empty
    // block (`---\n---\n`) closes immediately.
    let search_from = OPENING.len() - 1;
    let close = find(&data[search_from..], CLOSING)
        .map(|i| i + search_from)
        .ok_or(FrontmatterError::Unterminated)?;

    let block = if close > search_from {
        &data[OPENING.len()..close]
    } else {
        &[][..]
    };
    let content = &data[close + CLOSING.len()..];

    let value: serde_yaml::Value = if block.iter().all(u8::is_ascii_whitespace) {
        serde_yaml::Value::Null
    } else {
        serde_yaml::from_slice(block)?
    };

    Ok(Extracted {
        content,
        metadata: Some(metadata::metadata_from_yaml(value)?),
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
