//! CLI output formatting.
//!
//! Every display has a pure `format_*` function returning lines and a thin
//! `print_*` wrapper, so tests can check output without capturing stdout.
//!
//! # Output Format
//!
//! ## Collection (`check`)
//!
//! ```text
//! 001 about.html (1.4 KB)
//!     Metadata: rendered_from, title
//! 002 css/site.css (812 B)
//!     Mode: 644
//! ```
//!
//! Files with neither metadata nor source permissions get the header line
//! only.
//!
//! ## Build
//!
//! ```text
//! Read 12 files
//! Ran 3 stages
//! Wrote 11 files (48.2 KB) → public (cleaned)
//! ```
//!
//! ## JSON (`check --json`)
//!
//! An array of `{ "path", "size", "mode", "metadata" }` objects in
//! logical-path order. Content is omitted.

use crate::collection::FileCollection;
use crate::metadata::Metadata;
use crate::pipeline::BuildReport;
use serde::Serialize;
use std::path::Path;

fn format_index(pos: usize) -> String {
    format!("{:03}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count: `812 B`, `1.4 KB`, `3.0 MB`.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

pub fn format_collection(files: &FileCollection) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (path, record)) in files.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            path,
            format_size(record.content.len())
        ));
        if let Some(metadata) = record.metadata.as_ref().filter(|m| !m.is_empty()) {
            let keys: Vec<&str> = metadata.keys().map(String::as_str).collect();
            lines.push(format!("{}Metadata: {}", indent(1), keys.join(", ")));
        }
        if let Some(mode) = record.source_permissions() {
            lines.push(format!("{}Mode: {:o}", indent(1), mode));
        }
    }
    if lines.is_empty() {
        lines.push("(no files)".to_string());
    }
    lines
}

pub fn print_collection(files: &FileCollection) {
    for line in format_collection(files) {
        println!("{}", line);
    }
}

pub fn format_build_report(report: &BuildReport, destination: &Path) -> Vec<String> {
    let cleaned = if report.write.cleaned { " (cleaned)" } else { "" };
    vec![
        format!("Read {} files", report.files_read),
        format!("Ran {} stages", report.stages_run),
        format!(
            "Wrote {} files ({}) → {}{}",
            report.write.files,
            format_size(report.write.bytes),
            destination.display(),
            cleaned
        ),
    ]
}

pub fn print_build_report(report: &BuildReport, destination: &Path) {
    for line in format_build_report(report, destination) {
        println!("{}", line);
    }
}

#[derive(Serialize)]
struct FileSummary<'a> {
    path: &'a str,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    metadata: Option<&'a Metadata>,
}

/// The collection as pretty JSON, content omitted.
pub fn format_collection_json(files: &FileCollection) -> serde_json::Result<String> {
    let summaries: Vec<FileSummary<'_>> = files
        .iter()
        .map(|(path, record)| FileSummary {
            path,
            size: record.content.len(),
            mode: record.source_permissions().map(|m| format!("{m:o}")),
            metadata: record.metadata.as_ref(),
        })
        .collect();
    serde_json::to_string_pretty(&summaries)
}
