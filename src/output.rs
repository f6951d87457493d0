//! CLI output formatting for builds.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. A rendered page is
//! shown by its title and where it ends up; the source file and template are
//! indented context lines beneath it. Files that were copied or compiled
//! without a template are listed by output path only.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! ==> Cleaned build
//! ==> Read 7 files from src
//!     collections (7 records)
//!     basename (7 records)
//!     ...
//!     stylesheets (8 records)
//! ```
//!
//! ## Report
//!
//! ```text
//! Pages
//! 001 My Post → posts/my-post/index.html
//!     Source: content/posts/my-post.md
//!     Template: post.hbt
//! 002 (tags/rust/index.html)
//!     Template: post-list.hbt
//!
//! Files
//!     css/main.css
//!
//! Built 2 pages, 1 file → build
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout or stderr.
//! Format functions are pure: no I/O, no side effects.

use crate::pipeline::{BuildEvent, BuildReport, WrittenFile};
use std::error::Error;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a page line: titled pages show title and destination, untitled
/// show the destination in parens.
///
/// ```text
/// 001 My Post → posts/my-post/index.html
/// 002 (tags/rust/index.html)
/// ```
fn page_line(index: usize, file: &WrittenFile) -> String {
    match file.title.as_deref() {
        Some(title) if !title.is_empty() => format!(
            "{} {} \u{2192} {}",
            format_index(index),
            title,
            file.destination
        ),
        _ => format!("{} ({})", format_index(index), file.destination),
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Format one progress event.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Cleaned { destination } => {
            vec![format!("==> Cleaned {}", destination.display())]
        }
        BuildEvent::SourceRead { source, records } => {
            vec![format!(
                "==> Read {} from {}",
                plural(*records, "file"),
                source.display()
            )]
        }
        BuildEvent::StageFinished { stage, records } => {
            vec![format!("{}{} ({} records)", indent(1), stage, records)]
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Format the summary of a finished build.
///
/// Templated records are listed as pages in output order, everything else
/// under `Files`.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();
    let (pages, files): (Vec<&WrittenFile>, Vec<&WrittenFile>) =
        report.written.iter().partition(|w| w.template.is_some());

    if !pages.is_empty() {
        lines.push("Pages".to_string());
        for (i, page) in pages.iter().enumerate() {
            lines.push(page_line(i + 1, page));
            if page.source != page.destination {
                lines.push(format!("{}Source: {}", indent(1), page.source));
            }
            if let Some(template) = &page.template {
                lines.push(format!("{}Template: {}", indent(1), template));
            }
        }
    }

    if !files.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Files".to_string());
        for file in &files {
            lines.push(format!("{}{}", indent(1), file.destination));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Built {}, {} \u{2192} {}",
        plural(pages.len(), "page"),
        plural(files.len(), "file"),
        report.destination.display()
    ));
    lines
}

/// Format a failed build: the error, then each underlying cause indented.
pub fn format_build_error(err: &dyn Error) -> Vec<String> {
    let mut lines = vec![format!("Build failed: {err}")];
    let mut source = err.source();
    let mut depth = 1;
    while let Some(cause) = source {
        lines.push(format!("{}caused by: {}", indent(depth), cause));
        source = cause.source();
        depth += 1;
    }
    lines
}

/// Print a progress event to stdout.
pub fn print_build_event(event: &BuildEvent) {
    for line in format_build_event(event) {
        println!("{}", line);
    }
}

/// Print a build report to stdout.
pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

/// Print a failed build to stderr.
pub fn print_build_error(err: &dyn Error) {
    for line in format_build_error(err) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
