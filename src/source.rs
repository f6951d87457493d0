//! Source tree reading.
//!
//! The first thing a build does after cleaning is turn the source directory
//! into a [`Files`] record set:
//!
//! ```text
//! src/                                    Files
//! ├── index.md                   →        "index.md"
//! ├── content/
//! │   ├── posts/hello-world.md   →        "content/posts/hello-world.md"
//! │   └── projects/inkpress.md   →        "content/projects/inkpress.md"
//! └── css/main.scss              →        "css/main.scss"
//! ```
//!
//! ## Front Matter
//!
//! A text file that opens with a `---` line carries YAML front matter up to the
//! next `---` line. The YAML mapping becomes the record's metadata and the
//! delimiters and YAML are stripped from its contents:
//!
//! ```text
//! ---
//! title: Hello World
//! date: 2021-01-01
//! tags: rust, web
//! ---
//! Body text starts here.
//! ```
//!
//! Files that are not UTF-8 (images, fonts) are read as-is with no front
//! matter. Every record also gets a `stats` entry (`size`, `modified`).
//! Hidden files and directories (leading `.`) are skipped.

use crate::record::{ContentRecord, Files, Metadata};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source directory not found: {0}")]
    MissingSource(PathBuf),
    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid front matter in {path}: {source}")]
    FrontMatter {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
    #[error("Front matter in {0} is not a mapping")]
    FrontMatterNotMapping(String),
}

/// Read every file under `dir` into a record set keyed by relative path.
pub fn read_source(dir: &Path) -> Result<Files, SourceError> {
    if !dir.is_dir() {
        return Err(SourceError::MissingSource(dir.to_path_buf()));
    }

    let mut files = Files::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let key = relative_key(dir, entry.path());
        let bytes = fs::read(entry.path())?;
        let mut record = parse_record(&key, bytes)?;
        record.set("stats", file_stats(&entry.metadata()?));
        files.insert(key, record);
    }

    Ok(files)
}

/// Build a record from raw file bytes, splitting off front matter.
pub fn parse_record(key: &str, bytes: Vec<u8>) -> Result<ContentRecord, SourceError> {
    let Ok(text) = std::str::from_utf8(&bytes) else {
        return Ok(ContentRecord::new(key, bytes));
    };
    let Some((yaml, body)) = split_front_matter(text) else {
        return Ok(ContentRecord::new(key, bytes));
    };

    let metadata = parse_front_matter(key, yaml)?;
    Ok(ContentRecord::new(key, body.as_bytes().to_vec()).with_metadata(metadata))
}

/// Split `---`-delimited front matter from the body.
///
/// Returns `None` when the text has no (or unterminated) front matter.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse_front_matter(key: &str, yaml: &str) -> Result<Metadata, SourceError> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::new());
    }
    let value: Value =
        serde_yaml_ng::from_str(yaml).map_err(|source| SourceError::FrontMatter {
            path: key.to_string(),
            source,
        })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Metadata::new()),
        _ => Err(SourceError::FrontMatterNotMapping(key.to_string())),
    }
}

fn file_stats(metadata: &fs::Metadata) -> Value {
    let modified = metadata
        .modified()
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
    json!({
        "size": metadata.len(),
        "modified": modified,
    })
}

/// Source-relative key with `/` separators on every platform.
fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
