//! Permalinks.
//!
//! HTML records are moved to clean URLs. The pattern (`:collection/:basename`
//! by default) names metadata keys; each value is slugified, and list values
//! (like `collection`) contribute their first element:
//!
//! ```text
//! content/posts/my-post.html   →  posts/my-post/index.html   path = "posts/my-post"
//! about.html                   →  about/index.html           path = "about"
//! index.html                   →  index.html                 path = ""
//! ```
//!
//! When any placeholder has no value the record keeps its own location
//! instead: its directory plus its name, or just the directory for `index`
//! files. Front matter `permalink: false` leaves a record where it is.

use super::StageError;
use crate::naming;
use crate::pipeline::Stage;
use crate::record::{ContentRecord, Files, SiteMetadata};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Permalinks {
    pattern: String,
}

impl Permalinks {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Fill in the pattern from record metadata. `None` if any placeholder
    /// is missing or slugifies to nothing.
    fn resolve(&self, record: &ContentRecord) -> Option<String> {
        let mut segments = Vec::new();
        for segment in self.pattern.split('/') {
            let mut resolved = String::new();
            let mut rest = segment;
            while let Some(pos) = rest.find(':') {
                resolved.push_str(&rest[..pos]);
                let name_len = rest[pos + 1..]
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len() - pos - 1);
                let name = &rest[pos + 1..pos + 1 + name_len];
                let slug = placeholder_value(record, name).map(|v| naming::slugify(&v))?;
                if slug.is_empty() {
                    return None;
                }
                resolved.push_str(&slug);
                rest = &rest[pos + 1 + name_len..];
            }
            resolved.push_str(rest);
            segments.push(resolved);
        }
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        Some(naming::join(&refs))
    }
}

fn placeholder_value(record: &ContentRecord, name: &str) -> Option<String> {
    match record.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Where a record sits when the pattern cannot be resolved.
fn own_location(destination: &str) -> String {
    let name = naming::basename(destination);
    let dir = naming::parent(destination);
    if name == "index" {
        dir.to_string()
    } else {
        naming::join(&[dir, &name])
    }
}

impl Stage for Permalinks {
    fn name(&self) -> &'static str {
        "permalinks"
    }

    fn run(&self, files: &mut Files, _site: &mut SiteMetadata) -> Result<(), StageError> {
        for record in files.values_mut() {
            if !record.is_html() || record.get("permalink") == Some(&Value::Bool(false)) {
                continue;
            }
            let path = self
                .resolve(record)
                .unwrap_or_else(|| own_location(&record.destination));
            record.destination = naming::join(&[&path, "index.html"]);
            record.set("path", path);
        }
        Ok(())
    }
}
