//! The in-memory record set threaded through every pipeline stage.
//!
//! A build reads the whole source tree into [`Files`]: one [`ContentRecord`]
//! per file, keyed by its source-relative path. Stages mutate records in place
//! (metadata, contents, destination) and may add or remove records. Data that
//! belongs to the site as a whole rather than to one record (collections, tag
//! indexes, the deployment environment) lives in [`SiteMetadata`].

use crate::config::EnvironmentSettings;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Open-ended record metadata: front matter plus whatever stages attach.
pub type Metadata = serde_json::Map<String, Value>;

/// All records of one build, keyed by source-relative path.
pub type Files = BTreeMap<String, ContentRecord>;

/// One file as it flows through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    /// Source-relative path with `/` separators. Stable for the whole build;
    /// collections and tag indexes refer to records by this key.
    pub path: String,
    /// Output-relative path the record is written to. Starts equal to `path`.
    pub destination: String,
    pub contents: Vec<u8>,
    pub metadata: Metadata,
}

impl ContentRecord {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        Self {
            destination: path.clone(),
            path,
            contents: contents.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Whether a template has been chosen for this record.
    ///
    /// An empty string or `null` counts as "not set", so front matter can
    /// write `template: ""` and still get the collection default.
    pub fn has_template(&self) -> bool {
        self.get("template").is_some_and(is_truthy)
    }

    /// Collection memberships, in the order they were recorded.
    pub fn collections(&self) -> Vec<&str> {
        string_list(self.get("collection"))
    }

    pub fn contents_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.contents)
    }

    /// Extension of the destination path, lowercased.
    pub fn destination_extension(&self) -> Option<String> {
        std::path::Path::new(&self.destination)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    pub fn is_html(&self) -> bool {
        self.destination_extension().as_deref() == Some("html")
    }
}

/// Read a metadata value that may be a single string or a list of strings.
///
/// Front matter writes `collection: posts` as often as `collection: [posts]`;
/// both read back as a list. Non-string list items are ignored.
pub fn string_list(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// JavaScript-style truthiness, which is what template authors expect.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy. Everything else, including
/// empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// One tag and the records carrying it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagIndex {
    pub name: String,
    pub slug: String,
    /// Permalink of the tag page.
    pub path: String,
    /// Keys of tagged records, in tag page order.
    pub posts: Vec<String>,
}

/// Site-wide data shared by all records of a build.
#[derive(Debug, Clone, Serialize)]
pub struct SiteMetadata {
    /// Collection name → member record keys, in collection order.
    pub collections: BTreeMap<String, Vec<String>>,
    /// Tag slug → tag index.
    pub tags: BTreeMap<String, TagIndex>,
    pub environment: EnvironmentSettings,
}

impl SiteMetadata {
    pub fn new(environment: EnvironmentSettings) -> Self {
        Self {
            collections: BTreeMap::new(),
            tags: BTreeMap::new(),
            environment,
        }
    }
}
