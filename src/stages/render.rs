//! Template rendering with Tera.
//!
//! Every file under the template directory is loaded, named by its relative
//! path. Files under the partials subdirectory are registered a second time
//! under their bare name so pages can `{% include "header" %}`:
//!
//! ```text
//! templates/
//! ├── post.hbt                  →  "post.hbt"
//! ├── post-list.hbt             →  "post-list.hbt"
//! └── partials/header.hbt       →  "partials/header.hbt", "header"
//! ```
//!
//! ## Render Context
//!
//! A record with a `template` is rendered with:
//!
//! | Key | Value |
//! |-----|-------|
//! | `site` | `base_url`, plus `collections` and `tags` |
//! | `collections` | collection name → list of member records |
//! | `tags` | tag slug → `{ name, slug, path, posts }` |
//! | *record metadata* | every metadata key at the top level |
//! | `page` | the record metadata again, as one object |
//! | `contents` | the record body as a string |
//!
//! Record references (`previous`, `next`, a tag page's `posts`, collection
//! members) are expanded to record objects. Those objects are snapshots taken
//! before any record is rendered, so a post list shows each post's body
//! HTML, not its finished page. Record metadata wins over the site-wide keys
//! of the same name.
//!
//! Autoescaping is off: `contents` and `excerpt` are already HTML.
//!
//! Records without a template pass through unchanged.

use super::{StageError, error_chain};
use crate::config::EnvironmentSettings;
use crate::helpers::{self, RenderContext};
use crate::naming;
use crate::pipeline::Stage;
use crate::record::{ContentRecord, Files, SiteMetadata};
use log::{debug, warn};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Tera};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct Render {
    directory: PathBuf,
    partials: String,
    environment: EnvironmentSettings,
}

impl Render {
    pub fn new(
        directory: impl Into<PathBuf>,
        partials: impl Into<String>,
        environment: EnvironmentSettings,
    ) -> Self {
        Self {
            directory: directory.into(),
            partials: partials.into(),
            environment,
        }
    }

    /// Load all templates and register the helpers.
    ///
    /// A missing template directory gives an empty engine; records that ask
    /// for a template then fail with "template not found".
    fn load(&self) -> Result<Tera, StageError> {
        let load_error = |message: String| StageError::TemplateLoad {
            dir: self.directory.clone(),
            message,
        };

        let mut templates = Vec::new();
        if self.directory.is_dir() {
            let partials_prefix = format!("{}/", self.partials.trim_matches('/'));
            for entry in WalkDir::new(&self.directory).sort_by_file_name() {
                let entry = entry.map_err(|e| load_error(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(&self.directory)
                    .map_err(|e| load_error(e.to_string()))?;
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let source = fs::read_to_string(entry.path())?;
                if name.starts_with(&partials_prefix) {
                    templates.push((naming::basename(&name), source.clone()));
                }
                templates.push((name, source));
            }
        }

        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        helpers::register(&mut tera, &self.environment);
        tera.add_raw_templates(templates)
            .map_err(|e| load_error(error_chain(&e)))?;
        debug!(
            "loaded {} templates from {}",
            tera.get_template_names().count(),
            self.directory.display()
        );
        Ok(tera)
    }
}

/// A record as templates see it: its metadata plus `contents`.
fn snapshot(record: &ContentRecord) -> Value {
    let mut object = record.metadata.clone();
    object.insert(
        "contents".into(),
        Value::String(String::from_utf8_lossy(&record.contents).into_owned()),
    );
    Value::Object(object)
}

/// Snapshots of every record, taken once before rendering starts.
struct Snapshots(BTreeMap<String, Value>);

impl Snapshots {
    fn take(files: &Files) -> Self {
        Self(
            files
                .iter()
                .map(|(key, record)| (key.clone(), snapshot(record)))
                .collect(),
        )
    }

    fn lookup(&self, key: &Value) -> Value {
        key.as_str()
            .and_then(|k| self.0.get(k))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn list<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> Value {
        Value::Array(
            keys.into_iter()
                .filter_map(|k| self.0.get(k).cloned())
                .collect(),
        )
    }
}

/// Site-wide context entries shared by every record of one render pass.
fn site_context(site: &SiteMetadata, snapshots: &Snapshots) -> Map<String, Value> {
    let collections: Map<String, Value> = site
        .collections
        .iter()
        .map(|(name, keys)| (name.clone(), snapshots.list(keys)))
        .collect();
    let tags: Map<String, Value> = site
        .tags
        .iter()
        .map(|(slug, tag)| {
            (
                slug.clone(),
                json!({
                    "name": tag.name,
                    "slug": tag.slug,
                    "path": tag.path,
                    "posts": snapshots.list(&tag.posts),
                }),
            )
        })
        .collect();

    let mut context = Map::new();
    context.insert(
        "site".into(),
        json!({
            "base_url": site.environment.base_url,
            "collections": collections,
            "tags": tags,
        }),
    );
    context.insert("collections".into(), Value::Object(collections));
    context.insert("tags".into(), Value::Object(tags));
    context
}

/// Record metadata with its references to other records expanded.
fn page_value(record: &ContentRecord, snapshots: &Snapshots) -> Map<String, Value> {
    let mut page = record.metadata.clone();
    for key in ["previous", "next"] {
        if let Some(reference) = page.get(key) {
            let expanded = snapshots.lookup(reference);
            page.insert(key.into(), expanded);
        }
    }
    // Tag pages list their records by key.
    if record.get("tag").is_some() {
        if let Some(Value::Array(keys)) = page.get("posts") {
            let expanded = keys.iter().map(|k| snapshots.lookup(k)).collect();
            page.insert("posts".into(), Value::Array(expanded));
        }
    }
    page
}

/// Insert per-record entries over the shared context, returning what each
/// one replaced so [`restore`] can put the shared context back.
fn overlay(context: &mut Context, entries: Vec<(String, Value)>) -> Vec<(String, Option<Value>)> {
    entries
        .into_iter()
        .map(|(name, value)| {
            let previous = context.remove(&name);
            context.insert(name.clone(), &value);
            (name, previous)
        })
        .collect()
}

fn restore(context: &mut Context, replaced: Vec<(String, Option<Value>)>) {
    for (name, previous) in replaced.into_iter().rev() {
        match previous {
            Some(value) => context.insert(name, &value),
            None => {
                context.remove(&name);
            }
        }
    }
}

impl Stage for Render {
    fn name(&self) -> &'static str {
        "render"
    }

    fn run(&self, files: &mut Files, site: &mut SiteMetadata) -> Result<(), StageError> {
        let mut tera = self.load()?;
        let snapshots = Snapshots::take(files);
        let mut context = Context::new();
        for (name, value) in site_context(site, &snapshots) {
            context.insert(name, &value);
        }

        for (key, record) in files.iter_mut() {
            let Some(template) = record.get_str("template").filter(|t| !t.is_empty()) else {
                if record.is_html() {
                    warn!("{key} has no template, writing it unrendered");
                }
                continue;
            };
            let template = template.to_string();

            helpers::bind_context(
                &mut tera,
                RenderContext {
                    path: record.get_str("path").unwrap_or(key).to_string(),
                    collection: record.collections().into_iter().map(String::from).collect(),
                },
            );

            let page = page_value(record, &snapshots);
            let mut entries: Vec<(String, Value)> = page.clone().into_iter().collect();
            entries.push(("page".into(), Value::Object(page)));
            entries.push((
                "contents".into(),
                Value::String(String::from_utf8_lossy(&record.contents).into_owned()),
            ));

            let replaced = overlay(&mut context, entries);
            let rendered = tera.render(&template, &context);
            restore(&mut context, replaced);
            let html = rendered.map_err(|e| StageError::Template {
                path: key.clone(),
                message: error_chain(&e),
            })?;

            debug!("rendered {key} with {template}");
            record.contents = html.into_bytes();
        }
        Ok(())
    }
}
