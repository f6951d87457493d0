//! Tag normalization and tag pages.
//!
//! The configured handle (`tags` by default) may be written either way in
//! front matter:
//!
//! ```yaml
//! tags: rust, static sites
//! tags: [rust, static sites]
//! ```
//!
//! Both become a list of `{ name, slug }` objects on the record. For each
//! distinct slug a new record is added at the configured path
//! (`tags/:tag/index.html`), rendered with the tag template, carrying `tag`,
//! `slug`, `path` and `posts` (keys of the tagged records, ordered by
//! `sort_by`). The same data is kept in [`SiteMetadata::tags`] so any page can
//! list all tags.

use super::StageError;
use super::collections::sort_keys;
use crate::config::TagsConfig;
use crate::naming;
use crate::pipeline::Stage;
use crate::record::{ContentRecord, Files, SiteMetadata, TagIndex};
use log::warn;
use serde_json::{Value, json};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Tags {
    config: TagsConfig,
}

impl Tags {
    pub fn new(config: TagsConfig) -> Self {
        Self { config }
    }

    /// Output key of a tag page.
    fn page_key(&self, slug: &str) -> String {
        self.config.path.replace(":tag", slug)
    }
}

/// Parse a tags value into `(name, slug)` pairs, dropping duplicates and
/// names that slugify to nothing.
pub fn parse_tags(value: &Value) -> Vec<(String, String)> {
    let names: Vec<String> = match value {
        Value::String(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut tags: Vec<(String, String)> = Vec::new();
    for name in names {
        let slug = naming::slugify(&name);
        if !slug.is_empty() && !tags.iter().any(|(_, s)| *s == slug) {
            tags.push((name, slug));
        }
    }
    tags
}

impl Stage for Tags {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn run(&self, files: &mut Files, site: &mut SiteMetadata) -> Result<(), StageError> {
        let handle = self.config.handle.as_str();
        let mut index: BTreeMap<String, TagIndex> = BTreeMap::new();

        for (key, record) in files.iter_mut() {
            let Some(raw) = record.get(handle) else {
                continue;
            };
            let tags = parse_tags(raw);
            record.set(
                handle,
                tags.iter()
                    .map(|(name, slug)| json!({ "name": name, "slug": slug }))
                    .collect::<Vec<_>>(),
            );

            for (name, slug) in tags {
                let path = naming::parent(&self.page_key(&slug)).to_string();
                index
                    .entry(slug.clone())
                    .or_insert_with(|| TagIndex {
                        name,
                        slug,
                        path,
                        posts: Vec::new(),
                    })
                    .posts
                    .push(key.clone());
            }
        }

        for tag in index.values_mut() {
            sort_keys(&mut tag.posts, files, &self.config.sort_by, self.config.reverse);
        }

        for tag in index.values() {
            let key = self.page_key(&tag.slug);
            if files.contains_key(&key) {
                warn!("tag page {key} would replace a source file; keeping the source file");
                continue;
            }
            let mut page = ContentRecord::new(key.clone(), Vec::new());
            page.set("template", self.config.template.clone());
            page.set("tag", tag.name.clone());
            page.set("slug", tag.slug.clone());
            page.set("path", tag.path.clone());
            page.set("basename", naming::basename(&key));
            page.set("posts", tag.posts.clone());
            files.insert(key, page);
        }

        site.tags = index;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{files_from, site};

    #[test]
    fn parse_comma_separated_string() {
        assert_eq!(
            parse_tags(&json!("Rust, Static Sites ,  ,rust")),
            vec![
                ("Rust".to_string(), "rust".to_string()),
                ("Static Sites".to_string(), "static-sites".to_string()),
            ]
        );
    }

    #[test]
    fn parse_list_and_normalized_objects() {
        assert_eq!(
            parse_tags(&json!(["web", { "name": "Rust", "slug": "rust" }, 2021, null])),
            vec![
                ("web".to_string(), "web".to_string()),
                ("Rust".to_string(), "rust".to_string()),
                ("2021".to_string(), "2021".to_string()),
            ]
        );
    }

    #[test]
    fn creates_one_page_per_tag() {
        let mut files = files_from(&[("content/posts/a.md", ""), ("content/posts/b.md", "")]);
        let a = files.get_mut("content/posts/a.md").unwrap();
        a.set("tags", "Rust, Web");
        a.set("title", "Beta");
        let b = files.get_mut("content/posts/b.md").unwrap();
        b.set("tags", json!(["rust"]));
        b.set("title", "Alpha");

        let mut site = site();
        Tags::default().run(&mut files, &mut site).unwrap();

        assert_eq!(
            files["content/posts/a.md"].get("tags"),
            Some(&json!([
                { "name": "Rust", "slug": "rust" },
                { "name": "Web", "slug": "web" },
            ]))
        );

        let rust = &files["tags/rust/index.html"];
        assert_eq!(rust.get_str("template"), Some("post-list.hbt"));
        assert_eq!(rust.get_str("tag"), Some("Rust"));
        assert_eq!(rust.get_str("path"), Some("tags/rust"));
        // sorted by title: Alpha (b) before Beta (a)
        assert_eq!(
            rust.get("posts"),
            Some(&json!(["content/posts/b.md", "content/posts/a.md"]))
        );
        assert!(files.contains_key("tags/web/index.html"));

        assert_eq!(site.tags.len(), 2);
        assert_eq!(site.tags["web"].posts, vec!["content/posts/a.md"]);
    }

    #[test]
    fn custom_handle_and_path() {
        let config = TagsConfig {
            handle: "topics".into(),
            path: "topics/:tag.html".into(),
            ..TagsConfig::default()
        };
        let mut files = files_from(&[("a.md", "")]);
        files.get_mut("a.md").unwrap().set("topics", "Music");
        let mut site = site();
        Tags::new(config).run(&mut files, &mut site).unwrap();
        assert!(files.contains_key("topics/music.html"));
        assert_eq!(site.tags["music"].path, "topics");
    }

    #[test]
    fn untagged_records_untouched() {
        let mut files = files_from(&[("a.md", "")]);
        let mut site = site();
        Tags::default().run(&mut files, &mut site).unwrap();
        assert_eq!(files.len(), 1);
        assert!(site.tags.is_empty());
    }
}
