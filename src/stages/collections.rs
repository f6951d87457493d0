//! Collection grouping.
//!
//! Each configured collection matches record keys against a glob pattern.
//! Front matter can also place a record in a collection directly:
//!
//! ```yaml
//! collection: posts          # or a list: [posts, featured]
//! ```
//!
//! A record's memberships are its front-matter names first, then pattern
//! matches in configuration order, without duplicates. They are written back
//! to its `collection` metadata (always a list, possibly empty). Each collection
//! is stored in [`SiteMetadata::collections`] as member keys ordered by the
//! collection's `sort_by` field, and each member gets `previous`/`next` keys
//! pointing at its neighbours in its first collection.
//!
//! Membership is computed once, here; later stages that change metadata do
//! not move records between collections.

use super::StageError;
use crate::config::CollectionConfig;
use crate::pipeline::Stage;
use crate::record::{Files, SiteMetadata, string_list};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use wax::{Glob, Pattern};

#[derive(Debug, Clone)]
pub struct Collections {
    config: BTreeMap<String, CollectionConfig>,
}

impl Collections {
    pub fn new(config: BTreeMap<String, CollectionConfig>) -> Self {
        Self { config }
    }
}

impl Stage for Collections {
    fn name(&self) -> &'static str {
        "collections"
    }

    fn run(&self, files: &mut Files, site: &mut SiteMetadata) -> Result<(), StageError> {
        let globs = self
            .config
            .iter()
            .map(|(name, c)| {
                Glob::new(&c.pattern)
                    .map(|glob| (name.as_str(), glob))
                    .map_err(|e| StageError::Pattern {
                        pattern: c.pattern.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut members: BTreeMap<String, Vec<String>> = self
            .config
            .keys()
            .map(|name| (name.clone(), Vec::new()))
            .collect();

        for (key, record) in files.iter_mut() {
            let mut names: Vec<String> = Vec::new();
            for name in string_list(record.get("collection")) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            for (name, glob) in &globs {
                if glob.is_match(key.as_str()) && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }

            for name in &names {
                members.entry(name.clone()).or_default().push(key.clone());
            }
            record.set(
                "collection",
                names.into_iter().map(Value::String).collect::<Vec<_>>(),
            );
        }

        for (name, keys) in members.iter_mut() {
            let (sort_by, reverse) = self
                .config
                .get(name)
                .map(|c| (c.sort_by.as_str(), c.reverse))
                .unwrap_or(("date", false));
            sort_keys(keys, files, sort_by, reverse);
            link_neighbours(name, keys, files);
        }

        site.collections = members;
        Ok(())
    }
}

/// Order record keys by a metadata field.
///
/// Records that have the field come first, ordered by its value; the rest
/// keep key order at the end. `reverse` flips only the records that have the
/// field.
pub(crate) fn sort_keys(keys: &mut [String], files: &Files, field: &str, reverse: bool) {
    keys.sort_by(|a, b| {
        let va = files.get(a).and_then(|r| r.get(field)).filter(|v| !v.is_null());
        let vb = files.get(b).and_then(|r| r.get(field)).filter(|v| !v.is_null());
        match (va, vb) {
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                let ord = if reverse { ord.reverse() } else { ord };
                ord.then_with(|| a.cmp(b))
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Set `previous`/`next` for the members whose first membership is `name`.
fn link_neighbours(name: &str, keys: &[String], files: &mut Files) {
    for (i, key) in keys.iter().enumerate() {
        let previous = i.checked_sub(1).and_then(|p| keys.get(p)).cloned();
        let next = keys.get(i + 1).cloned();
        if let Some(record) = files.get_mut(key) {
            if record.collections().first() != Some(&name) {
                continue;
            }
            record.set("previous", previous.map_or(Value::Null, Value::String));
            record.set("next", next.map_or(Value::Null, Value::String));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_helpers::{files_from, site};
    use serde_json::json;

    fn stock() -> Collections {
        Collections::new(SiteConfig::default().collections)
    }

    #[test]
    fn records_join_collections_by_pattern() {
        let mut files = files_from(&[
            ("content/posts/a.md", ""),
            ("content/projects/b.md", ""),
            ("content/posts/nested/c.md", ""),
            ("about.md", ""),
        ]);
        let mut site = site();
        stock().run(&mut files, &mut site).unwrap();

        assert_eq!(files["content/posts/a.md"].collections(), vec!["posts"]);
        assert_eq!(files["content/projects/b.md"].collections(), vec!["projects"]);
        assert!(files["content/posts/nested/c.md"].collections().is_empty());
        assert_eq!(files["about.md"].get("collection"), Some(&json!([])));
        assert_eq!(site.collections["posts"], vec!["content/posts/a.md"]);
        assert_eq!(site.collections["projects"], vec!["content/projects/b.md"]);
    }

    #[test]
    fn configured_collections_exist_even_when_empty() {
        let mut files = files_from(&[("about.md", "")]);
        let mut site = site();
        stock().run(&mut files, &mut site).unwrap();
        assert!(site.collections["posts"].is_empty());
        assert!(site.collections["projects"].is_empty());
    }

    #[test]
    fn front_matter_memberships_come_first() {
        let mut files = files_from(&[("content/posts/a.md", "")]);
        files
            .get_mut("content/posts/a.md")
            .unwrap()
            .set("collection", json!(["featured", "posts"]));
        let mut site = site();
        stock().run(&mut files, &mut site).unwrap();

        assert_eq!(files["content/posts/a.md"].collections(), vec!["featured", "posts"]);
        assert_eq!(site.collections["featured"], vec!["content/posts/a.md"]);
        assert_eq!(site.collections["posts"], vec!["content/posts/a.md"]);
    }

    #[test]
    fn collections_sorted_by_date() {
        let mut files = files_from(&[
            ("content/posts/a.md", ""),
            ("content/posts/b.md", ""),
            ("content/posts/c.md", ""),
            ("content/posts/undated.md", ""),
        ]);
        files.get_mut("content/posts/a.md").unwrap().set("date", "2021-03-01");
        files.get_mut("content/posts/b.md").unwrap().set("date", "2020-01-01");
        files.get_mut("content/posts/c.md").unwrap().set("date", "2021-01-15");
        let mut site = site();
        stock().run(&mut files, &mut site).unwrap();

        assert_eq!(
            site.collections["posts"],
            vec![
                "content/posts/b.md",
                "content/posts/c.md",
                "content/posts/a.md",
                "content/posts/undated.md",
            ]
        );
    }

    #[test]
    fn reverse_sort_and_custom_field() {
        let mut config = SiteConfig::default().collections;
        config.get_mut("posts").unwrap().sort_by = "order".into();
        config.get_mut("posts").unwrap().reverse = true;
        let mut files = files_from(&[
            ("content/posts/a.md", ""),
            ("content/posts/b.md", ""),
            ("content/posts/c.md", ""),
        ]);
        files.get_mut("content/posts/a.md").unwrap().set("order", 2);
        files.get_mut("content/posts/b.md").unwrap().set("order", 10);
        files.get_mut("content/posts/c.md").unwrap().set("order", 1);
        let mut site = site();
        Collections::new(config).run(&mut files, &mut site).unwrap();

        assert_eq!(
            site.collections["posts"],
            vec!["content/posts/b.md", "content/posts/a.md", "content/posts/c.md"]
        );
    }

    #[test]
    fn neighbours_are_linked() {
        let mut files = files_from(&[
            ("content/posts/a.md", ""),
            ("content/posts/b.md", ""),
        ]);
        files.get_mut("content/posts/a.md").unwrap().set("date", "2020-01-01");
        files.get_mut("content/posts/b.md").unwrap().set("date", "2020-02-01");
        stock().run(&mut files, &mut site()).unwrap();

        let a = &files["content/posts/a.md"];
        let b = &files["content/posts/b.md"];
        assert_eq!(a.get("previous"), Some(&Value::Null));
        assert_eq!(a.get_str("next"), Some("content/posts/b.md"));
        assert_eq!(b.get_str("previous"), Some("content/posts/a.md"));
        assert_eq!(b.get("next"), Some(&Value::Null));
    }

    #[test]
    fn neighbours_come_from_first_membership() {
        let mut files = files_from(&[
            ("content/posts/a.md", ""),
            ("content/posts/b.md", ""),
            ("notes/c.md", ""),
        ]);
        let a = files.get_mut("content/posts/a.md").unwrap();
        a.set("collection", "featured");
        a.set("date", "2020-01-01");
        files.get_mut("content/posts/b.md").unwrap().set("date", "2020-02-01");
        let c = files.get_mut("notes/c.md").unwrap();
        c.set("collection", "featured");
        c.set("date", "2020-03-01");
        let mut site = site();
        stock().run(&mut files, &mut site).unwrap();

        assert_eq!(site.collections["posts"], vec!["content/posts/a.md", "content/posts/b.md"]);
        assert_eq!(site.collections["featured"], vec!["content/posts/a.md", "notes/c.md"]);
        // a is listed in posts too, but featured comes first in its memberships
        assert_eq!(files["content/posts/a.md"].get_str("next"), Some("notes/c.md"));
        assert_eq!(files["content/posts/b.md"].get_str("previous"), Some("content/posts/a.md"));
        assert_eq!(files["notes/c.md"].get_str("previous"), Some("content/posts/a.md"));
    }

    #[test]
    fn invalid_pattern_is_stage_error() {
        let mut config = BTreeMap::new();
        config.insert(
            "broken".to_string(),
            CollectionConfig::matching("content/{posts,notes/*.md"),
        );
        let result = Collections::new(config).run(&mut files_from(&[]), &mut site());
        assert!(matches!(result, Err(StageError::Pattern { .. })));
    }
}
