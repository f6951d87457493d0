//! Site configuration and deployment environments.
//!
//! Two independent pieces of configuration drive a build:
//!
//! - **[`SiteConfig`]**: where content lives, how collections are matched,
//!   which template each collection uses, the permalink pattern, tag pages.
//!   Stock defaults describe the site as it is laid out today; an optional
//!   `site.toml` at the project root overrides any subset of it.
//! - **[`EnvironmentSettings`]**: the per-deployment values (currently only the
//!   base URL), picked once at startup from a compiled-in table by
//!   [`resolve_environment`].
//!
//! ## `site.toml`
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source = "src"
//! destination = "build"
//! clean = true
//!
//! [collections.posts]
//! pattern = "content/posts/*.md"
//! sort_by = "date"
//! reverse = false
//!
//! [collections.projects]
//! pattern = "content/projects/*.md"
//!
//! [templates]               # collection name -> template name
//! posts = "post.hbt"
//! projects = "post.hbt"
//! pages = "post-list.hbt"
//!
//! [permalinks]
//! pattern = ":collection/:basename"
//!
//! [tags]
//! handle = "tags"
//! path = "tags/:tag/index.html"
//! template = "post-list.hbt"
//! sort_by = "title"
//! reverse = false
//!
//! [markdown]
//! smartypants = true
//!
//! [rendering]
//! directory = "templates"
//! partials = "partials"     # relative to `directory`
//! ```
//!
//! Config files are sparse: stock defaults are serialized to a TOML value, the
//! user file is merged on top key by key, and the result is deserialized and
//! validated. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the optional site configuration file at the project root.
pub const SITE_CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

// =============================================================================
// Deployment environments
// =============================================================================

/// Environment used when none (or an unknown one) is requested.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Compiled-in environment table: name → base URL.
const ENVIRONMENTS: &[(&str, &str)] = &[("dev", ""), ("prod", "http://coloredsyntax.com")];

/// Per-deployment settings, resolved once at process start and passed to
/// whatever needs them (the `link` template helper, the render context).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSettings {
    /// Prefix for absolute links. Empty in development so links stay
    /// root-relative.
    pub base_url: String,
}

fn lookup_environment(name: &str) -> Option<EnvironmentSettings> {
    ENVIRONMENTS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, base_url)| EnvironmentSettings {
            base_url: base_url.to_string(),
        })
}

/// Resolve the settings for a deployment environment.
///
/// Unknown and absent names silently fall back to [`DEFAULT_ENVIRONMENT`].
pub fn resolve_environment(name: Option<&str>) -> EnvironmentSettings {
    name.and_then(lookup_environment)
        .or_else(|| lookup_environment(DEFAULT_ENVIRONMENT))
        .unwrap_or(EnvironmentSettings {
            base_url: String::new(),
        })
}

// =============================================================================
// Site configuration
// =============================================================================

/// Site configuration loaded from `site.toml`.
///
/// All fields have defaults matching the stock site layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Source directory, relative to the project root.
    pub source: String,
    /// Destination directory, relative to the project root.
    pub destination: String,
    /// Remove the destination directory before building.
    pub clean: bool,
    /// Named collections and the record paths they match.
    pub collections: BTreeMap<String, CollectionConfig>,
    /// Collection name → template name, used by template assignment.
    pub templates: BTreeMap<String, String>,
    pub permalinks: PermalinkConfig,
    pub tags: TagsConfig,
    pub markdown: MarkdownConfig,
    pub rendering: RenderingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let collections = [
            ("posts", "content/posts/*.md"),
            ("projects", "content/projects/*.md"),
        ]
        .into_iter()
        .map(|(name, pattern)| (name.to_string(), CollectionConfig::matching(pattern)))
        .collect();

        let templates = [
            ("posts", "post.hbt"),
            ("projects", "post.hbt"),
            ("pages", "post-list.hbt"),
        ]
        .into_iter()
        .map(|(collection, template)| (collection.to_string(), template.to_string()))
        .collect();

        Self {
            source: "src".to_string(),
            destination: "build".to_string(),
            clean: true,
            collections,
            templates,
            permalinks: PermalinkConfig::default(),
            tags: TagsConfig::default(),
            markdown: MarkdownConfig::default(),
            rendering: RenderingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source and destination must not be empty".into(),
            ));
        }
        let source = lexical_path(&self.source);
        let destination = lexical_path(&self.destination);
        if !destination
            .components()
            .any(|c| matches!(c, Component::Normal(_)))
        {
            return Err(ConfigError::Validation(format!(
                "destination '{}' is the project root or above it",
                self.destination
            )));
        }
        if source.starts_with(&destination) {
            return Err(ConfigError::Validation(format!(
                "destination '{}' would remove the source directory '{}'",
                self.destination, self.source
            )));
        }
        if destination.starts_with(&source) {
            return Err(ConfigError::Validation(format!(
                "destination '{}' must not be inside the source directory '{}'",
                self.destination, self.source
            )));
        }
        for (name, collection) in &self.collections {
            wax::Glob::new(&collection.pattern).map_err(|e| {
                ConfigError::Validation(format!(
                    "collections.{name}.pattern '{}' is not a valid glob: {e}",
                    collection.pattern
                ))
            })?;
        }
        if self.permalinks.pattern.trim().is_empty() {
            return Err(ConfigError::Validation(
                "permalinks.pattern must not be empty".into(),
            ));
        }
        if !self.tags.path.contains(":tag") {
            return Err(ConfigError::Validation(
                "tags.path must contain the :tag placeholder".into(),
            ));
        }
        Ok(())
    }
}

/// Normalize a configured directory without touching the filesystem: `.` is
/// dropped and `..` cancels the segment before it.
///
/// `./src` → `src`, `src/..` → empty (the project root), `../out` → `../out`.
fn lexical_path(path: &str) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in Path::new(path.trim()).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// A named collection: which records belong to it and how they are ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionConfig {
    /// Glob matched against record paths relative to the source directory.
    pub pattern: String,
    /// Metadata key used to order the collection.
    pub sort_by: String,
    pub reverse: bool,
}

impl CollectionConfig {
    pub fn matching(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            ..Self::default()
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            sort_by: "date".to_string(),
            reverse: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermalinkConfig {
    /// `:key` placeholders are replaced with slugified record metadata.
    pub pattern: String,
}

impl Default for PermalinkConfig {
    fn default() -> Self {
        Self {
            pattern: ":collection/:basename".to_string(),
        }
    }
}

/// Tag page generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagsConfig {
    /// Metadata key holding a record's tags.
    pub handle: String,
    /// Output path of each tag page; `:tag` becomes the tag slug.
    pub path: String,
    /// Template used to render tag pages.
    pub template: String,
    /// Metadata key used to order the records listed on a tag page.
    pub sort_by: String,
    pub reverse: bool,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            handle: "tags".to_string(),
            path: "tags/:tag/index.html".to_string(),
            template: "post-list.hbt".to_string(),
            sort_by: "title".to_string(),
            reverse: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Typographic quotes and dashes.
    pub smartypants: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { smartypants: true }
    }
}

/// Where templates are loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderingConfig {
    /// Template directory, relative to the project root.
    pub directory: String,
    /// Partials directory, relative to `directory`. Files here are also
    /// registered under their bare name (`partials/header.hbt` → `header`).
    pub partials: String,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            directory: "templates".to_string(),
            partials: "partials".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from the project root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(SITE_CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load the site config for a project root: stock defaults, then `site.toml`.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // Environments
    // =========================================================================

    #[test]
    fn absent_environment_is_dev() {
        assert_eq!(resolve_environment(None).base_url, "");
    }

    #[test]
    fn prod_environment_has_site_url() {
        assert_eq!(
            resolve_environment(Some("prod")).base_url,
            "http://coloredsyntax.com"
        );
    }

    #[test]
    fn unknown_environments_fall_back_to_dev() {
        let dev = resolve_environment(Some("dev"));
        for name in ["staging", "", "PROD", "prod ", "undefined"] {
            assert_eq!(resolve_environment(Some(name)), dev, "env {name:?}");
        }
    }

    // =========================================================================
    // Site config
    // =========================================================================

    #[test]
    fn default_config_matches_stock_site() {
        let config = SiteConfig::default();
        assert_eq!(config.source, "src");
        assert_eq!(config.destination, "build");
        assert!(config.clean);
        assert_eq!(config.collections["posts"].pattern, "content/posts/*.md");
        assert_eq!(config.collections["projects"].sort_by, "date");
        assert_eq!(config.templates["pages"], "post-list.hbt");
        assert_eq!(config.permalinks.pattern, ":collection/:basename");
        assert_eq!(config.tags.template, "post-list.hbt");
        assert!(config.markdown.smartypants);
        config.validate().unwrap();
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.destination, "build");
        assert_eq!(config.collections.len(), 2);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(SITE_CONFIG_FILE),
            r#"
destination = "public"

[collections.notes]
pattern = "content/notes/*.md"
reverse = true

[templates]
notes = "note.hbt"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.destination, "public");
        assert_eq!(config.source, "src");
        assert_eq!(config.collections.len(), 3);
        assert!(config.collections["notes"].reverse);
        assert_eq!(config.collections["notes"].sort_by, "date");
        assert_eq!(config.templates["notes"], "note.hbt");
        assert_eq!(config.templates["posts"], "post.hbt");
    }

    #[test]
    fn unknown_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SITE_CONFIG_FILE), "destinaton = \"out\"\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn same_source_and_destination_rejected() {
        let config = SiteConfig {
            destination: "src".to_string(),
            ..SiteConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn destinations_that_would_clean_the_source_rejected() {
        for destination in ["./src", ".", "src/..", "./", "..", "src/../src", "src/posts"] {
            let config = SiteConfig {
                destination: destination.to_string(),
                ..SiteConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "destination {destination:?} should be rejected"
            );
        }
    }

    #[test]
    fn separate_destinations_accepted() {
        for destination in ["build", "./public", "../site-output", "out/../build", "srcs"] {
            let config = SiteConfig {
                destination: destination.to_string(),
                ..SiteConfig::default()
            };
            assert!(config.validate().is_ok(), "destination {destination:?} should be accepted");
        }
    }

    #[test]
    fn lexical_path_resolves_dots() {
        assert_eq!(lexical_path("./src"), PathBuf::from("src"));
        assert_eq!(lexical_path("src/.."), PathBuf::new());
        assert_eq!(lexical_path("a/./b/../c"), PathBuf::from("a/c"));
        assert_eq!(lexical_path("../out"), PathBuf::from("../out"));
    }

    #[test]
    fn tag_path_without_placeholder_rejected() {
        let mut config = SiteConfig::default();
        config.tags.path = "tags/index.html".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn invalid_collection_glob_rejected() {
        let mut config = SiteConfig::default();
        config
            .collections
            .insert("broken".into(), CollectionConfig::matching("content/{posts,notes/*.md"));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }
}
