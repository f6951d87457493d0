//! Template assignment by collection membership.
//!
//! Configured with a collection → template mapping (the `[templates]` table of
//! `site.toml`). A record without a template gets the template of the first
//! collection in *its own* `collection` list that appears in the mapping. The
//! record's membership order decides, not the mapping's order, so a record in
//! `["projects", "posts"]` takes the `projects` template even though `posts`
//! sorts first in the table.
//!
//! Explicit templates (front matter `template: ...`) are never overwritten.
//! Records with no configured membership stay without a template and are
//! passed through untouched by the render stage.

use super::StageError;
use crate::pipeline::Stage;
use crate::record::{Files, SiteMetadata};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct TemplatesByCollection {
    templates: BTreeMap<String, String>,
}

impl TemplatesByCollection {
    pub fn new(templates: BTreeMap<String, String>) -> Self {
        Self { templates }
    }
}

impl Stage for TemplatesByCollection {
    fn name(&self) -> &'static str {
        "templates-by-collection"
    }

    fn run(&self, files: &mut Files, _site: &mut SiteMetadata) -> Result<(), StageError> {
        for record in files.values_mut() {
            if record.has_template() {
                continue;
            }
            let template = record
                .collections()
                .into_iter()
                .find_map(|c| self.templates.get(c))
                .cloned();
            if let Some(template) = template {
                record.set("template", template);
            }
        }
        Ok(())
    }
}
