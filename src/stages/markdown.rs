//! Markdown → HTML.
//!
//! Every record whose destination ends in `.md` is rendered with
//! pulldown-cmark and its destination extension becomes `.html`. Tables,
//! footnotes, strikethrough and task lists are always on; smart punctuation
//! follows `markdown.smartypants`.
//!
//! Fenced code blocks keep their language as a `language-*` class on the
//! `<code>` element so a client-side highlighter can pick them up.

use super::StageError;
use crate::config::MarkdownConfig;
use crate::naming;
use crate::pipeline::Stage;
use crate::record::{Files, SiteMetadata};
use pulldown_cmark::{Options, Parser, html::push_html};

#[derive(Debug, Clone, Default)]
pub struct Markdown {
    config: MarkdownConfig,
}

impl Markdown {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        if self.config.smartypants {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }

    /// Render a Markdown string with this stage's options.
    pub fn render(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.options());
        let mut html = String::with_capacity(source.len() * 3 / 2);
        push_html(&mut html, parser);
        html
    }
}

impl Stage for Markdown {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn run(&self, files: &mut Files, _site: &mut SiteMetadata) -> Result<(), StageError> {
        for (key, record) in files.iter_mut() {
            if record.destination_extension().as_deref() != Some("md") {
                continue;
            }
            let html = {
                let source = record
                    .contents_str()
                    .map_err(|_| StageError::NotUtf8(key.clone()))?;
                self.render(source)
            };
            record.contents = html.into_bytes();
            record.destination = naming::with_extension(&record.destination, "html");
        }
        Ok(())
    }
}
