//! Excerpt extraction.
//!
//! For every HTML record the first `<p>` element (tags included) becomes the
//! `excerpt` metadata, which post lists show instead of the full body. An
//! excerpt written in front matter wins and is rendered from Markdown instead.

use super::StageError;
use super::markdown::Markdown;
use crate::pipeline::Stage;
use crate::record::{Files, SiteMetadata};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct Excerpts {
    markdown: Markdown,
}

impl Excerpts {
    pub fn new(markdown: Markdown) -> Self {
        Self { markdown }
    }
}

impl Stage for Excerpts {
    fn name(&self) -> &'static str {
        "excerpts"
    }

    fn run(&self, files: &mut Files, _site: &mut SiteMetadata) -> Result<(), StageError> {
        for record in files.values_mut() {
            if !record.is_html() {
                continue;
            }
            let excerpt = match record.get("excerpt") {
                Some(Value::String(given)) => self.markdown.render(given).trim().to_string(),
                Some(v) if !v.is_null() => continue,
                _ => match record.contents_str() {
                    Ok(html) => first_paragraph(html).unwrap_or_default().to_string(),
                    Err(_) => continue,
                },
            };
            record.set("excerpt", excerpt);
        }
        Ok(())
    }
}

/// The first `<p>…</p>` element of an HTML fragment, tags included.
pub fn first_paragraph(html: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(pos) = html[from..].find("<p") {
        let start = from + pos;
        let after = html[start + 2..].chars().next();
        if matches!(after, Some('>') | Some(' ') | Some('\t') | Some('\n')) {
            let end = html[start..].find("</p>")?;
            return Some(&html[start..start + end + "</p>".len()]);
        }
        from = start + 2;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{files_from, site};

    #[test]
    fn first_paragraph_found() {
        let html = "<h1>T</h1>\n<p>One <em>two</em></p>\n<p>Three</p>";
        assert_eq!(first_paragraph(html), Some("<p>One <em>two</em></p>"));
    }

    #[test]
    fn first_paragraph_skips_pre_and_other_p_tags() {
        let html = "<pre><code>x</code></pre><p class=\"lead\">Lead</p>";
        assert_eq!(first_paragraph(html), Some("<p class=\"lead\">Lead</p>"));
    }

    #[test]
    fn no_paragraph() {
        assert_eq!(first_paragraph("<h1>Only</h1>"), None);
    }

    #[test]
    fn excerpt_from_html_contents() {
        let mut files = files_from(&[("posts/a.html", "<h1>A</h1><p>Intro.</p><p>More.</p>")]);
        Excerpts::default().run(&mut files, &mut site()).unwrap();
        assert_eq!(files["posts/a.html"].get_str("excerpt"), Some("<p>Intro.</p>"));
    }

    #[test]
    fn front_matter_excerpt_rendered_from_markdown() {
        let mut files = files_from(&[("posts/a.html", "<p>Body.</p>")]);
        files
            .get_mut("posts/a.html")
            .unwrap()
            .set("excerpt", "A *custom* teaser");
        Excerpts::default().run(&mut files, &mut site()).unwrap();
        assert_eq!(
            files["posts/a.html"].get_str("excerpt"),
            Some("<p>A <em>custom</em> teaser</p>")
        );
    }

    #[test]
    fn non_html_records_get_no_excerpt() {
        let mut files = files_from(&[("css/main.css", "<p>not html</p>")]);
        Excerpts::default().run(&mut files, &mut site()).unwrap();
        assert_eq!(files["css/main.css"].get("excerpt"), None);
    }
}
