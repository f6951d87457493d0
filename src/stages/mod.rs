//! The pipeline stages, in the order the site pipeline runs them.
//!
//! | Stage | Module | Effect |
//! |-------|--------|--------|
//! | collections | [`collections`] | `collection` memberships, site collections, `previous`/`next` |
//! | basename | [`basename`] | `basename` from the record key |
//! | templates-by-collection | [`templates_by_collection`] | `template` from the first configured membership |
//! | markdown | [`markdown`] | `.md` → HTML, destination `.html` |
//! | excerpts | [`excerpts`] | `excerpt` from the first paragraph |
//! | permalinks | [`permalinks`] | metadata `path`, destination `<path>/index.html` |
//! | tags | [`tags`] | normalized `tags`, one page per tag |
//! | render | [`render`] | template rendering |
//! | stylesheets | [`stylesheets`] | `.scss` → `.css` |
//!
//! Every stage implements [`crate::pipeline::Stage`]; its `Result` is the
//! completion signal the orchestrator waits on.

pub mod basename;
pub mod collections;
pub mod excerpts;
pub mod markdown;
pub mod permalinks;
pub mod render;
pub mod stylesheets;
pub mod tags;
pub mod templates_by_collection;

pub use basename::Basename;
pub use collections::Collections;
pub use excerpts::Excerpts;
pub use markdown::Markdown;
pub use permalinks::Permalinks;
pub use render::Render;
pub use stylesheets::Stylesheets;
pub use tags::Tags;
pub use templates_by_collection::TemplatesByCollection;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
    #[error("{0} is not valid UTF-8")]
    NotUtf8(String),
    #[error("Failed to load templates from {dir}: {message}")]
    TemplateLoad { dir: PathBuf, message: String },
    #[error("Template error rendering {path}: {message}")]
    Template { path: String, message: String },
    #[error("Stylesheet error in {path}: {message}")]
    Stylesheet { path: String, message: String },
}

/// Flatten an error and its `source()` chain into one line.
///
/// Tera and grass report the useful detail (which variable, which line) in
/// nested sources; the top-level message alone is rarely enough.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
