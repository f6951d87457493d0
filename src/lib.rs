//! # Inkpress
//!
//! A small static site builder for a single-author blog and portfolio.
//! Markdown posts and projects go in, a plain HTML site comes out.
//!
//! # Architecture: One Record Set, Many Stages
//!
//! A build reads the whole source tree into memory as one record set, passes
//! it through a fixed list of stages, and writes the result:
//!
//! ```text
//! src/  →  read  →  collections → basename → templates → markdown → excerpts
//!                   → permalinks → tags → render → stylesheets  →  write  →  build/
//! ```
//!
//! Every stage sees every record, so cross-record features (collections,
//! previous/next links, tag pages) are plain functions over a map. Each stage
//! is unit-tested on an in-memory record set without touching the
//! filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Build orchestration: clean, read, run stages, write |
//! | [`stages`] | The nine stages, one module each |
//! | [`source`] | Source tree walking and YAML front matter |
//! | [`record`] | `ContentRecord`, the record set, site-wide metadata |
//! | [`helpers`] | Template helpers exposed to Tera |
//! | [`config`] | Environments and `site.toml` loading, merging, validation |
//! | [`naming`] | Path, basename and slug helpers |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stable Record Keys
//!
//! Records are keyed by their source path for the whole build. Stages move a
//! record's *destination* (`content/posts/a.md` → `posts/a/index.html`) but
//! never its key, so collections and tag pages can refer to records by key
//! and the renderer resolves those references at the end.
//!
//! ## Runtime Templates
//!
//! Templates live in a `templates/` directory next to the source and are
//! loaded at build time with Tera, so the site's look can change without
//! rebuilding the binary.
//!
//! ## Configuration
//!
//! Everything has a stock default. An optional `site.toml` at the project
//! root overrides any subset of it:
//!
//! ```toml
//! destination = "public"
//!
//! [collections.notes]
//! pattern = "content/notes/*.md"
//!
//! [templates]
//! notes = "post.hbt"
//! ```
//!
//! The deployment environment (`dev` or `prod`) only changes the base URL
//! used by the `link` helper and is chosen on the command line.

pub mod config;
pub mod helpers;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod stages;

#[cfg(test)]
pub(crate) mod test_helpers;
