//! Shared test utilities for the inkpress test suite.
//!
//! Stage tests work on in-memory record sets; pipeline tests need files on
//! disk. Both are covered here:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut files = files_from(&[("content/posts/a.md", "# A")]);
//! Basename.run(&mut files, &mut site()).unwrap();
//!
//! let tmp = TempDir::new().unwrap();
//! write_fixture_site(tmp.path());
//! ```

use std::path::Path;

use crate::config::resolve_environment;
use crate::record::{ContentRecord, Files, SiteMetadata};

// =========================================================================
// In-memory records
// =========================================================================

/// Build a record set from `(key, contents)` pairs, with no metadata.
pub fn files_from(entries: &[(&str, &str)]) -> Files {
    entries
        .iter()
        .map(|(key, contents)| (key.to_string(), ContentRecord::new(*key, *contents)))
        .collect()
}

/// Site metadata for the development environment.
pub fn site() -> SiteMetadata {
    SiteMetadata::new(resolve_environment(None))
}

// =========================================================================
// Files on disk
// =========================================================================

/// Write `(relative path, contents)` pairs under `root`, creating
/// directories as needed.
pub fn write_tree(root: &Path, entries: &[(&str, &str)]) {
    for (relative, contents) in entries {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
    }
}

/// Lay out a small but complete project under `root`: two posts, a project,
/// a home page, stylesheets with a partial, and templates with a partial.
///
/// ```text
/// root/
/// ├── src/
/// │   ├── index.md
/// │   ├── content/posts/{my-post,older}.md
/// │   ├── content/projects/inkpress.md
/// │   └── css/{main,_vars}.scss
/// └── templates/
///     ├── post.hbt
///     ├── post-list.hbt
///     └── partials/header.hbt
/// ```
pub fn write_fixture_site(root: &Path) {
    write_tree(
        root,
        &[
            (
                "src/content/posts/my-post.md",
                "---\ntitle: My Post\ndate: \"2021-01-01T20:00:00\"\ntags: Rust, Static Sites\n---\nFirst paragraph of *my post*.\n\nSecond paragraph.\n",
            ),
            (
                "src/content/posts/older.md",
                "---\ntitle: Older Post\ndate: \"2020-06-01\"\ntags: [rust]\n---\nAn older post.\n",
            ),
            (
                "src/content/projects/inkpress.md",
                "---\ntitle: Inkpress\ndate: \"2021-02-01\"\n---\nA site builder.\n",
            ),
            (
                "src/index.md",
                "---\ntitle: Home\ntemplate: post-list.hbt\n---\nWelcome.\n",
            ),
            ("src/css/main.scss", "@import \"vars\";\nbody { color: $text; }\n"),
            ("src/css/_vars.scss", "$text: #222;\n"),
            (
                "templates/post.hbt",
                "<html><head><title>{{ title }}</title></head><body>\n\
                 {% include \"header\" %}\n\
                 <article><h1>{{ title }}</h1><time>{{ date | format_date }}</time>\n\
                 {{ contents }}</article>\n\
                 {% for tag in page.tags | default(value=[]) %}<a href=\"{{ link(path=\"tags/\" ~ tag.slug) }}\">{{ tag.name }}</a>{% endfor %}\n\
                 {% if next %}<a rel=\"next\" href=\"{{ link(path=next.path) }}\">{{ next.title }}</a>{% endif %}\n\
                 </body></html>\n",
            ),
            (
                "templates/post-list.hbt",
                "<html><body>\n\
                 {% include \"header\" %}\n\
                 <h1>{% if tag %}Tagged {{ tag }}{% else %}{{ title }}{% endif %}</h1>\n\
                 <ul>{% for post in posts | default(value=collections.posts) %}\
                 <li><a href=\"{{ link(path=post.path) }}\">{{ post.title }}</a>{{ post.excerpt }}</li>\
                 {% endfor %}</ul>\n\
                 </body></html>\n",
            ),
            (
                "templates/partials/header.hbt",
                "<nav><a class=\"{{ active_page(page=\"posts\") }}\" href=\"{{ link(path=\"posts\") }}\">Posts</a>\
                 <a class=\"{{ active_page(page=\"projects\") }}\" href=\"{{ link(path=\"projects\") }}\">Projects</a></nav>",
            ),
        ],
    );
}
