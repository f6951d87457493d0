//! Path and name helpers shared by the stages.
//!
//! Record keys and destinations are plain strings with `/` separators
//! (`content/posts/hello-world.md`), independent of the host platform, so these
//! helpers work on strings rather than `std::path::Path` wherever the result
//! ends up in a URL.

use std::path::Path;

/// File name with directory and final extension removed.
///
/// - `content/posts/hello-world.md` → `hello-world`
/// - `archive.tar.gz` → `archive.tar`
/// - `.hidden` → `.hidden` (a leading dot is not an extension)
pub fn basename(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Last `/`-separated segment of a path, extension included.
///
/// `posts/my-post` → `my-post`, `a/b.html` → `b.html`, `a/b/` → `b`.
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Directory part of a `/`-separated path, empty for top-level names.
pub fn parent(path: &str) -> &str {
    path.rfind('/').map(|pos| &path[..pos]).unwrap_or("")
}

/// Replace (or add) the extension of a `/`-separated path.
///
/// `content/a.md` + `html` → `content/a.html`. Dots in directory names are
/// left alone.
pub fn with_extension(path: &str, ext: &str) -> String {
    let dir_end = path.rfind('/').map(|p| p + 1).unwrap_or(0);
    let name = &path[dir_end..];
    let stem_len = match name.rfind('.') {
        Some(dot) if dot > 0 => dot,
        _ => name.len(),
    };
    format!("{}{}.{}", &path[..dir_end], &name[..stem_len], ext)
}

/// Join non-empty `/`-separated segments.
pub fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Slugify text for use in URLs.
///
/// Lowercases, replaces runs of non-alphanumeric characters with a single
/// hyphen, strips leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_hyphen = true; // suppress leading hyphen
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
