//! SCSS → CSS.
//!
//! Every `.scss` record is compiled with grass and its destination becomes
//! `.css`. Imports resolve against the record's own directory and the source
//! root. Files whose name starts with `_` are partials: they are only ever
//! imported, so they are dropped from the output.
//!
//! ```text
//! css/_vars.scss   →  (removed)
//! css/main.scss    →  css/main.css
//! ```

use super::StageError;
use crate::naming;
use crate::pipeline::Stage;
use crate::record::{Files, SiteMetadata};
use log::debug;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Stylesheets {
    source: PathBuf,
}

impl Stylesheets {
    /// `source` is the source directory the records were read from.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Stage for Stylesheets {
    fn name(&self) -> &'static str {
        "stylesheets"
    }

    fn run(&self, files: &mut Files, _site: &mut SiteMetadata) -> Result<(), StageError> {
        let stylesheets: Vec<String> = files
            .iter()
            .filter(|(_, r)| r.destination_extension().as_deref() == Some("scss"))
            .map(|(key, _)| key.clone())
            .collect();

        for key in stylesheets {
            let Some(record) = files.get_mut(&key) else {
                continue;
            };
            if naming::last_segment(&record.destination).starts_with('_') {
                files.remove(&key);
                continue;
            }

            let scss = record
                .contents_str()
                .map_err(|_| StageError::NotUtf8(key.clone()))?
                .to_string();
            let record_dir = self.source.join(naming::parent(&key));
            let options = grass::Options::default()
                .load_path(record_dir.as_path())
                .load_path(self.source.as_path());
            let css = grass::from_string(scss, &options).map_err(|e| StageError::Stylesheet {
                path: key.clone(),
                message: e.to_string(),
            })?;

            debug!("compiled {key}");
            record.contents = css.into_bytes();
            record.destination = naming::with_extension(&record.destination, "css");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{files_from, site, write_tree};
    use tempfile::TempDir;

    #[test]
    fn compiles_scss_to_css() {
        let tmp = TempDir::new().unwrap();
        let mut files = files_from(&[("css/main.scss", "$c: red;\na { b { color: $c; } }\n")]);
        Stylesheets::new(tmp.path())
            .run(&mut files, &mut site())
            .unwrap();

        let record = &files["css/main.scss"];
        assert_eq!(record.destination, "css/main.css");
        let css = record.contents_str().unwrap();
        assert!(css.contains("a b"));
        assert!(css.contains("color: red"));
    }

    #[test]
    fn partials_resolve_from_disk_and_are_dropped() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("css/_vars.scss", "$main: #333;\n")]);
        let mut files = files_from(&[
            ("css/_vars.scss", "$main: #333;\n"),
            ("css/main.scss", "@import \"vars\";\nbody { color: $main; }\n"),
        ]);
        Stylesheets::new(tmp.path())
            .run(&mut files, &mut site())
            .unwrap();

        assert!(!files.contains_key("css/_vars.scss"));
        assert!(files["css/main.scss"].contents_str().unwrap().contains("color: #333"));
    }

    #[test]
    fn invalid_scss_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut files = files_from(&[("css/main.scss", "a { color: $undefined; }")]);
        let err = Stylesheets::new(tmp.path())
            .run(&mut files, &mut site())
            .unwrap_err();
        assert!(matches!(err, StageError::Stylesheet { ref path, .. } if path == "css/main.scss"));
    }

    #[test]
    fn plain_css_untouched() {
        let tmp = TempDir::new().unwrap();
        let mut files = files_from(&[("css/site.css", "a{}")]);
        Stylesheets::new(tmp.path())
            .run(&mut files, &mut site())
            .unwrap();
        assert_eq!(files["css/site.css"].contents_str().unwrap(), "a{}");
    }
}
