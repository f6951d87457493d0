//! `basename` metadata for every record.

use super::StageError;
use crate::naming;
use crate::pipeline::Stage;
use crate::record::{Files, SiteMetadata};

/// Writes each record's file name, without directory and extension, to its
/// `basename` metadata. Runs before anything that reads `basename`
/// (permalinks, templates).
#[derive(Debug, Default)]
pub struct Basename;

impl Stage for Basename {
    fn name(&self) -> &'static str {
        "basename"
    }

    fn run(&self, files: &mut Files, _site: &mut SiteMetadata) -> Result<(), StageError> {
        for (key, record) in files.iter_mut() {
            record.set("basename", naming::basename(key));
        }
        Ok(())
    }
}
