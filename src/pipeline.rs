//! The build orchestrator.
//!
//! A [`Pipeline`] holds a source directory, a destination directory and an
//! ordered list of [`Stage`]s. One build walks through these states:
//!
//! ```text
//! Configured → Cleaning → Reading → Running(stage)… → Writing → Done
//!                  │          │            │              │
//!                  └──────────┴────────────┴──────────────┴──→ Failed
//! ```
//!
//! The whole record set stays in memory between reading and writing. A stage
//! that returns `Err` stops the build before anything is written; the error
//! comes back wrapped with the stage's name.
//!
//! Progress is published as [`BuildEvent`]s on an optional channel so the CLI
//! can print while the build runs.

use crate::config::{EnvironmentSettings, SiteConfig};
use crate::record::{Files, SiteMetadata};
use crate::source::{self, SourceError};
use crate::stages::{
    Basename, Collections, Excerpts, Markdown, Permalinks, Render, StageError, Stylesheets, Tags,
    TemplatesByCollection,
};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// One transformation of the full record set.
///
/// Returning `Ok(())` signals the stage is done and the next may start.
pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, files: &mut Files, site: &mut SiteMetadata) -> Result<(), StageError>;
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: StageError,
    },
    #[error("{first} and {second} would both be written to {destination}")]
    DestinationConflict {
        destination: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Configured,
    Cleaning,
    Reading,
    Running(&'static str),
    Writing,
    Done,
    Failed,
}

/// Progress events sent while a build runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    Cleaned { destination: PathBuf },
    SourceRead { source: PathBuf, records: usize },
    StageFinished { stage: &'static str, records: usize },
}

/// One file written by a build.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFile {
    /// Record key (source-relative path).
    pub source: String,
    /// Destination-relative output path.
    pub destination: String,
    pub title: Option<String>,
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub destination: PathBuf,
    pub written: Vec<WrittenFile>,
}

pub struct Pipeline {
    source: PathBuf,
    destination: PathBuf,
    clean: bool,
    environment: EnvironmentSettings,
    stages: Vec<Box<dyn Stage>>,
    state: BuildState,
}

impl Pipeline {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        environment: EnvironmentSettings,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            clean: true,
            environment,
            stages: Vec::new(),
            state: BuildState::Configured,
        }
    }

    /// Whether to remove the destination directory before reading.
    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Append a stage. Stages run in the order they are added.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Run every stage over an in-memory record set.
    pub fn run(
        &mut self,
        files: &mut Files,
        site: &mut SiteMetadata,
        events: Option<&Sender<BuildEvent>>,
    ) -> Result<(), BuildError> {
        for stage in &self.stages {
            let name = stage.name();
            self.state = BuildState::Running(name);
            debug!("running stage {name} over {} records", files.len());
            stage
                .run(files, site)
                .map_err(|source| BuildError::Stage { stage: name, source })?;
            send(
                events,
                BuildEvent::StageFinished {
                    stage: name,
                    records: files.len(),
                },
            );
        }
        Ok(())
    }

    /// Clean, read, run all stages, write.
    pub fn build(&mut self, events: Option<Sender<BuildEvent>>) -> Result<BuildReport, BuildError> {
        let result = self.try_build(events.as_ref());
        self.state = if result.is_ok() {
            BuildState::Done
        } else {
            BuildState::Failed
        };
        result
    }

    fn try_build(&mut self, events: Option<&Sender<BuildEvent>>) -> Result<BuildReport, BuildError> {
        if self.clean {
            self.state = BuildState::Cleaning;
            if self.destination.exists() {
                fs::remove_dir_all(&self.destination)?;
            }
            send(
                events,
                BuildEvent::Cleaned {
                    destination: self.destination.clone(),
                },
            );
        }

        self.state = BuildState::Reading;
        let mut files = source::read_source(&self.source)?;
        send(
            events,
            BuildEvent::SourceRead {
                source: self.source.clone(),
                records: files.len(),
            },
        );

        let mut site = SiteMetadata::new(self.environment.clone());
        self.run(&mut files, &mut site, events)?;

        self.state = BuildState::Writing;
        let written = write_files(&files, &self.destination)?;
        Ok(BuildReport {
            destination: self.destination.clone(),
            written,
        })
    }
}

fn send(events: Option<&Sender<BuildEvent>>, event: BuildEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

/// Write every record under `destination`. Destinations are checked for
/// collisions before the first file is written.
fn write_files(files: &Files, destination: &Path) -> Result<Vec<WrittenFile>, BuildError> {
    let mut targets: BTreeMap<&str, &str> = BTreeMap::new();
    for (key, record) in files {
        if let Some(first) = targets.insert(&record.destination, key) {
            return Err(BuildError::DestinationConflict {
                destination: record.destination.clone(),
                first: first.to_string(),
                second: key.clone(),
            });
        }
    }

    let mut written = Vec::with_capacity(files.len());
    for (key, record) in files {
        let path = destination.join(&record.destination);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &record.contents)?;
        written.push(WrittenFile {
            source: key.clone(),
            destination: record.destination.clone(),
            title: record.get_str("title").map(str::to_string),
            template: record.get_str("template").map(str::to_string),
        });
    }
    Ok(written)
}

/// The site pipeline for a project root: every stage, in build order.
pub fn site_pipeline(
    root: &Path,
    config: &SiteConfig,
    environment: EnvironmentSettings,
) -> Pipeline {
    let source = root.join(&config.source);
    Pipeline::new(&source, root.join(&config.destination), environment.clone())
        .clean(config.clean)
        .stage(Collections::new(config.collections.clone()))
        .stage(Basename)
        .stage(TemplatesByCollection::new(config.templates.clone()))
        .stage(Markdown::new(config.markdown.clone()))
        .stage(Excerpts::new(Markdown::new(config.markdown.clone())))
        .stage(Permalinks::new(config.permalinks.pattern.clone()))
        .stage(Tags::new(config.tags.clone()))
        .stage(Render::new(
            root.join(&config.rendering.directory),
            config.rendering.partials.clone(),
            environment,
        ))
        .stage(Stylesheets::new(source))
}
