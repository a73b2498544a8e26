//! Project enumeration as the path resolver consumes it.
//!
//! The resolver cascade needs three views of the project: the files the
//! current session may edit, the files the version control system tracks,
//! and the full on-disk file set. `DiskProject` walks the real tree;
//! `MemoryProject` backs tests and previews with explicit lists.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ignore::WalkBuilder;

use crate::file::project::ProjectFile;

#[async_trait]
pub trait ProjectView: Send + Sync {
    /// Files the current session is allowed to edit.
    async fn editable_files(&self) -> HashSet<ProjectFile>;

    /// Files tracked by version control, in repository order.
    async fn tracked_files(&self) -> Vec<ProjectFile>;

    /// Every file in the project. May hit the filesystem.
    async fn all_files(&self) -> Result<Vec<ProjectFile>>;

    /// Interpret a relative path string as a file under the project root.
    fn to_file(&self, relative: &str) -> Result<ProjectFile>;
}

/// Project view over a real directory tree. The editable and tracked sets
/// are supplied by the host (session state and the git layer respectively);
/// `all_files` walks the tree on demand.
pub struct DiskProject {
    root: Arc<PathBuf>,
    editable: HashSet<ProjectFile>,
    tracked: Vec<ProjectFile>,
}

impl DiskProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
            editable: HashSet::new(),
            tracked: Vec::new(),
        }
    }

    pub fn with_editable(mut self, editable: impl IntoIterator<Item = ProjectFile>) -> Self {
        self.editable = editable.into_iter().collect();
        self
    }

    pub fn with_tracked(mut self, tracked: impl IntoIterator<Item = ProjectFile>) -> Self {
        self.tracked = tracked.into_iter().collect();
        self
    }

    pub fn root(&self) -> Arc<PathBuf> {
        self.root.clone()
    }
}

#[async_trait]
impl ProjectView for DiskProject {
    async fn editable_files(&self) -> HashSet<ProjectFile> {
        self.editable.clone()
    }

    async fn tracked_files(&self) -> Vec<ProjectFile> {
        self.tracked.clone()
    }

    async fn all_files(&self) -> Result<Vec<ProjectFile>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || walk_files(root))
            .await
            .context("File enumeration task failed")?
    }

    fn to_file(&self, relative: &str) -> Result<ProjectFile> {
        ProjectFile::new(self.root.clone(), relative)
    }
}

fn walk_files(root: Arc<PathBuf>) -> Result<Vec<ProjectFile>> {
    let mut files = Vec::new();

    for result in WalkBuilder::new(root.as_path())
        .hidden(false)
        .filter_entry(|entry| entry.file_name().to_string_lossy() != ".git")
        .build()
    {
        let entry = result?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root.as_path()) else {
            // Likely a symlink outside of the project root
            continue;
        };

        files.push(ProjectFile::new(root.clone(), relative)?);
    }

    Ok(files)
}

/// In-memory project view for tests and hosts that already hold the lists.
#[derive(Default)]
pub struct MemoryProject {
    root: Arc<PathBuf>,
    editable: HashSet<ProjectFile>,
    tracked: Vec<ProjectFile>,
    all: Vec<ProjectFile>,
}

impl MemoryProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
            ..Default::default()
        }
    }

    pub fn file(&self, relative: &str) -> ProjectFile {
        ProjectFile::new(self.root.clone(), relative).unwrap()
    }

    pub fn with_editable(mut self, relatives: &[&str]) -> Self {
        self.editable = relatives.iter().map(|r| self.file(r)).collect();
        self
    }

    pub fn with_tracked(mut self, relatives: &[&str]) -> Self {
        self.tracked = relatives.iter().map(|r| self.file(r)).collect();
        self
    }

    pub fn with_all(mut self, relatives: &[&str]) -> Self {
        self.all = relatives.iter().map(|r| self.file(r)).collect();
        self
    }
}

#[async_trait]
impl ProjectView for MemoryProject {
    async fn editable_files(&self) -> HashSet<ProjectFile> {
        self.editable.clone()
    }

    async fn tracked_files(&self) -> Vec<ProjectFile> {
        self.tracked.clone()
    }

    async fn all_files(&self) -> Result<Vec<ProjectFile>> {
        Ok(self.all.clone())
    }

    fn to_file(&self, relative: &str) -> Result<ProjectFile> {
        ProjectFile::new(self.root.clone(), relative)
    }
}
