//! Optional git staging interface.
//!
//! The batch applier stages newly created files so they show up in the next
//! commit; a staging failure is reported and never fails the batch.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;

use crate::file::project::ProjectFile;

#[async_trait]
pub trait GitStage: Send + Sync {
    async fn add(&self, files: &[ProjectFile]) -> Result<()>;
}

/// No-op staging for projects without a repository.
#[derive(Debug, Clone, Default)]
pub struct NoGit;

#[async_trait]
impl GitStage for NoGit {
    async fn add(&self, _files: &[ProjectFile]) -> Result<()> {
        Ok(())
    }
}

/// Stages files by shelling out to the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl GitStage for GitCli {
    async fn add(&self, files: &[ProjectFile]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        let mut command = Command::new("git");
        command
            .arg("add")
            .arg("--")
            .current_dir(&self.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for file in files {
            command.arg(file.relative());
        }

        tracing::debug!(?files, root = ?self.root, "Staging files");

        let output = command.spawn()?.wait_with_output().await?;
        if !output.status.success() {
            let err = String::from_utf8_lossy(&output.stderr).to_string();
            anyhow::bail!(
                "git add exited with {}: {}",
                output.status.code().unwrap_or(1),
                err.trim()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_no_git_accepts_anything() {
        let file =
            ProjectFile::new(Arc::new(PathBuf::from("/project")), "new.txt").unwrap();
        NoGit.add(&[file]).await.unwrap();
    }

    #[tokio::test]
    async fn test_git_cli_fails_outside_repository() {
        let temp = tempfile::tempdir().unwrap();
        let file =
            ProjectFile::new(Arc::new(temp.path().to_path_buf()), "new.txt").unwrap();

        let git = GitCli::new(temp.path());
        let result = git.add(&[file]).await;
        assert!(result.is_err());
    }
}
