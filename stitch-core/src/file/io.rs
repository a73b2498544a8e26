use crate::file::project::ProjectFile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

/// File I/O as the edit engine consumes it. Text is UTF-8 and line endings
/// are preserved as read; hosts may substitute an in-memory implementation
/// for tests or previews.
#[async_trait]
pub trait FileIo: Send + Sync {
    async fn exists(&self, file: &ProjectFile) -> bool;
    async fn read(&self, file: &ProjectFile) -> Result<String>;
    async fn write(&self, file: &ProjectFile, content: &str) -> Result<()>;

    fn basename(&self, file: &ProjectFile) -> String {
        file.file_name()
    }
}

/// The on-disk implementation used in production.
#[derive(Debug, Clone, Default)]
pub struct DiskIo;

#[async_trait]
impl FileIo for DiskIo {
    async fn exists(&self, file: &ProjectFile) -> bool {
        let path = file.abs_path();
        path.is_file()
    }

    async fn read(&self, file: &ProjectFile) -> Result<String> {
        let path = file.abs_path();
        if !path.exists() {
            anyhow::bail!("File not found: {file}");
        }
        if !path.is_file() {
            anyhow::bail!("Path is not a file: {file}");
        }

        fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read file: {file}"))
    }

    async fn write(&self, file: &ProjectFile, content: &str) -> Result<()> {
        let path = file.abs_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create parent directories for: {file}"))?;
        }

        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write file: {file}"))
    }
}
