use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;

/// A file addressed relative to a project root.
///
/// The root is shared and immutable; the relative path is normalized on
/// construction so two references to the same file compare equal regardless
/// of how the path was spelled (`./src/lib.rs`, `src/./lib.rs`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectFile {
    root: Arc<PathBuf>,
    relative: PathBuf,
}

impl ProjectFile {
    pub fn new(root: Arc<PathBuf>, relative: impl AsRef<Path>) -> anyhow::Result<Self> {
        let relative = normalize(relative.as_ref())?;
        Ok(Self { root, relative })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// The absolute on-disk location of this file.
    pub fn abs_path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    /// Last path segment, lossily converted. Empty only for a degenerate
    /// root-only path, which `new` rejects.
    pub fn file_name(&self) -> String {
        self.relative
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for ProjectFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative.display())
    }
}

/// Strip `.` components and reject anything that could escape the root.
fn normalize(path: &Path) -> anyhow::Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => out.push(name),
            Component::CurDir => {}
            Component::ParentDir => bail!("Path must not contain '..': {path:?}"),
            Component::RootDir | Component::Prefix(_) => {
                bail!("Path must be relative to the project root: {path:?}")
            }
        }
    }
    if out.as_os_str().is_empty() {
        bail!("Empty relative path");
    }
    Ok(out)
}
