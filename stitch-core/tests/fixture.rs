//! Shared test fixture: a temp-dir project the engine edits for real.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use stitch_core::console::RecordingConsole;
use stitch_core::edit::{parse_blocks, BatchApplier, EditResult};
use stitch_core::file::DiskIo;
use stitch_core::git::NoGit;
use stitch_core::project::MemoryProject;

pub struct Project {
    dir: TempDir,
    pub view: MemoryProject,
    pub console: RecordingConsole,
}

impl Project {
    #[allow(dead_code)]
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let dir = TempDir::new().unwrap();
        let view = MemoryProject::new(dir.path());
        Self {
            dir,
            view,
            console: RecordingConsole::default(),
        }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[allow(dead_code)]
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[allow(dead_code)]
    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join(relative)).unwrap()
    }

    #[allow(dead_code)]
    pub fn exists(&self, relative: &str) -> bool {
        self.dir.path().join(relative).exists()
    }

    /// Parse a whole model response and apply every block it contains.
    #[allow(dead_code)]
    pub async fn apply_response(&self, response: &str) -> EditResult {
        let parsed = parse_blocks(response);
        assert!(
            parsed.parse_error.is_none(),
            "unexpected parse error: {:?}",
            parsed.parse_error
        );
        BatchApplier::new(&DiskIo, &self.view, &NoGit, &self.console)
            .apply(&parsed.blocks)
            .await
    }
}
