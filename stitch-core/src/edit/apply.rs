//! Applies a parsed batch of search/replace blocks to the working tree.
//!
//! Each touched file is snapshotted on first touch. A block that fails with
//! a restorable reason rolls its file all the way back to that snapshot and
//! poisons the file for the rest of the batch, so every file ends either
//! fully updated or byte-identical to its pre-batch state. The applier
//! always returns a complete `EditResult`; failures are data, not errors.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::console::ConsoleSink;
use crate::edit::block::{ensure_trailing_newline, SearchReplaceBlock};
use crate::edit::hint::closest_region;
use crate::edit::matcher::{replace_region, MatchError};
use crate::edit::stats::line_stats;
use crate::file::io::FileIo;
use crate::file::project::ProjectFile;
use crate::file::resolve::{resolve_filename, Resolution};
use crate::git::GitStage;
use crate::project::ProjectView;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EditFailure {
    NoFilename,
    FileNotFound,
    NoMatch,
    AmbiguousMatch,
    IoError,
}

/// Receives shell-command blocks; the engine never executes them.
pub trait CommandObserver: Send + Sync {
    fn on_shell_command(&self, command: &str);
}

#[derive(Debug, Clone, Default)]
pub struct IgnoreCommands;

impl CommandObserver for IgnoreCommands {
    fn on_shell_command(&self, _command: &str) {}
}

static IGNORE_COMMANDS: IgnoreCommands = IgnoreCommands;

/// Outcome of one batch. `original_contents` holds the pre-batch content of
/// every file the batch touched, captured on first touch; callers can use it
/// for manual rollback after an abort.
#[derive(Debug, Default)]
pub struct EditResult {
    pub original_contents: HashMap<ProjectFile, String>,
    pub failed_blocks: Vec<(SearchReplaceBlock, EditFailure)>,
}

impl EditResult {
    pub fn is_clean(&self) -> bool {
        self.failed_blocks.is_empty()
    }
}

pub struct BatchApplier<'a> {
    io: &'a dyn FileIo,
    view: &'a dyn ProjectView,
    git: &'a dyn GitStage,
    console: &'a dyn ConsoleSink,
    commands: &'a dyn CommandObserver,
}

impl<'a> BatchApplier<'a> {
    pub fn new(
        io: &'a dyn FileIo,
        view: &'a dyn ProjectView,
        git: &'a dyn GitStage,
        console: &'a dyn ConsoleSink,
    ) -> Self {
        Self {
            io,
            view,
            git,
            console,
            commands: &IGNORE_COMMANDS,
        }
    }

    pub fn with_commands(mut self, commands: &'a dyn CommandObserver) -> Self {
        self.commands = commands;
        self
    }

    /// Apply `blocks` in input order. Must not be invoked re-entrantly for
    /// the same project; the engine assumes exclusive write access for the
    /// duration of the batch.
    pub async fn apply(&self, blocks: &[SearchReplaceBlock]) -> EditResult {
        let mut result = EditResult::default();
        // Files that already rolled back this batch, with the reason.
        let mut poisoned: HashMap<ProjectFile, EditFailure> = HashMap::new();
        // Files we have attempted to write this batch.
        let mut touched: HashSet<ProjectFile> = HashSet::new();

        for block in blocks {
            if let Some(command) = &block.shell_command {
                self.commands.on_shell_command(command);
                continue;
            }

            let Some(name) = block.filename.as_deref() else {
                result
                    .failed_blocks
                    .push((block.clone(), EditFailure::NoFilename));
                continue;
            };

            let file = match resolve_filename(self.view, self.io, name, block.creates_file())
                .await
            {
                Ok(Resolution::Resolved(file)) => file,
                Ok(Resolution::Ambiguous(candidates)) => {
                    let listed: Vec<String> =
                        candidates.iter().map(ToString::to_string).collect();
                    self.console.tool_error(&format!(
                        "Filename '{name}' matches {} project files: {}",
                        listed.len(),
                        listed.join(", ")
                    ));
                    result
                        .failed_blocks
                        .push((block.clone(), EditFailure::FileNotFound));
                    continue;
                }
                Ok(Resolution::NotFound) => {
                    self.console
                        .tool_error(&format!("No project file matches '{name}'"));
                    result
                        .failed_blocks
                        .push((block.clone(), EditFailure::FileNotFound));
                    continue;
                }
                Err(error) => {
                    tracing::warn!(?error, name, "Filename resolution failed");
                    result
                        .failed_blocks
                        .push((block.clone(), EditFailure::FileNotFound));
                    continue;
                }
            };

            if let Some(reason) = poisoned.get(&file) {
                result.failed_blocks.push((block.clone(), *reason));
                continue;
            }

            let existed = self.io.exists(&file).await;
            let current = if existed {
                match self.io.read(&file).await {
                    Ok(content) => content,
                    Err(error) => {
                        self.console
                            .tool_error(&format!("Failed to read {file}: {error:#}"));
                        poisoned.insert(file.clone(), EditFailure::IoError);
                        result
                            .failed_blocks
                            .push((block.clone(), EditFailure::IoError));
                        continue;
                    }
                }
            } else {
                String::new()
            };

            result
                .original_contents
                .entry(file.clone())
                .or_insert_with(|| current.clone());

            let content = ensure_trailing_newline(current);
            let target = if block.creates_file() {
                // Blank search text replaces the whole file and never
                // matches an interior region.
                String::new()
            } else {
                block.before_text.clone()
            };

            match replace_region(&content, &target, &block.after_text) {
                Ok(updated) => {
                    touched.insert(file.clone());
                    if let Err(error) = self.io.write(&file, &updated).await {
                        self.console
                            .tool_error(&format!("Failed to write {file}: {error:#}"));
                        self.rollback(&file, &result.original_contents).await;
                        poisoned.insert(file.clone(), EditFailure::IoError);
                        result
                            .failed_blocks
                            .push((block.clone(), EditFailure::IoError));
                        continue;
                    }

                    let (added, removed) = line_stats(&content, &updated);
                    self.console
                        .tool_output(&format!("{file}: +{added} -{removed}"));

                    if !existed {
                        if let Err(error) =
                            self.git.add(std::slice::from_ref(&file)).await
                        {
                            self.console.system_output(&format!(
                                "Failed to stage new file {file}: {error:#}"
                            ));
                        }
                    }
                }
                Err(MatchError::NoMatch) => {
                    match closest_region(&content, &target) {
                        Some(hint) => self.console.tool_error(&format!(
                            "No match for search text in {file}. {}",
                            hint.describe()
                        )),
                        None => self
                            .console
                            .tool_error(&format!("No match for search text in {file}")),
                    }
                    if touched.contains(&file) {
                        self.rollback(&file, &result.original_contents).await;
                    }
                    poisoned.insert(file.clone(), EditFailure::NoMatch);
                    result
                        .failed_blocks
                        .push((block.clone(), EditFailure::NoMatch));
                }
                Err(MatchError::Ambiguous(count)) => {
                    self.console.tool_error(&format!(
                        "Search text matches {count} locations in {file}; include more surrounding context"
                    ));
                    if touched.contains(&file) {
                        self.rollback(&file, &result.original_contents).await;
                    }
                    poisoned.insert(file.clone(), EditFailure::AmbiguousMatch);
                    result
                        .failed_blocks
                        .push((block.clone(), EditFailure::AmbiguousMatch));
                }
            }
        }

        result
    }

    /// Best effort: a failure during restoration is reported and the file
    /// keeps the state of the last successful write.
    async fn rollback(&self, file: &ProjectFile, snapshots: &HashMap<ProjectFile, String>) {
        let Some(snapshot) = snapshots.get(file) else {
            return;
        };
        if let Err(error) = self.io.write(file, snapshot).await {
            self.console.tool_error(&format!(
                "Failed to restore {file} after a failed edit: {error:#}"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::RecordingConsole;
    use crate::file::io::DiskIo;
    use crate::git::{GitStage, NoGit};
    use crate::project::MemoryProject;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        temp: TempDir,
        view: MemoryProject,
        console: RecordingConsole,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = tempdir().unwrap();
            let view = MemoryProject::new(temp.path());
            Self {
                temp,
                view,
                console: RecordingConsole::default(),
            }
        }

        fn write(&self, relative: &str, content: &str) {
            fs::write(self.temp.path().join(relative), content).unwrap();
        }

        fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.temp.path().join(relative)).unwrap()
        }

        async fn apply(&self, blocks: &[SearchReplaceBlock]) -> EditResult {
            BatchApplier::new(&DiskIo, &self.view, &NoGit, &self.console)
                .apply(blocks)
                .await
        }
    }

    #[tokio::test]
    async fn test_basic_replace() {
        let fixture = Fixture::new();
        fixture.write("f.txt", "line1\nfoo\nline3\n");

        let block = SearchReplaceBlock::edit("f.txt", "foo\n", "bar\n");
        let result = fixture.apply(&[block]).await;

        assert!(result.is_clean());
        assert_eq!(fixture.read("f.txt"), "line1\nbar\nline3\n");
        assert_eq!(
            result.original_contents.get(&fixture.view.file("f.txt")),
            Some(&"line1\nfoo\nline3\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_ambiguity_leaves_file_unchanged() {
        let fixture = Fixture::new();
        fixture.write("f.txt", "a\nb\na\n");

        let block = SearchReplaceBlock::edit("f.txt", "a\n", "x\n");
        let result = fixture.apply(&[block.clone()]).await;

        assert_eq!(fixture.read("f.txt"), "a\nb\na\n");
        assert_eq!(
            result.failed_blocks,
            vec![(block, EditFailure::AmbiguousMatch)]
        );
    }

    #[tokio::test]
    async fn test_file_creation_stages_via_git() {
        struct RecordingGit {
            added: Mutex<Vec<ProjectFile>>,
        }

        #[async_trait]
        impl GitStage for RecordingGit {
            async fn add(&self, files: &[ProjectFile]) -> Result<()> {
                self.added.lock().unwrap().extend_from_slice(files);
                Ok(())
            }
        }

        let fixture = Fixture::new();
        let git = RecordingGit {
            added: Mutex::new(Vec::new()),
        };

        let block = SearchReplaceBlock::edit("new.txt", "", "hello\n");
        let result = BatchApplier::new(&DiskIo, &fixture.view, &git, &fixture.console)
            .apply(&[block])
            .await;

        assert!(result.is_clean());
        assert_eq!(fixture.read("new.txt"), "hello\n");
        assert_eq!(
            git.added.lock().unwrap().as_slice(),
            &[fixture.view.file("new.txt")]
        );
    }

    #[tokio::test]
    async fn test_staging_failure_is_not_fatal() {
        struct FailingGit;

        #[async_trait]
        impl GitStage for FailingGit {
            async fn add(&self, _files: &[ProjectFile]) -> Result<()> {
                anyhow::bail!("no repository")
            }
        }

        let fixture = Fixture::new();
        let block = SearchReplaceBlock::edit("new.txt", "", "hello\n");
        let result = BatchApplier::new(&DiskIo, &fixture.view, &FailingGit, &fixture.console)
            .apply(&[block])
            .await;

        assert!(result.is_clean());
        assert_eq!(fixture.read("new.txt"), "hello\n");
        let lines = fixture.console.lines();
        assert!(lines.iter().any(|(_, line)| line.contains("stage")));
    }

    #[tokio::test]
    async fn test_transactional_rollback_on_late_failure() {
        let fixture = Fixture::new();
        let original = "alpha\nbeta\ngamma\n";
        fixture.write("f.txt", original);

        let blocks = vec![
            SearchReplaceBlock::edit("f.txt", "alpha\n", "ALPHA\n"),
            SearchReplaceBlock::edit("f.txt", "beta\n", "BETA\n"),
            SearchReplaceBlock::edit("f.txt", "does not exist\n", "x\n"),
        ];
        let result = fixture.apply(&blocks).await;

        assert_eq!(fixture.read("f.txt"), original);
        assert_eq!(result.failed_blocks.len(), 1);
        assert_eq!(result.failed_blocks[0].1, EditFailure::NoMatch);
    }

    #[tokio::test]
    async fn test_failure_poisons_later_blocks_on_same_file() {
        let fixture = Fixture::new();
        let original = "alpha\nbeta\n";
        fixture.write("f.txt", original);

        let blocks = vec![
            SearchReplaceBlock::edit("f.txt", "missing\n", "x\n"),
            SearchReplaceBlock::edit("f.txt", "alpha\n", "ALPHA\n"),
        ];
        let result = fixture.apply(&blocks).await;

        // The second block would succeed in isolation, but applying it
        // after the rollback would leave the file partially updated.
        assert_eq!(fixture.read("f.txt"), original);
        assert_eq!(result.failed_blocks.len(), 2);
        assert!(result
            .failed_blocks
            .iter()
            .all(|(_, reason)| *reason == EditFailure::NoMatch));
    }

    #[tokio::test]
    async fn test_failure_on_one_file_does_not_stop_others() {
        let fixture = Fixture::new();
        fixture.write("bad.txt", "content\n");
        fixture.write("good.txt", "old\n");

        let blocks = vec![
            SearchReplaceBlock::edit("bad.txt", "missing\n", "x\n"),
            SearchReplaceBlock::edit("good.txt", "old\n", "new\n"),
        ];
        let result = fixture.apply(&blocks).await;

        assert_eq!(fixture.read("good.txt"), "new\n");
        assert_eq!(result.failed_blocks.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_filename_is_recorded() {
        let fixture = Fixture::new();
        let block = SearchReplaceBlock {
            filename: None,
            before_text: "a\n".to_string(),
            after_text: "b\n".to_string(),
            shell_command: None,
        };

        let result = fixture.apply(&[block.clone()]).await;
        assert_eq!(result.failed_blocks, vec![(block, EditFailure::NoFilename)]);
    }

    #[tokio::test]
    async fn test_unresolvable_filename_is_recorded() {
        let fixture = Fixture::new();
        let block = SearchReplaceBlock::edit("ghost.txt", "a\n", "b\n");

        let result = fixture.apply(&[block.clone()]).await;
        assert_eq!(
            result.failed_blocks,
            vec![(block, EditFailure::FileNotFound)]
        );
    }

    #[tokio::test]
    async fn test_shell_blocks_reach_the_observer() {
        #[derive(Default)]
        struct RecordingCommands {
            seen: Mutex<Vec<String>>,
        }

        impl CommandObserver for RecordingCommands {
            fn on_shell_command(&self, command: &str) {
                self.seen.lock().unwrap().push(command.to_string());
            }
        }

        let fixture = Fixture::new();
        let commands = RecordingCommands::default();
        let blocks = vec![SearchReplaceBlock::shell("cargo test")];

        let result = BatchApplier::new(&DiskIo, &fixture.view, &NoGit, &fixture.console)
            .with_commands(&commands)
            .apply(&blocks)
            .await;

        assert!(result.is_clean());
        assert_eq!(commands.seen.lock().unwrap().as_slice(), &["cargo test"]);
    }

    #[tokio::test]
    async fn test_snapshot_captured_on_first_touch_only() {
        let fixture = Fixture::new();
        fixture.write("f.txt", "one\ntwo\n");

        let blocks = vec![
            SearchReplaceBlock::edit("f.txt", "one\n", "1\n"),
            SearchReplaceBlock::edit("f.txt", "two\n", "2\n"),
        ];
        let result = fixture.apply(&blocks).await;

        assert!(result.is_clean());
        assert_eq!(fixture.read("f.txt"), "1\n2\n");
        // The snapshot is the pre-batch content, not the post-first-block one.
        assert_eq!(
            result.original_contents.get(&fixture.view.file("f.txt")),
            Some(&"one\ntwo\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_match_reports_closest_region() {
        let fixture = Fixture::new();
        fixture.write("f.txt", "fn apply() {\n    run();\n}\n");

        let block = SearchReplaceBlock::edit("f.txt", "fn apply() {\n    run()\n}\n", "x\n");
        fixture.apply(&[block]).await;

        let errors = fixture.console.errors();
        assert!(errors.iter().any(|e| e.contains("Closest match")), "{errors:?}");
    }
}
