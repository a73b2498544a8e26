pub mod console;
pub mod edit;
pub mod file;
pub mod git;
pub mod project;
pub mod render;

// Public library API - hosts embedding the engine should only need these
// types, but everything is public if you want to reach deeper.
pub use console::{ConsoleSink, TracingConsole};
pub use edit::{
    parse_blocks, BatchApplier, EditFailure, EditResult, ParseResult, SearchReplaceBlock,
};
pub use file::{DiskIo, FileIo, ProjectFile, Resolution};
pub use git::{GitCli, GitStage, NoGit};
pub use project::{DiskProject, MemoryProject, ProjectView};
pub use render::{render_components, ComponentData, Reconciler, ViewOp};
