use serde::{Deserialize, Serialize};

/// One parsed instruction from a model response: either a search/replace
/// edit against a single file, or a shell command the host may surface.
/// Exactly one of the two shapes is populated; the constructors enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReplaceBlock {
    pub filename: Option<String>,
    pub before_text: String,
    pub after_text: String,
    pub shell_command: Option<String>,
}

impl SearchReplaceBlock {
    pub fn edit(
        filename: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self {
            filename: Some(filename.into()),
            before_text: ensure_trailing_newline(before.into()),
            after_text: ensure_trailing_newline(after.into()),
            shell_command: None,
        }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            filename: None,
            before_text: String::new(),
            after_text: String::new(),
            shell_command: Some(command.into()),
        }
    }

    pub fn is_shell(&self) -> bool {
        self.shell_command.is_some()
    }

    /// A blank search text means "create the file, or replace it entirely".
    pub fn creates_file(&self) -> bool {
        !self.is_shell() && self.before_text.trim().is_empty()
    }
}

/// Blocks extracted from one model response. On a malformed block the error
/// is recorded and everything parsed before the fault is retained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub blocks: Vec<SearchReplaceBlock>,
    pub parse_error: Option<String>,
}

/// Texts end with a newline unless empty.
pub fn ensure_trailing_newline(mut text: String) -> String {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
