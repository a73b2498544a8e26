//! Scanner for search/replace blocks in free-form model output.
//!
//! A block is three marker lines around two text payloads:
//!
//! ```text
//! <<<<<<< SEARCH src/main.rs
//! old lines
//! ======= src/main.rs
//! new lines
//! >>>>>>> REPLACE src/main.rs
//! ```
//!
//! Marker fences are 5-9 repeats of the marker character; the filename token
//! must be identical on all three lines of one block, which is what lets
//! blocks survive surrounding prose and nested code fences. Fenced shell
//! code blocks are extracted as shell-command records alongside the edits.

use crate::edit::block::{ParseResult, SearchReplaceBlock};

const FENCE_MIN: usize = 5;
const FENCE_MAX: usize = 9;

enum State {
    Out,
    Shell,
    InBefore,
    InAfter,
}

/// Single pass over lines. Unrelated lines between blocks are ignored;
/// divider or replace lines that don't name the pending filename are treated
/// as plain content. Only an unterminated block sets `parse_error`, and the
/// blocks completed before the fault are still returned.
pub fn parse_blocks(text: &str) -> ParseResult {
    let mut result = ParseResult::default();
    let mut state = State::Out;
    let mut filename = String::new();
    let mut before: Vec<&str> = Vec::new();
    let mut after: Vec<&str> = Vec::new();
    let mut command: Vec<&str> = Vec::new();

    for line in text.lines() {
        match state {
            State::Out => {
                if let Some(name) = head_filename(line) {
                    filename = name;
                    before.clear();
                    after.clear();
                    state = State::InBefore;
                } else if is_shell_fence_open(line) {
                    command.clear();
                    state = State::Shell;
                }
            }
            State::Shell => {
                if is_fence_close(line) {
                    if !command.is_empty() {
                        result
                            .blocks
                            .push(SearchReplaceBlock::shell(command.join("\n")));
                    }
                    state = State::Out;
                } else {
                    command.push(line);
                }
            }
            State::InBefore => {
                if divider_filename(line).as_deref() == Some(filename.as_str()) {
                    state = State::InAfter;
                } else {
                    before.push(line);
                }
            }
            State::InAfter => {
                if replace_filename(line).as_deref() == Some(filename.as_str()) {
                    result.blocks.push(SearchReplaceBlock::edit(
                        filename.clone(),
                        before.join("\n"),
                        after.join("\n"),
                    ));
                    state = State::Out;
                } else {
                    after.push(line);
                }
            }
        }
    }

    match state {
        State::Out | State::Shell => {}
        State::InBefore => {
            result.parse_error = Some(format!(
                "Expected '======= {filename}' divider before end of input"
            ));
        }
        State::InAfter => {
            result.parse_error = Some(format!(
                "Expected '>>>>>>> REPLACE {filename}' before end of input"
            ));
        }
    }

    result
}

/// `<<<<<<< SEARCH <filename>` with a 5-9 character fence.
pub(crate) fn head_filename(line: &str) -> Option<String> {
    let rest = marker_rest(line, '<')?;
    keyword_filename(rest, "SEARCH")
}

/// `======= <filename>`; no keyword on the divider line.
pub(crate) fn divider_filename(line: &str) -> Option<String> {
    let rest = marker_rest(line, '=')?;
    let rest = rest.strip_prefix(char::is_whitespace)?;
    clean_filename(rest)
}

/// `>>>>>>> REPLACE <filename>`.
pub(crate) fn replace_filename(line: &str) -> Option<String> {
    let rest = marker_rest(line, '>')?;
    keyword_filename(rest, "REPLACE")
}

fn marker_rest(line: &str, marker: char) -> Option<&str> {
    let trimmed = line.trim_start();
    let run = trimmed.chars().take_while(|&c| c == marker).count();
    if !(FENCE_MIN..=FENCE_MAX).contains(&run) {
        return None;
    }
    // Marker characters are ASCII, so the run length is a byte offset.
    Some(&trimmed[run..])
}

fn keyword_filename(rest: &str, keyword: &str) -> Option<String> {
    let rest = rest.strip_prefix(char::is_whitespace)?;
    let rest = rest.trim_start().strip_prefix(keyword)?;
    let rest = rest.strip_prefix(char::is_whitespace)?;
    clean_filename(rest)
}

/// Models decorate filename tokens with backticks, emphasis or a trailing
/// colon; strip the decoration before the cross-line identity check.
fn clean_filename(token: &str) -> Option<String> {
    let token = token.trim();
    let token = token.strip_suffix(':').unwrap_or(token);
    let token = token.trim_matches('`').trim_matches('*').trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn is_shell_fence_open(line: &str) -> bool {
    let Some(rest) = line.trim().strip_prefix("```") else {
        return false;
    };
    matches!(rest.trim(), "bash" | "sh" | "shell" | "zsh")
}

fn is_fence_close(line: &str) -> bool {
    line.trim() == "```"
}
