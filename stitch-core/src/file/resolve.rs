//! Maps a possibly-partial or misspelled filename from a model response to
//! a concrete project file.
//!
//! The cascade widens one scope at a time — exact path, editable set,
//! tracked files, whole project — and stops at the first scope with a
//! unique hit. Ambiguity inside a scope is surfaced, never resolved by
//! falling through to a wider one.

use std::path::Path;

use anyhow::Result;

use crate::file::io::FileIo;
use crate::file::project::ProjectFile;
use crate::project::ProjectView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ProjectFile),
    Ambiguous(Vec<ProjectFile>),
    NotFound,
}

/// Resolve `name` against the project. `create_new` is set for file-creation
/// blocks, for which the exact-path step always succeeds.
pub async fn resolve_filename(
    view: &dyn ProjectView,
    io: &dyn FileIo,
    name: &str,
    create_new: bool,
) -> Result<Resolution> {
    // Exact path relative to the project root.
    if let Ok(candidate) = view.to_file(name) {
        if create_new || io.exists(&candidate).await {
            return Ok(Resolution::Resolved(candidate));
        }
    }

    let wanted = last_segment(name);

    // Basename match among the files the session may edit.
    let mut editable: Vec<ProjectFile> = view
        .editable_files()
        .await
        .into_iter()
        .filter(|f| f.file_name().eq_ignore_ascii_case(wanted))
        .collect();
    editable.sort();
    match editable.len() {
        1 => return Ok(Resolution::Resolved(editable.remove(0))),
        n if n >= 2 => return Ok(Resolution::Ambiguous(editable)),
        _ => {}
    }

    // Substring match over tracked files, narrowed by basename on a tie.
    let mut tracked: Vec<ProjectFile> = view
        .tracked_files()
        .await
        .into_iter()
        .filter(|f| f.to_string().contains(name))
        .collect();
    match tracked.len() {
        0 => {}
        1 => return Ok(Resolution::Resolved(tracked.remove(0))),
        _ => {
            let mut narrowed: Vec<ProjectFile> = tracked
                .iter()
                .filter(|f| f.file_name().eq_ignore_ascii_case(wanted))
                .cloned()
                .collect();
            return match narrowed.len() {
                1 => Ok(Resolution::Resolved(narrowed.remove(0))),
                n if n >= 2 => Ok(Resolution::Ambiguous(narrowed)),
                _ => Ok(Resolution::Ambiguous(tracked)),
            };
        }
    }

    // Basename match over the whole project.
    let mut all: Vec<ProjectFile> = view
        .all_files()
        .await?
        .into_iter()
        .filter(|f| f.file_name().eq_ignore_ascii_case(wanted))
        .collect();
    all.sort();
    match all.len() {
        0 => Ok(Resolution::NotFound),
        1 => Ok(Resolution::Resolved(all.remove(0))),
        _ => Ok(Resolution::Ambiguous(all)),
    }
}

fn last_segment(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|segment| segment.to_str())
        .unwrap_or(name)
}
