//! The edit-block engine: from free-form model output to safe edits.
//!
//! ## parser.rs
//! Scans a model response for `SEARCH`/`REPLACE` blocks and fenced shell
//! commands, tolerating surrounding prose. Produces a `ParseResult`; only an
//! unterminated block is an error, and blocks completed before the fault are
//! kept.
//!
//! ## matcher.rs
//! Locates the search text inside file content with a deterministic cascade
//! (exact, whitespace-insensitive, ellipsis expansion, blank-line retry) and
//! splices in the replacement. Ambiguity is refused, never guessed through.
//!
//! ## apply.rs
//! Drives a whole batch: resolves filenames, snapshots files on first
//! touch, applies blocks in order, rolls a file back to its snapshot when a
//! block against it fails, and reports everything in an `EditResult`.
//!
//! ## hint.rs / stats.rs
//! Diagnostics: closest-region feedback for failed matches and added/removed
//! line counts for successful ones.

pub mod apply;
pub mod block;
pub mod hint;
pub mod matcher;
pub mod parser;
pub mod stats;

pub use apply::{BatchApplier, CommandObserver, EditFailure, EditResult, IgnoreCommands};
pub use block::{ParseResult, SearchReplaceBlock};
pub use matcher::{replace_region, MatchError};
pub use parser::parse_blocks;
