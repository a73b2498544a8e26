//! Incremental rendering of streaming model output.
//!
//! Every render tick re-parses the full prefix received so far:
//!
//! 1. `flex.rs` turns the source into HTML where edit blocks and top-level
//!    code fences are placeholder tags and ordinary markdown blocks carry
//!    stable IDs derived from their byte offset (`id.rs`).
//! 2. `mini.rs` walks that HTML once and splits it into a flat list of
//!    typed component descriptors.
//! 3. `reconcile.rs` diffs the list against the previous tick by ID and
//!    hands the hosting view a minimal set of create/update/remove
//!    operations.
//!
//! Because the IDs are positional, append-only growth never tears down
//! components that are already on screen.

pub mod components;
pub mod flex;
pub mod id;
pub mod mini;
pub mod reconcile;

pub use components::{ComponentData, EditBlockStatus};
pub use id::{composite_id, node_id, ComponentId, NodeKind};
pub use reconcile::{Reconciler, ViewOp};

/// Parse a (possibly partial) model response into its component list.
pub fn render_components(source: &str) -> Vec<ComponentData> {
    mini::parse_components(&flex::render_tagged_html(source))
}
