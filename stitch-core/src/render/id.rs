use std::sync::atomic::{AtomicI64, Ordering};

/// Stable identifier carried by every rendered component.
pub type ComponentId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Markdown,
    CodeFence,
    EditBlock,
}

impl NodeKind {
    const fn tag(self) -> i64 {
        match self {
            NodeKind::Markdown => 3,
            NodeKind::CodeFence => 5,
            NodeKind::EditBlock => 7,
        }
    }
}

/// Derive an ID from a node's byte offset in the source and its kind.
///
/// Re-parsing a growing prefix sees unchanged nodes at unchanged offsets, so
/// they keep their IDs and the hosting view can reuse their components.
/// Collisions across distinct (offset, kind) pairs are tolerated; they only
/// cost a spurious rebuild.
pub fn node_id(offset: usize, kind: NodeKind) -> ComponentId {
    // Masking the sign bit keeps the ID non-negative without the overflow
    // panic `abs` has at i64::MIN.
    31i64
        .wrapping_mul(offset as i64)
        .wrapping_add(kind.tag())
        & i64::MAX
}

static COMPOSITE_IDS: AtomicI64 = AtomicI64::new(1);

/// Composites are synthesized by the mini-parser, not parsed from source,
/// so their IDs come from a plain counter.
pub fn composite_id() -> ComponentId {
    COMPOSITE_IDS.fetch_add(1, Ordering::Relaxed)
}
