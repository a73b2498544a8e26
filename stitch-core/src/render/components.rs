use serde::{Deserialize, Serialize};

use crate::render::id::ComponentId;

/// One renderable unit of model output. Leaves carry IDs derived from their
/// source position; composites are synthesized with counter IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum ComponentData {
    Markdown {
        id: ComponentId,
        html: String,
    },
    CodeFence {
        id: ComponentId,
        lang: String,
        content: String,
    },
    EditBlock {
        id: ComponentId,
        file: String,
        adds: usize,
        dels: usize,
        changed: bool,
        status: EditBlockStatus,
    },
    Composite {
        id: ComponentId,
        children: Vec<ComponentData>,
    },
}

impl ComponentData {
    pub fn id(&self) -> ComponentId {
        match self {
            ComponentData::Markdown { id, .. }
            | ComponentData::CodeFence { id, .. }
            | ComponentData::EditBlock { id, .. }
            | ComponentData::Composite { id, .. } => *id,
        }
    }

    /// Cheap change summary for the reconciler. Two descriptors with the
    /// same ID and fingerprint render identically.
    pub fn fingerprint(&self) -> String {
        match self {
            ComponentData::Markdown { html, .. } => html.clone(),
            ComponentData::CodeFence { content, .. } => content.clone(),
            ComponentData::EditBlock {
                adds, dels, status, ..
            } => format!("{adds}|{dels}|{status}"),
            ComponentData::Composite { children, .. } => children
                .iter()
                .map(ComponentData::fingerprint)
                .collect::<Vec<_>>()
                .join("\u{1f}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EditBlockStatus {
    /// The replace marker has not arrived yet; the block is still growing.
    Streaming,
    /// The block parsed completely.
    Parsed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::id::node_id;
    use crate::render::id::NodeKind;

    #[test]
    fn test_edit_block_fingerprint_tracks_status() {
        let id = node_id(0, NodeKind::EditBlock);
        let streaming = ComponentData::EditBlock {
            id,
            file: "a.rs".to_string(),
            adds: 1,
            dels: 2,
            changed: true,
            status: EditBlockStatus::Streaming,
        };
        let parsed = ComponentData::EditBlock {
            id,
            file: "a.rs".to_string(),
            adds: 1,
            dels: 2,
            changed: true,
            status: EditBlockStatus::Parsed,
        };
        assert_eq!(streaming.fingerprint(), "1|2|streaming");
        assert_ne!(streaming.fingerprint(), parsed.fingerprint());
    }

    #[test]
    fn test_serialization_shape() {
        let component = ComponentData::CodeFence {
            id: 7,
            lang: "rust".to_string(),
            content: "fn main() {}\n".to_string(),
        };
        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(value["kind"], "CodeFence");
        assert_eq!(value["data"]["lang"], "rust");
    }
}
