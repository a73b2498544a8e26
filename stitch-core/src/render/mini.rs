//! Walks the tagged HTML once and splits it into component descriptors.
//!
//! Runs of ordinary wrapped markdown accumulate into a single `Markdown`
//! descriptor carrying the ID of its first block, so a growing stream keeps
//! its leading components stable. Placeholder tags flush the run and become
//! typed descriptors of their own.

use crate::render::components::{ComponentData, EditBlockStatus};
use crate::render::id::{composite_id, node_id, ComponentId, NodeKind};

const MD_OPEN: &str = "<md-block";
const MD_CLOSE: &str = "</md-block>";
const FENCE_OPEN: &str = "<code-fence";
const EDIT_OPEN: &str = "<edit-block";

/// Flat descriptor list for a whole tagged-HTML document.
pub fn parse_components(html: &str) -> Vec<ComponentData> {
    let mut components = Vec::new();
    let mut buffer = String::new();
    let mut buffer_id: Option<ComponentId> = None;
    let mut cursor = 0;

    while let Some((at, kind)) = next_tag(html, cursor) {
        match kind {
            TagKind::MdBlock => {
                let Some(open_end) = find_from(html, at, ">") else {
                    break;
                };
                let Some(close) = find_from(html, open_end + 1, MD_CLOSE) else {
                    break;
                };
                let attrs = &html[at..open_end];
                let inner = &html[open_end + 1..close];
                if buffer_id.is_none() {
                    buffer_id = attr_id(attrs);
                }
                buffer.push_str(inner);
                cursor = close + MD_CLOSE.len();
            }
            TagKind::CodeFence => {
                let Some(close) = find_from(html, at, "/>") else {
                    break;
                };
                let attrs = &html[at..close];
                flush_markdown(&mut buffer, &mut buffer_id, &mut components);
                components.push(fence_component(attrs));
                cursor = close + 2;
            }
            TagKind::EditBlock => {
                let Some(close) = find_from(html, at, "/>") else {
                    break;
                };
                let attrs = &html[at..close];
                flush_markdown(&mut buffer, &mut buffer_id, &mut components);
                components.push(edit_component(attrs));
                cursor = close + 2;
            }
        }
    }

    flush_markdown(&mut buffer, &mut buffer_id, &mut components);

    // Nothing recognized at all: degrade to unstyled text rather than
    // dropping the output.
    if components.is_empty() && !html.trim().is_empty() {
        components.push(ComponentData::Markdown {
            id: node_id(0, NodeKind::Markdown),
            html: html.to_string(),
        });
    }

    components
}

/// Single-element entry point: zero descriptors is `None`, one passes
/// through, several wrap in a freshly numbered `Composite`.
pub fn parse_component(html: &str) -> Option<ComponentData> {
    let mut components = parse_components(html);
    match components.len() {
        0 => None,
        1 => Some(components.remove(0)),
        _ => Some(ComponentData::Composite {
            id: composite_id(),
            children: components,
        }),
    }
}

#[derive(Clone, Copy)]
enum TagKind {
    MdBlock,
    CodeFence,
    EditBlock,
}

fn next_tag(html: &str, cursor: usize) -> Option<(usize, TagKind)> {
    let candidates = [
        (find_from(html, cursor, MD_OPEN), TagKind::MdBlock),
        (find_from(html, cursor, FENCE_OPEN), TagKind::CodeFence),
        (find_from(html, cursor, EDIT_OPEN), TagKind::EditBlock),
    ];
    candidates
        .into_iter()
        .filter_map(|(at, kind)| at.map(|at| (at, kind)))
        .min_by_key(|(at, _)| *at)
}

fn find_from(html: &str, cursor: usize, needle: &str) -> Option<usize> {
    html.get(cursor..)
        .and_then(|rest| rest.find(needle))
        .map(|at| cursor + at)
}

fn flush_markdown(
    buffer: &mut String,
    buffer_id: &mut Option<ComponentId>,
    components: &mut Vec<ComponentData>,
) {
    if buffer.is_empty() {
        return;
    }
    components.push(ComponentData::Markdown {
        id: buffer_id.unwrap_or_else(|| node_id(0, NodeKind::Markdown)),
        html: std::mem::take(buffer),
    });
    *buffer_id = None;
}

fn fence_component(attrs: &str) -> ComponentData {
    ComponentData::CodeFence {
        id: attr_id(attrs).unwrap_or_default(),
        lang: attr(attrs, "data-lang").unwrap_or_default(),
        content: attr(attrs, "data-content").unwrap_or_default(),
    }
}

fn edit_component(attrs: &str) -> ComponentData {
    ComponentData::EditBlock {
        id: attr_id(attrs).unwrap_or_default(),
        file: attr(attrs, "data-file").unwrap_or_default(),
        adds: attr_usize(attrs, "data-adds"),
        dels: attr_usize(attrs, "data-dels"),
        changed: attr(attrs, "data-changed").as_deref() == Some("true"),
        status: match attr(attrs, "data-status").as_deref() {
            Some("parsed") => EditBlockStatus::Parsed,
            _ => EditBlockStatus::Streaming,
        },
    }
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let start = attrs.find(&needle)? + needle.len();
    let end = attrs[start..].find('"')? + start;
    Some(unescape_attr(&attrs[start..end]))
}

fn attr_id(attrs: &str) -> Option<ComponentId> {
    attr(attrs, "data-id")?.parse().ok()
}

fn attr_usize(attrs: &str, name: &str) -> usize {
    attr(attrs, name)
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

fn unescape_attr(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
