//! Renders a streaming model response into HTML with placeholder tags.
//!
//! Edit-block regions and top-level fenced code never become final HTML
//! here; they turn into self-closing placeholder elements carrying their
//! payload in escaped attributes, and every ordinary top-level markdown
//! block is wrapped with its stable ID. The mini-parser consumes this
//! output and splits it into typed component descriptors.
//!
//! Fence content is taken from the parser's line-oriented text events, so
//! leading whitespace inside code blocks survives the round trip.

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use pulldown_cmark_escape::escape_html;

use crate::edit::parser::{divider_filename, head_filename, replace_filename};
use crate::edit::stats::line_stats;
use crate::render::components::EditBlockStatus;
use crate::render::id::{node_id, NodeKind};

/// One edit block found in the raw source, byte-addressed so its
/// placeholder ID survives re-parses of a growing prefix.
struct EditRegion {
    start: usize,
    end: usize,
    filename: String,
    before: String,
    after: String,
    complete: bool,
}

/// Produce the tagged HTML for a complete or partial model response.
pub fn render_tagged_html(source: &str) -> String {
    let regions = scan_edit_regions(source);

    let mut out = String::new();
    let mut cursor = 0;
    for region in &regions {
        if region.start > cursor {
            render_markdown_segment(&source[cursor..region.start], cursor, &mut out);
        }
        render_edit_placeholder(region, &mut out);
        cursor = region.end;
    }
    if cursor < source.len() {
        render_markdown_segment(&source[cursor..], cursor, &mut out);
    }
    out
}

/// Find edit-block regions by their marker lines. A head marker with no
/// terminator yet is still a region; it renders as a streaming placeholder
/// until the rest of the block arrives.
fn scan_edit_regions(source: &str) -> Vec<EditRegion> {
    enum State {
        InBefore,
        InAfter,
    }

    let lines = line_spans(source);
    let mut regions = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let (offset, line) = lines[i];
        let Some(filename) = head_filename(line) else {
            i += 1;
            continue;
        };

        let mut state = State::InBefore;
        let mut before = String::new();
        let mut after = String::new();
        let mut complete = false;
        let mut j = i + 1;

        while j < lines.len() {
            let (_, line) = lines[j];
            match state {
                State::InBefore => {
                    if divider_filename(line).as_deref() == Some(filename.as_str()) {
                        state = State::InAfter;
                    } else {
                        before.push_str(line);
                        before.push('\n');
                    }
                }
                State::InAfter => {
                    if replace_filename(line).as_deref() == Some(filename.as_str()) {
                        complete = true;
                        j += 1;
                        break;
                    }
                    after.push_str(line);
                    after.push('\n');
                }
            }
            j += 1;
        }

        let end = if j < lines.len() {
            lines[j].0
        } else {
            source.len()
        };
        regions.push(EditRegion {
            start: offset,
            end,
            filename,
            before,
            after,
            complete,
        });
        i = j;
    }

    regions
}

fn line_spans(source: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for line in source.split('\n') {
        spans.push((offset, line));
        offset += line.len() + 1;
    }
    // A trailing newline produces a phantom empty line.
    if source.ends_with('\n') {
        spans.pop();
    }
    spans
}

fn render_edit_placeholder(region: &EditRegion, out: &mut String) {
    let id = node_id(region.start, NodeKind::EditBlock);
    let (adds, dels) = line_stats(&region.before, &region.after);
    let status = if region.complete {
        EditBlockStatus::Parsed
    } else {
        EditBlockStatus::Streaming
    };

    out.push_str(&format!(
        "<edit-block data-id=\"{id}\" data-file=\"{file}\" data-adds=\"{adds}\" \
         data-dels=\"{dels}\" data-changed=\"{changed}\" data-status=\"{status}\"/>\n",
        file = escape_attr(&region.filename),
        changed = adds > 0 || dels > 0,
    ));
}

fn render_markdown_segment(text: &str, base: usize, out: &mut String) {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut events = Parser::new_ext(text, options).into_offset_iter();

    while let Some((event, range)) = events.next() {
        match event {
            // Top-level fenced code becomes a placeholder; fences nested in
            // lists or quotes stay with the stock renderer below.
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                let id = node_id(base + range.start, NodeKind::CodeFence);
                let mut content = String::new();
                for (inner, _) in events.by_ref() {
                    match inner {
                        Event::End(TagEnd::CodeBlock) => break,
                        Event::Text(text) => content.push_str(&text),
                        _ => {}
                    }
                }
                out.push_str(&format!(
                    "<code-fence data-id=\"{id}\" data-lang=\"{lang}\" data-content=\"{content}\"/>\n",
                    lang = escape_attr(&lang),
                    content = escape_attr(&content),
                ));
            }
            Event::Start(tag) => {
                let id = node_id(base + range.start, NodeKind::Markdown);
                let mut depth = 1usize;
                let mut block_events = vec![Event::Start(tag)];
                for (inner, _) in events.by_ref() {
                    match &inner {
                        Event::Start(_) => depth += 1,
                        Event::End(_) => depth -= 1,
                        _ => {}
                    }
                    block_events.push(inner);
                    if depth == 0 {
                        break;
                    }
                }
                let mut inner_html = String::new();
                html::push_html(&mut inner_html, block_events.into_iter());
                out.push_str(&format!(
                    "<md-block data-id=\"{id}\">{inner_html}</md-block>\n"
                ));
            }
            // Rules and raw HTML blocks arrive as bare top-level events.
            other => {
                let id = node_id(base + range.start, NodeKind::Markdown);
                let mut inner_html = String::new();
                html::push_html(&mut inner_html, std::iter::once(other));
                out.push_str(&format!(
                    "<md-block data-id=\"{id}\">{inner_html}</md-block>\n"
                ));
            }
        }
    }
}

pub(crate) fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = escape_html(&mut out, text);
    out
}
