//! Locates the search text inside file content and splices in the
//! replacement.
//!
//! Strategies run in a fixed cascade: whole-file replace for an empty
//! search, exact line match, whitespace-insensitive line match, `...`
//! ellipsis expansion, and a final retry with a spurious leading blank line
//! stripped. A strategy either succeeds on a unique hit or defers; none of
//! them picks an arbitrary hit when several exist.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("search text not found in the target file")]
    NoMatch,
    #[error("search text matches {0} locations; add surrounding context to disambiguate")]
    Ambiguous(usize),
}

const ELLIPSIS: &str = "...";

/// Apply one search/replace pair to `content`. All three inputs are expected
/// to end with a newline unless empty; the result preserves that shape.
pub fn replace_region(
    content: &str,
    target: &str,
    replacement: &str,
) -> Result<String, MatchError> {
    // Whole-file replace: an empty search text creates or overwrites the
    // file and never matches an interior region.
    if target.is_empty() {
        return Ok(replacement.to_string());
    }

    let content_lines = split_lines(content);
    let target_lines = split_lines(target);
    let replacement_lines = split_lines(replacement);

    // Exact line match, whitespace included.
    match unique_start(&content_lines, &target_lines, str_eq)? {
        Some(start) => {
            let insert: Vec<String> = replacement_lines.iter().map(|l| l.to_string()).collect();
            return Ok(splice(&content_lines, start, target_lines.len(), &insert));
        }
        None => {}
    }

    // Whitespace-insensitive match, re-indenting the first replacement line
    // to the matched region.
    if let Some(updated) = loose_match(&content_lines, &target_lines, &replacement_lines)? {
        return Ok(updated);
    }

    // Ellipsis expansion for abbreviated search texts.
    if let Some(updated) = ellipsis_expand(content, target, replacement) {
        return Ok(updated);
    }

    // Models sometimes slip a blank line directly under the SEARCH marker;
    // strip exactly one and retry the exact and ellipsis strategies.
    if target_lines.first().is_some_and(|l| l.trim().is_empty()) {
        let target = drop_leading_blank_line(target);
        let replacement = drop_leading_blank_line(replacement);
        let target_lines = split_lines(&target);
        let replacement_lines = split_lines(&replacement);

        match unique_start(&content_lines, &target_lines, str_eq)? {
            Some(start) => {
                let insert: Vec<String> =
                    replacement_lines.iter().map(|l| l.to_string()).collect();
                return Ok(splice(&content_lines, start, target_lines.len(), &insert));
            }
            None => {}
        }
        if let Some(updated) = ellipsis_expand(content, &target, &replacement) {
            return Ok(updated);
        }
    }

    Err(MatchError::NoMatch)
}

fn str_eq(a: &str, b: &str) -> bool {
    a == b
}

/// Line list without the phantom entry a trailing newline would produce.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

/// All start indices where `target` matches `content` line-for-line under
/// `eq`, reduced to the unique hit. Two or more hits are an error, never a
/// silent pick.
fn unique_start(
    content: &[&str],
    target: &[&str],
    eq: fn(&str, &str) -> bool,
) -> Result<Option<usize>, MatchError> {
    if target.is_empty() || target.len() > content.len() {
        return Ok(None);
    }

    let starts: Vec<usize> = (0..=content.len() - target.len())
        .filter(|&i| target.iter().enumerate().all(|(j, t)| eq(content[i + j], t)))
        .collect();

    match starts.len() {
        0 => Ok(None),
        1 => Ok(Some(starts[0])),
        n => Err(MatchError::Ambiguous(n)),
    }
}

fn splice(content: &[&str], start: usize, removed: usize, insert: &[String]) -> String {
    let mut out: Vec<&str> = content[..start].to_vec();
    out.extend(insert.iter().map(|s| s.as_str()));
    out.extend(&content[start + removed..]);
    join_lines(&out)
}

fn no_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

fn loose_match(
    content_lines: &[&str],
    target_lines: &[&str],
    replacement_lines: &[&str],
) -> Result<Option<String>, MatchError> {
    // Leading and trailing blank lines don't participate in the match.
    let mut trimmed = target_lines;
    while trimmed.first().is_some_and(|l| l.trim().is_empty()) {
        trimmed = &trimmed[1..];
    }
    while trimmed.last().is_some_and(|l| l.trim().is_empty()) {
        trimmed = &trimmed[..trimmed.len() - 1];
    }
    if trimmed.is_empty() || trimmed.len() > content_lines.len() {
        return Ok(None);
    }

    let content_ws: Vec<String> = content_lines.iter().map(|l| no_whitespace(l)).collect();
    let target_ws: Vec<String> = trimmed.iter().map(|l| no_whitespace(l)).collect();

    let starts: Vec<usize> = (0..=content_lines.len() - trimmed.len())
        .filter(|&i| {
            target_ws
                .iter()
                .enumerate()
                .all(|(j, t)| &content_ws[i + j] == t)
        })
        .collect();

    match starts.len() {
        0 => Ok(None),
        1 => {
            let start = starts[0];
            let indent = leading_whitespace(content_lines[start]);
            let insert: Vec<String> = replacement_lines
                .iter()
                .enumerate()
                .map(|(j, line)| {
                    if j == 0 {
                        format!("{indent}{}", line.trim_start())
                    } else {
                        line.to_string()
                    }
                })
                .collect();
            Ok(Some(splice(content_lines, start, trimmed.len(), &insert)))
        }
        n => Err(MatchError::Ambiguous(n)),
    }
}

fn has_ellipsis_line(text: &str) -> bool {
    text.lines().any(|l| l.trim() == ELLIPSIS)
}

/// Pieces of `text` delimited by whole-line `...` markers. Every piece keeps
/// its line structure; a marker at the start or end contributes an empty
/// piece on that side.
fn split_on_ellipsis(text: &str) -> Vec<String> {
    let mut pieces = vec![String::new()];
    for line in text.lines() {
        if line.trim() == ELLIPSIS {
            pieces.push(String::new());
        } else {
            let piece = pieces.last_mut().expect("pieces is never empty");
            piece.push_str(line);
            piece.push('\n');
        }
    }
    pieces
}

/// Align `...`-delimited pieces of the search and replace texts and rewrite
/// each matched piece in turn. Uneven piece counts or an unmatched piece
/// defer to the caller as no-match.
fn ellipsis_expand(content: &str, target: &str, replacement: &str) -> Option<String> {
    if !has_ellipsis_line(target) && !has_ellipsis_line(content) {
        return None;
    }

    let target_pieces = split_on_ellipsis(target);
    let replacement_pieces = split_on_ellipsis(replacement);
    if target_pieces.len() != replacement_pieces.len() {
        tracing::warn!(
            search_pieces = target_pieces.len(),
            replace_pieces = replacement_pieces.len(),
            "Uneven '...' piece counts between search and replace texts"
        );
        return None;
    }

    let mut result = content.to_string();
    for (target_piece, replacement_piece) in target_pieces.iter().zip(&replacement_pieces) {
        if target_piece.is_empty() && replacement_piece.is_empty() {
            continue;
        }
        if target_piece.is_empty() {
            result.push_str(replacement_piece);
            continue;
        }
        if replacement_piece.is_empty() {
            tracing::warn!(
                dropped = target_piece.lines().next().unwrap_or_default(),
                "Ellipsis piece has an empty replacement; deleting the matched text"
            );
        }
        if !result.contains(target_piece.as_str()) {
            return None;
        }
        result = result.replacen(target_piece.as_str(), replacement_piece, 1);
    }

    Some(result)
}

fn drop_leading_blank_line(text: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest)) if first.trim().is_empty() => rest.to_string(),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_file_replace_on_empty_target() {
        let result = replace_region("old\n", "", "brand new\n").unwrap();
        assert_eq!(result, "brand new\n");
    }

    #[test]
    fn test_exact_single_match() {
        let result = replace_region("line1\nfoo\nline3\n", "foo\n", "bar\n").unwrap();
        assert_eq!(result, "line1\nbar\nline3\n");
    }

    #[test]
    fn test_exact_match_multiline() {
        let content = "a\nb\nc\nd\n";
        let result = replace_region(content, "b\nc\n", "x\n").unwrap();
        assert_eq!(result, "a\nx\nd\n");
    }

    #[test]
    fn test_ambiguous_exact_match_refused() {
        let err = replace_region("a\nb\na\n", "a\n", "x\n").unwrap_err();
        assert_eq!(err, MatchError::Ambiguous(2));
    }

    #[test]
    fn test_exact_preferred_over_loose() {
        // "  x" matches exactly once; loosely it would also match the
        // unindented line. The exact hit must win untouched.
        let content = "x\n  x\ny\n";
        let result = replace_region(content, "  x\n", "  z\n").unwrap();
        assert_eq!(result, "x\n  z\ny\n");
    }

    #[test]
    fn test_double_exact_hit_never_falls_back_to_loose() {
        // Two exact hits exist; a unique whitespace-insensitive hit must not
        // rescue the match.
        let content = "x\nx\n  y\n";
        let err = replace_region(content, "x\n", "z\n").unwrap_err();
        assert_eq!(err, MatchError::Ambiguous(2));
    }

    #[test]
    fn test_loose_match_reindents_first_line() {
        let content = "    if(x){\n        y();\n    }\n";
        let result = replace_region(
            content,
            "if(x){\ny();\n}\n",
            "if(x){\n    y2();\n}\n",
        )
        .unwrap();
        assert_eq!(result, "    if(x){\n    y2();\n}\n");
    }

    #[test]
    fn test_loose_match_ambiguity_refused() {
        let content = "  a\na\nb\n";
        // Neither line matches " a " exactly, both match loosely.
        let err = replace_region(content, "\ta\n", "c\n").unwrap_err();
        assert_eq!(err, MatchError::Ambiguous(2));
    }

    #[test]
    fn test_loose_match_ignores_blank_edges_of_target() {
        let content = "keep\n  mid\nkeep2\n";
        let result = replace_region(content, "\nmid\n\n", "new\n").unwrap();
        assert_eq!(result, "keep\n  new\nkeep2\n");
    }

    #[test]
    fn test_ellipsis_expansion() {
        let content = "fn a() {}\nfn b() {}\nfn c() {}\n";
        let target = "fn a() {}\n...\nfn c() {}\n";
        let replacement = "fn a2() {}\n...\nfn c2() {}\n";
        let result = replace_region(content, target, replacement).unwrap();
        assert_eq!(result, "fn a2() {}\nfn b() {}\nfn c2() {}\n");
    }

    #[test]
    fn test_ellipsis_uneven_pieces_is_no_match() {
        let content = "a\nb\nc\n";
        let err = replace_region(content, "a\n...\nc\n", "x\n").unwrap_err();
        assert_eq!(err, MatchError::NoMatch);
    }

    #[test]
    fn test_ellipsis_unmatched_piece_is_no_match() {
        let content = "a\nb\n";
        let err = replace_region(content, "zzz\n...\nb\n", "x\n...\nb\n").unwrap_err();
        assert_eq!(err, MatchError::NoMatch);
    }

    #[test]
    fn test_ellipsis_append_on_empty_target_piece() {
        let content = "a\nb\n";
        let target = "a\n...\n";
        let replacement = "a\n...\nc\n";
        // Pieces: ["a\n", ""] vs ["a\n", "c\n"]; the trailing pair appends.
        let result = replace_region(content, target, replacement).unwrap();
        assert_eq!(result, "a\nb\nc\n");
    }

    #[test]
    fn test_spurious_leading_blank_line_retry() {
        let content = "one\ntwo\nthree\n";
        let result = replace_region(content, "\ntwo\n", "2\n").unwrap();
        assert_eq!(result, "one\n2\nthree\n");
    }

    #[test]
    fn test_blank_line_retry_reaches_ellipsis_expansion() {
        // The blank line under the SEARCH marker defeats both the loose
        // match (the `...` line) and the literal ellipsis pieces; stripping
        // exactly one blank line from both texts makes the pieces land.
        let content = "two\nthree\nfour\n";
        let result =
            replace_region(content, "\ntwo\n...\nfour\n", "\n2\n...\nfour\n").unwrap();
        assert_eq!(result, "2\nthree\nfour\n");
    }

    #[test]
    fn test_no_match() {
        let err = replace_region("a\nb\n", "zzz\n", "x\n").unwrap_err();
        assert_eq!(err, MatchError::NoMatch);
    }

    #[test]
    fn test_apply_then_inverse_restores_content() {
        let content = "one\ntwo\nthree\n";
        let updated = replace_region(content, "two\n", "2\n").unwrap();
        let restored = replace_region(&updated, "2\n", "two\n").unwrap();
        assert_eq!(restored, content);
    }

    #[test]
    fn test_deletion_of_matched_region() {
        let content = "a\nb\nc\n";
        let result = replace_region(content, "b\n", "").unwrap();
        assert_eq!(result, "a\nc\n");
    }

    #[test]
    fn test_replace_at_start_and_end() {
        assert_eq!(
            replace_region("a\nb\n", "a\n", "x\n").unwrap(),
            "x\nb\n"
        );
        assert_eq!(
            replace_region("a\nb\n", "b\n", "x\n").unwrap(),
            "a\nx\n"
        );
    }
}
