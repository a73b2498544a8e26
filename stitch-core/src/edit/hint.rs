//! "Did you mean" diagnostics for failed matches.
//!
//! When the cascade ends in no-match, the most useful thing to hand back is
//! the region of the file that looks most like the search text, so the model
//! can correct its next attempt instead of guessing. The hint is purely
//! diagnostic; it never influences matching.

/// Closest region found for a failed search, with a 0.0-1.0 similarity.
#[derive(Debug, Clone)]
pub struct MatchHint {
    pub start_line: usize,
    pub similarity: f64,
    pub window: Vec<String>,
}

impl MatchHint {
    pub fn describe(&self) -> String {
        let mut out = format!(
            "Closest match ({:.1}% similar) starts at line {}:\n",
            self.similarity * 100.0,
            self.start_line + 1
        );
        for line in &self.window {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Slide a window the size of the search text over the content and score
/// each position by average per-line similarity.
pub fn closest_region(content: &str, target: &str) -> Option<MatchHint> {
    let content_lines: Vec<&str> = content.lines().collect();
    let target_lines: Vec<&str> = target.lines().collect();

    if target_lines.is_empty() || content_lines.len() < target_lines.len() {
        return None;
    }

    let mut best: Option<MatchHint> = None;
    for start in 0..=content_lines.len() - target_lines.len() {
        let window = &content_lines[start..start + target_lines.len()];
        let similarity = window
            .iter()
            .zip(&target_lines)
            .map(|(w, t)| line_similarity(w, t))
            .sum::<f64>()
            / target_lines.len() as f64;

        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(MatchHint {
                start_line: start,
                similarity,
                window: window.iter().map(|l| l.to_string()).collect(),
            });
        }
    }

    best
}

fn line_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

fn edit_distance(a: &str, b: &str) -> usize {
    if a.is_empty() {
        return b.chars().count();
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let substitution = prev[j] + usize::from(a_char != *b_char);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b_chars.len()]
}
