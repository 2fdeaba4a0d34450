//! The `Diff` capability (DESIGN NOTES §9): given two text blobs, produce a
//! unified diff. Backed by `similar`, already in the pack's dependency
//! vocabulary for text comparison.

use similar::{ChangeTag, TextDiff};

/// Produces a unified-diff-style rendering of `before` -> `after`. Returns
/// `None` when the two blobs are identical (nothing to show).
pub fn unified(before: &str, after: &str, before_label: &str, after_label: &str) -> Option<String> {
    if before == after {
        return None;
    }

    let diff = TextDiff::from_lines(before, after);
    let mut out = format!("--- {before_label}\n+++ {after_label}\n");

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        out.push(sign);
        out.push_str(change.as_str().unwrap_or(""));
        if !change.as_str().unwrap_or("").ends_with('\n') {
            out.push('\n');
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_yields_no_diff() {
        assert!(unified("same\n", "same\n", "a", "b").is_none());
    }

    #[test]
    fn changed_line_appears_with_markers() {
        let out = unified("one\ntwo\n", "one\nthree\n", "before", "after").unwrap();
        assert!(out.contains("-two"));
        assert!(out.contains("+three"));
        assert!(out.contains(" one"));
    }
}
