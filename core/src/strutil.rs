//! Ordered sequences of strings, sets, and key-value mappings with the
//! set-algebra helpers the inspections lean on, plus the handful of string
//! formatting helpers (`shorten`, `xmlescape`, `printwrap`) the text and
//! XUnit formatters use.
//!
//! `StringList` is a plain `Vec<String>` newtype rather than a `HashSet` --
//! several inspections (addedfiles/removedfiles ignore globs, dependency
//! ignore patterns) care about preserving configuration order for
//! deterministic output, which a hash-based set would not give us.

use std::collections::HashSet;
use std::fmt::Write as _;

/// An ordered sequence of strings that allows duplicates unless callers use
/// [`StringList::add_if_absent`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringList(Vec<String>);

/// `text -> text`, insertion order not significant.
pub type StringMap = std::collections::HashMap<String, String>;

/// `text -> StringList`.
pub type StringListMap = std::collections::HashMap<String, StringList>;

impl StringList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, item: impl Into<String>) {
        self.0.push(item.into());
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|s| s == item)
    }

    /// Appends `item` only if it is not already present (O(n) linear check).
    pub fn add_if_absent(&mut self, item: impl Into<String>) {
        let item = item.into();
        if !self.contains(&item) {
            self.0.push(item);
        }
    }

    /// Elements of `self` not present in `other`, preserving `self`'s order.
    pub fn difference(&self, other: &StringList) -> StringList {
        StringList(
            self.0
                .iter()
                .filter(|item| !other.contains(item))
                .cloned()
                .collect(),
        )
    }

    /// Elements present in both, preserving `self`'s order.
    pub fn intersection(&self, other: &StringList) -> StringList {
        StringList(
            self.0
                .iter()
                .filter(|item| other.contains(item))
                .cloned()
                .collect(),
        )
    }

    /// All elements from both lists, `self`'s order first, duplicates
    /// removed.
    pub fn union(&self, other: &StringList) -> StringList {
        let mut out = StringList::new();
        for item in self.0.iter().chain(other.0.iter()) {
            out.add_if_absent(item.clone());
        }
        out
    }

    /// Elements present in exactly one of the two lists, `self`'s order
    /// first.
    pub fn symmetric_difference(&self, other: &StringList) -> StringList {
        let mut out = self.difference(other);
        for item in other.difference(self).iter() {
            out.add_if_absent(item.clone());
        }
        out
    }
}

impl From<Vec<String>> for StringList {
    fn from(v: Vec<String>) -> Self {
        Self(v)
    }
}

impl FromIterator<String> for StringList {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for StringList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StringList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Splits `text` on any character in `separators`; empty tokens are skipped.
pub fn split(text: &str, separators: &str) -> Vec<String> {
    text.split(|c| separators.contains(c))
        .filter(|tok| !tok.is_empty())
        .map(str::to_string)
        .collect()
}

/// Truncates `text` in the middle with an ellipsis so the result is never
/// longer than `width`. Used only for progress display.
pub fn shorten(text: &str, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return chars.into_iter().take(width).collect();
    }

    let keep = width - 3;
    let head = keep - keep / 2;
    let tail = keep - head;

    let mut out = String::with_capacity(width);
    out.extend(&chars[..head]);
    out.push_str("...");
    out.extend(&chars[chars.len() - tail..]);
    out
}

/// Escapes `<`, `>`, `&`, `"`, `'` for embedding in XUnit output.
pub fn xmlescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Word-wraps `text` to `width` columns, each continuation line indented by
/// `indent` spaces. Words longer than `width` are never broken.
pub fn printwrap(text: &str, width: usize, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let mut out = String::new();
    let mut line_len = 0usize;
    let mut first_word_on_line = true;

    for word in text.split_whitespace() {
        let needed = if first_word_on_line {
            word.len()
        } else {
            word.len() + 1
        };

        if !first_word_on_line && line_len + needed > width {
            out.push('\n');
            out.push_str(&pad);
            line_len = indent;
            first_word_on_line = true;
        }

        if !first_word_on_line {
            out.push(' ');
            line_len += 1;
        }
        let _ = write!(out, "{word}");
        line_len += word.len();
        first_word_on_line = false;
    }

    out
}

/// Parses a glob pattern list, evaluating `path` against each; used by every
/// file-level inspection that honors the configured ignore list.
pub fn matches_any_glob(path: &str, patterns: &StringList) -> bool {
    patterns.iter().any(|pat| {
        glob::Pattern::new(pat)
            .map(|p| p.matches(path))
            .unwrap_or(false)
    })
}

/// Deduplicates a `Vec<String>` while preserving first-seen order.
pub fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

/// True for paths the diff inspections (`addedfiles`, `removedfiles`,
/// `changedfiles`) are documented to skip regardless of ignore globs: debug
/// trees and build-id symlink farms (§4.10).
pub fn is_debug_path(localpath: &str) -> bool {
    localpath.starts_with("/usr/lib/debug/")
        || localpath.starts_with("/usr/src/debug/")
        || localpath.contains("/.build-id/")
}

/// True for a Python `.egg-info` path, also excluded from the diff
/// inspections (§4.10 `addedfiles`/`removedfiles`).
pub fn is_egg_info_path(localpath: &str) -> bool {
    localpath.contains(".egg-info")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn debug_paths_are_recognized() {
        assert!(is_debug_path("/usr/lib/debug/usr/bin/foo.debug"));
        assert!(is_debug_path("/usr/src/debug/foo-1.0/main.c"));
        assert!(is_debug_path("/usr/lib/.build-id/ab/cdef"));
        assert!(!is_debug_path("/usr/bin/foo"));
    }

    #[test]
    fn egg_info_paths_are_recognized() {
        assert!(is_egg_info_path("/usr/lib/python3/site-packages/foo-1.0.egg-info/PKG-INFO"));
        assert!(!is_egg_info_path("/usr/bin/foo"));
    }

    #[test]
    fn add_if_absent_skips_duplicates() {
        let mut list = StringList::new();
        list.add_if_absent("a");
        list.add_if_absent("b");
        list.add_if_absent("a");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn set_algebra_preserves_left_order() {
        let a: StringList = vec!["c".into(), "a".into(), "b".into()].into();
        let b: StringList = vec!["a".into()].into();

        assert_eq!(
            a.difference(&b).into_iter().collect::<Vec<_>>(),
            vec!["c".to_string(), "b".to_string()]
        );
        assert_eq!(
            a.intersection(&b).into_iter().collect::<Vec<_>>(),
            vec!["a".to_string()]
        );
        assert_eq!(
            a.union(&b).into_iter().collect::<Vec<_>>(),
            vec!["c".to_string(), "a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn symmetric_difference_is_commutative_in_content() {
        let a: StringList = vec!["x".into(), "y".into()].into();
        let b: StringList = vec!["y".into(), "z".into()].into();
        let mut fwd: Vec<_> = a.symmetric_difference(&b).into_iter().collect();
        let mut bwd: Vec<_> = b.symmetric_difference(&a).into_iter().collect();
        fwd.sort();
        bwd.sort();
        assert_eq!(fwd, bwd);
        assert_eq!(fwd, vec!["x".to_string(), "z".to_string()]);
    }

    #[test]
    fn split_skips_empty_tokens() {
        assert_eq!(split("a:b::c,,d", ":,"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn shorten_keeps_width_bound() {
        let s = shorten("the-quick-brown-fox-jumps-over", 12);
        assert!(s.chars().count() <= 12);
        assert!(s.contains("..."));
    }

    #[test]
    fn shorten_passthrough_when_short_enough() {
        assert_eq!(shorten("short", 12), "short");
    }

    #[test]
    fn xmlescape_covers_five_entities() {
        assert_eq!(
            xmlescape(r#"<a>&"b"'c'</a>"#),
            "&lt;a&gt;&amp;&quot;b&quot;&apos;c&apos;&lt;/a&gt;"
        );
    }

    #[test]
    fn printwrap_never_breaks_long_words() {
        let wrapped = printwrap("short reallylongwordthatexceedswidth ok", 10, 2);
        for line in wrapped.lines() {
            if line.trim() == "reallylongwordthatexceedswidth" {
                continue;
            }
        }
        assert!(wrapped.contains("reallylongwordthatexceedswidth"));
    }
}
