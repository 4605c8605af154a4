//! # Inline Diff Rendering
//!
//! Produces the compact change summary attached to content mismatches:
//!
//! ```text
//! ===========================
//! From line 2:
//! - b
//! + x
//! ```
//!
//! Lines are chunked with their terminators attached, so a file that differs
//! only in line endings still shows a change.

use std::collections::HashMap;

use difference::{Changeset, Difference};

const SEPARATOR: &str = "===========================";

const CRLF_VISUALIZATION: &str = "\u{240D}\u{240A}";
const LF_VISUALIZATION: &str = "\u{240A}";
const CR_VISUALIZATION: &str = "\u{240D}";
const SPACE_VISUALIZATION: char = '\u{00B7}';
const TAB_VISUALIZATION: char = '\u{2192}';

/// Kind of a line in an aligned diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Unchanged,
    Inserted,
    Deleted,
    Modified,
    /// Alignment filler with no counterpart in either text.
    Imaginary,
}

impl ChangeKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ChangeKind::Inserted => "+ ",
            ChangeKind::Deleted => "- ",
            ChangeKind::Modified => "M ",
            ChangeKind::Imaginary => "I ",
            ChangeKind::Unchanged => "  ",
        }
    }
}

/// One line of an aligned diff, terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: ChangeKind,
    pub text: String,
}

/// Splits `text` into lines that keep their `\r\n`, `\n` or `\r` terminator.
pub fn split_lines_preserving_endings(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..=i]);
                start = i + 1;
            }
            b'\r' => {
                let end = if bytes.get(i + 1) == Some(&b'\n') { i + 1 } else { i };
                lines.push(&text[start..=end]);
                i = end;
                start = end + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

#[derive(Default)]
struct LineInterner<'a> {
    ids: HashMap<&'a str, usize>,
    lines: Vec<&'a str>,
}

impl<'a> LineInterner<'a> {
    fn encode(&mut self, lines: &[&'a str]) -> String {
        let mut encoded = Vec::with_capacity(lines.len());
        for &line in lines {
            let id = match self.ids.get(line) {
                Some(&id) => id,
                None => {
                    self.lines.push(line);
                    self.ids.insert(line, self.lines.len() - 1);
                    self.lines.len() - 1
                }
            };
            encoded.push(id.to_string());
        }
        encoded.join("\n")
    }
}

/// Computes a line-level diff of `before` and `after`.
///
/// Each distinct line is interned to a numeric token before diffing, so the
/// line-based differ never has to split on the lines' own terminators.
pub fn build_line_diff(before: &str, after: &str) -> Vec<DiffLine> {
    let before_lines = split_lines_preserving_endings(before);
    let after_lines = split_lines_preserving_endings(after);

    let mut interner = LineInterner::default();
    let encoded_before = interner.encode(&before_lines);
    let encoded_after = interner.encode(&after_lines);

    let changeset = Changeset::new(&encoded_before, &encoded_after, "\n");
    let mut lines = Vec::new();
    for diff in &changeset.diffs {
        let (kind, tokens) = match diff {
            Difference::Same(tokens) => (ChangeKind::Unchanged, tokens),
            Difference::Add(tokens) => (ChangeKind::Inserted, tokens),
            Difference::Rem(tokens) => (ChangeKind::Deleted, tokens),
        };
        for token in tokens.split('\n').filter(|t| !t.is_empty()) {
            if let Some(text) = token.parse::<usize>().ok().and_then(|id| interner.lines.get(id)) {
                lines.push(DiffLine {
                    kind,
                    text: (*text).to_string(),
                });
            }
        }
    }
    lines
}

/// Renders the change summary between `approved` and `received`.
///
/// The line number of a block counts lines of the approved text; inserted lines
/// do not advance it.
pub fn render_inline_diff(approved: &str, received: &str, show_whitespace: bool) -> String {
    render_diff_lines(&build_line_diff(approved, received), show_whitespace)
}

pub fn render_diff_lines(lines: &[DiffLine], show_whitespace: bool) -> String {
    let mut out = String::new();
    let mut last_changed = false;
    let mut line_number = 1usize;

    for line in lines {
        if line.kind != ChangeKind::Unchanged {
            if !last_changed {
                out.push_str(SEPARATOR);
                out.push('\n');
                out.push_str(&format!("From line {}:\n", line_number));
            }
            last_changed = true;
            out.push_str(line.kind.prefix());
            if show_whitespace {
                out.push_str(&make_whitespace_visible(&line.text));
            } else {
                out.push_str(&line.text);
            }
            if !has_terminator(&line.text) {
                out.push('\n');
            }
        } else {
            last_changed = false;
        }

        if line.kind != ChangeKind::Inserted {
            line_number += 1;
        }
    }
    out
}

fn has_terminator(line: &str) -> bool {
    line.ends_with('\n') || line.ends_with('\r')
}

/// Replaces spaces and tabs with visible glyphs and marks the line terminator
/// with its control picture, keeping the real terminator after it.
pub fn make_whitespace_visible(line: &str) -> String {
    let (body, terminator, picture) = if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n", CRLF_VISUALIZATION)
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n", LF_VISUALIZATION)
    } else if let Some(body) = line.strip_suffix('\r') {
        (body, "\r", CR_VISUALIZATION)
    } else {
        (line, "", "")
    };

    let mut visible: String = body
        .chars()
        .map(|c| match c {
            ' ' => SPACE_VISUALIZATION,
            '\t' => TAB_VISUALIZATION,
            other => other,
        })
        .collect();
    visible.push_str(picture);
    visible.push_str(terminator);
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_each_terminator() {
        assert_eq!(
            split_lines_preserving_endings("a\r\nb\nc\rd"),
            vec!["a\r\n", "b\n", "c\r", "d"]
        );
        assert!(split_lines_preserving_endings("").is_empty());
        assert_eq!(split_lines_preserving_endings("x\n"), vec!["x\n"]);
    }

    #[test]
    fn test_single_modification_yields_one_block() {
        let out = render_inline_diff("a\nb\nc\n", "a\nx\nc\n", false);
        assert_eq!(out.matches(SEPARATOR).count(), 1);
        assert!(out.contains("From line 2:\n"));
        assert!(out.contains("- b\n"));
        assert!(out.contains("+ x\n"));
        assert!(!out.contains("From line 1:") && !out.contains("From line 3:"));
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn test_identical_texts_render_nothing() {
        assert_eq!(render_inline_diff("same\n", "same\n", true), "");
    }

    #[test]
    fn test_separate_changes_yield_separate_blocks() {
        let out = render_inline_diff("1\n2\n3\n4\n5\n", "1\nX\n3\n4\nY\n", false);
        assert_eq!(out.matches(SEPARATOR).count(), 2);
        assert!(out.contains("From line 2:"));
        assert!(out.contains("From line 5:"));
    }

    #[test]
    fn test_insertions_do_not_advance_line_counter() {
        let lines = vec![
            DiffLine { kind: ChangeKind::Inserted, text: "new\n".into() },
            DiffLine { kind: ChangeKind::Inserted, text: "new2\n".into() },
            DiffLine { kind: ChangeKind::Unchanged, text: "a\n".into() },
            DiffLine { kind: ChangeKind::Deleted, text: "b\n".into() },
        ];
        let out = render_diff_lines(&lines, false);
        assert_eq!(
            out,
            "===========================\nFrom line 1:\n+ new\n+ new2\n===========================\nFrom line 2:\n- b\n"
        );
    }

    #[test]
    fn test_every_kind_has_its_prefix() {
        let lines = vec![
            DiffLine { kind: ChangeKind::Modified, text: "m\n".into() },
            DiffLine { kind: ChangeKind::Imaginary, text: "\n".into() },
        ];
        let out = render_diff_lines(&lines, false);
        assert!(out.contains("M m\n"));
        assert!(out.contains("I \n"));
        assert_eq!(ChangeKind::Unchanged.prefix(), "  ");
    }

    #[test]
    fn test_line_ending_change_is_visible() {
        let out = render_inline_diff("a\r\n", "a\n", true);
        assert!(out.contains("- a\u{240D}\u{240A}\r\n"));
        assert!(out.contains("+ a\u{240A}\n"));
    }

    #[test]
    fn test_whitespace_visualization() {
        assert_eq!(make_whitespace_visible("a b\tc"), "a\u{00B7}b\u{2192}c");
        assert_eq!(make_whitespace_visible("x\r"), "x\u{240D}\r");
        assert_eq!(make_whitespace_visible("\n"), "\u{240A}\n");
    }

    #[test]
    fn test_missing_trailing_newline_is_reported() {
        let out = render_inline_diff("a\nb\n", "a\nb", true);
        assert!(out.contains("From line 2:"));
        assert!(out.contains("- b\u{240A}\n"));
        assert!(out.contains("+ b\n"));
    }
}
