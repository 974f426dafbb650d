//! # Block References
//!
//! Content may link to other blocks with `[[Title]]`. This module finds those
//! spans and keeps them current while the content is being typed, without
//! re-scanning the whole text on every keystroke.
//!
//! ## Pattern
//!
//! `[[` + one or more characters that are neither `]` nor a newline + `]]`.
//! A reference never spans lines, so an edit can only create or destroy
//! references on the lines it touches.
//!
//! ## Incremental Update
//!
//! Given the previous spans and a single [`TextEdit`]:
//!
//! ```text
//!   spans ending before the first edited line   -> kept as-is
//!   spans starting after the last edited line   -> shifted by the edit delta
//!   everything on the edited lines              -> re-matched
//! ```
//!
//! The [`SpanDiff`] returned alongside reports only what re-matching changed,
//! which is what a view needs to update its decorations.
//!
//! Ranges are byte offsets into the content and always fall on char
//! boundaries.
//!
//! Resolving a title to a block lives in [`resolve`].

pub mod resolve;

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]\n]+)\]\]").expect("reference pattern is valid"));

/// One `[[Title]]` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSpan {
    /// Byte range of the whole reference, brackets included.
    pub range: Range<usize>,
    /// The text between the brackets.
    pub title: String,
}

impl ReferenceSpan {
    fn shifted(&self, delta: isize) -> Self {
        Self {
            range: offset(self.range.start, delta)..offset(self.range.end, delta),
            title: self.title.clone(),
        }
    }
}

fn offset(position: usize, delta: isize) -> usize {
    (position as isize + delta) as usize
}

/// A single contiguous replacement: `removed` bytes at `start` in the old text
/// became `inserted` bytes at `start` in the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl TextEdit {
    /// Derives the edit between two versions of a text from their common
    /// prefix and suffix. Returns `None` when the texts are equal.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let prefix: usize = old
            .chars()
            .zip(new.chars())
            .take_while(|(a, b)| a == b)
            .map(|(c, _)| c.len_utf8())
            .sum();
        let suffix: usize = old[prefix..]
            .chars()
            .rev()
            .zip(new[prefix..].chars().rev())
            .take_while(|(a, b)| a == b)
            .map(|(c, _)| c.len_utf8())
            .sum();
        Some(Self {
            start: prefix,
            removed: old.len() - prefix - suffix,
            inserted: new.len() - prefix - suffix,
        })
    }

    fn delta(&self) -> isize {
        self.inserted as isize - self.removed as isize
    }
}

/// What re-matching the edited lines changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanDiff {
    /// Spans that no longer exist, in old-text coordinates.
    pub removed: Vec<ReferenceSpan>,
    /// Spans that appeared, in new-text coordinates.
    pub added: Vec<ReferenceSpan>,
}

impl SpanDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Finds every reference in `text`.
pub fn scan(text: &str) -> Vec<ReferenceSpan> {
    scan_region(text, 0..text.len())
}

fn scan_region(text: &str, region: Range<usize>) -> Vec<ReferenceSpan> {
    let base = region.start;
    REFERENCE
        .captures_iter(&text[region])
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = caps.get(1)?;
            Some(ReferenceSpan {
                range: base + whole.start()..base + whole.end(),
                title: title.as_str().to_string(),
            })
        })
        .collect()
}

fn line_start(text: &str, position: usize) -> usize {
    text[..position].rfind('\n').map_or(0, |i| i + 1)
}

fn line_end(text: &str, position: usize) -> usize {
    text[position..]
        .find('\n')
        .map_or(text.len(), |i| position + i)
}

/// Updates `previous` (the spans of `old`) for `new`, re-matching only the
/// lines touched by `edit`.
pub fn rescan(
    previous: &[ReferenceSpan],
    old: &str,
    new: &str,
    edit: TextEdit,
) -> (Vec<ReferenceSpan>, SpanDiff) {
    let dirty_start = line_start(old, edit.start);
    let old_dirty_end = line_end(old, edit.start + edit.removed);
    let new_dirty_end = line_end(new, edit.start + edit.inserted);

    let mut before = Vec::new();
    let mut stale = Vec::new();
    let mut after = Vec::new();
    for span in previous {
        if span.range.end <= dirty_start {
            before.push(span.clone());
        } else if span.range.start >= old_dirty_end {
            after.push(span.shifted(edit.delta()));
        } else {
            stale.push(span.clone());
        }
    }

    let fresh = scan_region(new, dirty_start..new_dirty_end);

    // Spans before the edit keep their coordinates, so a re-matched span equal
    // to a stale one is unchanged and not reported.
    let unchanged = |span: &ReferenceSpan, others: &[ReferenceSpan]| {
        span.range.end <= edit.start && others.contains(span)
    };
    let diff = SpanDiff {
        removed: stale
            .iter()
            .filter(|s| !unchanged(s, &fresh))
            .cloned()
            .collect(),
        added: fresh
            .iter()
            .filter(|s| !unchanged(s, &stale))
            .cloned()
            .collect(),
    };

    let mut spans = before;
    spans.extend(fresh);
    spans.extend(after);
    (spans, diff)
}

/// The live reference spans of one block's content.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    text: String,
    spans: Vec<ReferenceSpan>,
}

impl ReferenceIndex {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            spans: scan(text),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[ReferenceSpan] {
        &self.spans
    }

    /// Moves the index to `new_text`, re-matching only what the edit touched.
    pub fn update(&mut self, new_text: &str) -> SpanDiff {
        let Some(edit) = TextEdit::between(&self.text, new_text) else {
            return SpanDiff::default();
        };
        let (spans, diff) = rescan(&self.spans, &self.text, new_text, edit);
        self.spans = spans;
        self.text = new_text.to_string();
        diff
    }

    /// The reference covering byte `offset`, if any.
    pub fn span_at(&self, offset: usize) -> Option<&ReferenceSpan> {
        self.spans.iter().find(|s| s.range.contains(&offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_single_reference() {
        let spans = scan("see [[Project Plan]]");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].title, "Project Plan");
        assert_eq!(spans[0].range, 4..20);
    }

    #[test]
    fn ignores_unclosed_and_empty_brackets() {
        assert!(scan("[[]] and [[open").is_empty());
        assert!(scan("[[split\nline]]").is_empty());
    }

    #[test]
    fn finds_several_references_per_line() {
        let spans = scan("[[A]] then [[B]]\n[[C]]");
        let titles: Vec<_> = spans.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn text_edit_between_finds_minimal_region() {
        let edit = TextEdit::between("hello world", "hello brave world").unwrap();
        assert_eq!(edit, TextEdit { start: 6, removed: 0, inserted: 6 });
        assert!(TextEdit::between("same", "same").is_none());
    }

    #[test]
    fn text_edit_respects_char_boundaries() {
        let edit = TextEdit::between("café", "cafè").unwrap();
        assert_eq!(edit.start, 3);
        assert_eq!(edit.removed, 2);
        assert_eq!(edit.inserted, 2);
    }

    #[test]
    fn edit_after_span_keeps_range() {
        let mut index = ReferenceIndex::new("see [[Project Plan]]");
        let diff = index.update("see [[Project Plan]] tomorrow");
        assert!(diff.is_empty());
        assert_eq!(index.spans()[0].range, 4..20);
    }

    #[test]
    fn edit_before_span_on_other_line_shifts_it() {
        let mut index = ReferenceIndex::new("intro\nsee [[Plan]]");
        let diff = index.update("intro text\nsee [[Plan]]");
        assert!(diff.is_empty());
        assert_eq!(index.spans()[0].range, 15..23);
        assert_eq!(index.spans(), scan(index.text()).as_slice());
    }

    #[test]
    fn edit_before_span_on_same_line_reports_move() {
        let mut index = ReferenceIndex::new("see [[Plan]]");
        let diff = index.update("please see [[Plan]]");
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(index.spans()[0].range, 11..19);
    }

    #[test]
    fn typing_closing_brackets_adds_span() {
        let mut index = ReferenceIndex::new("link [[Ide");
        assert!(index.spans().is_empty());
        index.update("link [[Idea");
        let diff = index.update("link [[Idea]]");
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].title, "Idea");
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn breaking_a_span_removes_it() {
        let mut index = ReferenceIndex::new("a [[X]] b\n[[Y]]");
        let diff = index.update("a [[X] b\n[[Y]]");
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].title, "X");
        assert_eq!(index.spans().len(), 1);
        assert_eq!(index.spans()[0].title, "Y");
        assert_eq!(index.spans()[0].range, 9..14);
    }

    #[test]
    fn incremental_matches_full_scan_over_edit_sequence() {
        let versions = [
            "",
            "[[A]]",
            "[[A]]\nmiddle",
            "[[A]]\nmiddle [[B]]\nend",
            "x[[A]]\nmiddle [[B]]\nend [[C]]",
            "x[[A]]\nend [[C]]",
            "x[[A]]\nend [[C]] and [[D]]",
            "ünïcode [[É]]\nend [[C]] and [[D]]",
        ];
        let mut index = ReferenceIndex::default();
        for version in versions {
            index.update(version);
            assert_eq!(index.spans(), scan(version).as_slice(), "at {:?}", version);
        }
    }

    #[test]
    fn span_at_hits_inside_brackets() {
        let index = ReferenceIndex::new("go [[Home]] now");
        assert_eq!(index.span_at(5).unwrap().title, "Home");
        assert!(index.span_at(0).is_none());
        assert!(index.span_at(11).is_none());
    }
}
